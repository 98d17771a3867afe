//! Schema extraction.
//!
//! Starting from root struct and function names, the extractor asks the
//! oracle for each definition, normalizes the field types and follows every
//! struct reference it finds (through any depth of list/set/map wrappers)
//! until the closure is complete.
//!
//! Structs are deduplicated by qualified name. Revisiting a name is a no-op,
//! which is what terminates mutually recursive schemas. Traversal uses an
//! explicit queue, so deep schemas do not grow the call stack.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, trace, warn};

use crate::error::{BuildError, BuildResult};
use crate::schema::{FieldDescriptor, FunctionDescriptor, RawField, SchemaOracle, StructDescriptor};
use crate::types::{normalize, qualify, TypeSpec};

/// An extraction entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Root {
    /// A struct by name
    Struct(String),
    /// An RPC function by name
    Function(String),
}

impl Root {
    pub fn struct_name(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }
}

/// Result of extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractedSchema {
    /// Structs in discovery order
    pub structs: IndexMap<String, StructDescriptor>,
    /// Functions in root order
    pub functions: IndexMap<String, FunctionDescriptor>,
    /// Enum names referenced by field types
    pub enum_refs: BTreeSet<String>,
}

/// Walks an oracle from a set of roots.
pub struct Extractor<'a> {
    oracle: &'a dyn SchemaOracle,
    namespace: Option<&'a str>,
}

impl<'a> Extractor<'a> {
    pub fn new(oracle: &'a dyn SchemaOracle) -> Self {
        Self {
            oracle,
            namespace: None,
        }
    }

    /// Qualify bare names in `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<&'a str>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Compute the transitive closure of the given roots.
    ///
    /// Any name the oracle cannot resolve aborts the extraction with
    /// [`BuildError::SchemaLookup`].
    pub fn extract(&self, roots: &[Root]) -> BuildResult<ExtractedSchema> {
        let mut out = ExtractedSchema::default();
        let mut queued: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, String)> = VecDeque::new();

        for root in roots {
            match root {
                Root::Struct(name) => {
                    let name = qualify(name, self.namespace);
                    if queued.insert(name.clone()) {
                        queue.push_back((name, "root".to_string()));
                    }
                }
                Root::Function(name) => {
                    let name = qualify(name, self.namespace);
                    if out.functions.contains_key(&name) {
                        continue;
                    }
                    let function = self.extract_function(&name)?;
                    self.enqueue_refs(
                        function
                            .params
                            .iter()
                            .chain(function.exceptions.iter())
                            .map(|f| &f.spec)
                            .chain(std::iter::once(&function.reply)),
                        &name,
                        &mut queued,
                        &mut queue,
                        &mut out.enum_refs,
                    );
                    out.functions.insert(name, function);
                }
            }
        }

        while let Some((name, referrer)) = queue.pop_front() {
            let raw = self.oracle.struct_fields(&name).ok_or_else(|| {
                warn!(struct_name = %name, referrer = %referrer, "Struct missing from schema");
                BuildError::lookup("struct", &name, &referrer)
            })?;
            let descriptor = StructDescriptor {
                fields: self.normalize_fields(&name, raw)?,
                name: name.clone(),
            };
            debug!(
                struct_name = %name,
                fields = descriptor.fields.len(),
                referrer = %referrer,
                "Extracted struct"
            );
            self.enqueue_refs(
                descriptor.fields.iter().map(|f| &f.spec),
                &name,
                &mut queued,
                &mut queue,
                &mut out.enum_refs,
            );
            out.structs.insert(name, descriptor);
        }

        Ok(out)
    }

    fn extract_function(&self, name: &str) -> BuildResult<FunctionDescriptor> {
        let raw = self.oracle.function(name).ok_or_else(|| {
            warn!(function = %name, "Function missing from schema");
            BuildError::lookup("function", name, "root")
        })?;
        let descriptor = FunctionDescriptor {
            name: name.to_string(),
            params: self.normalize_fields(name, raw.params)?,
            reply: normalize(&raw.reply, self.namespace),
            exceptions: self.normalize_fields(name, raw.exceptions)?,
        };
        debug!(
            function = %name,
            params = descriptor.params.len(),
            reply = %descriptor.reply,
            "Extracted function"
        );
        Ok(descriptor)
    }

    fn normalize_fields(&self, owner: &str, raw: Vec<RawField>) -> BuildResult<Vec<FieldDescriptor>> {
        let mut fields: Vec<FieldDescriptor> = raw
            .into_iter()
            .map(|f| FieldDescriptor {
                spec: normalize(&f.ty, self.namespace),
                id: f.id,
                name: f.name,
                default: f.default,
                required: f.required,
            })
            .collect();
        fields.sort_by_key(|f| f.id);
        if let Some(pair) = fields.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(BuildError::DuplicateFieldId {
                struct_name: owner.to_string(),
                id: pair[0].id,
            });
        }
        Ok(fields)
    }

    fn enqueue_refs<'s>(
        &self,
        specs: impl Iterator<Item = &'s TypeSpec>,
        referrer: &str,
        queued: &mut HashSet<String>,
        queue: &mut VecDeque<(String, String)>,
        enum_refs: &mut BTreeSet<String>,
    ) {
        for spec in specs {
            for leaf in spec.leaves() {
                match leaf {
                    TypeSpec::Struct(name) => {
                        if queued.insert(name.clone()) {
                            trace!(struct_name = %name, referrer = %referrer, "Queued struct");
                            queue.push_back((name.clone(), referrer.to_string()));
                        }
                    }
                    TypeSpec::Enum(name) => {
                        enum_refs.insert(name.clone());
                    }
                    _ => {}
                }
            }
        }
    }
}
