//! JSON schema documents.
//!
//! A schema document describes structs, functions, enums and overrides in a
//! single JSON file and acts as a [`SchemaOracle`]:
//!
//! ```json
//! {
//!   "namespace": "models",
//!   "structs": {
//!     "NeedsFixup": {
//!       "fields": [
//!         {"id": 1, "name": "name", "type": "string"},
//!         {"id": 2, "name": "time", "type": "i32"}
//!       ]
//!     }
//!   },
//!   "enums": {"TimePeriod": [["day", 1], ["week", 2], ["month", 3]]},
//!   "overrides": {
//!     "fields": [{"struct": "NeedsFixup", "field": "time", "type": {"enum": "TimePeriod"}}]
//!   }
//! }
//! ```
//!
//! Defaults are written as JSON and decoded to wire form when the document is
//! loaded, so a malformed default is reported before any bridge is built. They
//! are read by the field's effective type: an override to an enum lets the
//! default name a symbol (`"default": "week"`). Defaults of struct-typed
//! fields are never synthesized and are skipped at load.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::bridge::BridgeBuilder;
use crate::config::BridgeConfig;
use crate::enums::{EnumDescriptor, EnumRegistry};
use crate::error::{BuildError, ConversionError};
use crate::json::wire_from_json;
use crate::overrides::OverrideSpec;
use crate::schema::{RawField, RawFunction, SchemaOracle, StaticOracle};
use crate::types::{normalize, qualify, RawType, TypeSpec};

/// Errors raised while loading a schema document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content is not a valid document.
    #[error("Invalid schema document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field default does not match its declared type.
    #[error("Invalid default for '{target}': {source}")]
    InvalidDefault {
        target: String,
        #[source]
        source: ConversionError,
    },
}

impl From<DocumentError> for BuildError {
    fn from(err: DocumentError) -> Self {
        BuildError::Document(err.to_string())
    }
}

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DocumentFile {
    namespace: Option<String>,
    structs: IndexMap<String, StructDef>,
    functions: IndexMap<String, FunctionDef>,
    enums: IndexMap<String, Vec<(String, i64)>>,
    overrides: OverridesDef,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StructDef {
    #[serde(default)]
    fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldDef {
    id: i16,
    name: String,
    #[serde(rename = "type")]
    ty: RawType,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct FunctionDef {
    #[serde(default)]
    params: Vec<FieldDef>,
    #[serde(default = "void_type")]
    reply: RawType,
    #[serde(default)]
    exceptions: Vec<FieldDef>,
}

fn void_type() -> RawType {
    RawType::name("void")
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct OverridesDef {
    fields: Vec<FieldOverrideDef>,
    functions: Vec<FunctionOverrideDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldOverrideDef {
    #[serde(rename = "struct")]
    struct_name: String,
    field: String,
    #[serde(rename = "type")]
    ty: RawType,
}

#[derive(Debug, Clone, Deserialize)]
struct FunctionOverrideDef {
    function: String,
    #[serde(default)]
    args: BTreeMap<usize, RawType>,
    #[serde(default)]
    returns: Option<RawType>,
}

// =============================================================================
// Loaded document
// =============================================================================

/// A loaded schema document.
///
/// All names are qualified with the document namespace.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    namespace: Option<String>,
    oracle: StaticOracle,
    struct_names: Vec<String>,
    function_names: Vec<String>,
    enums: Vec<EnumDescriptor>,
    field_overrides: Vec<(String, String, TypeSpec)>,
    function_overrides: Vec<(String, OverrideSpec)>,
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, DocumentError> {
        let file: DocumentFile = serde_json::from_str(content)?;
        Self::compile(file)
    }

    /// Read and parse a document file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = content.len(), "Loaded schema document");
        Self::from_json_str(&content)
    }

    fn compile(file: DocumentFile) -> Result<Self, DocumentError> {
        let ns = file.namespace.as_deref();
        let mut doc = Self {
            namespace: file.namespace.clone(),
            ..Self::default()
        };

        doc.enums = file
            .enums
            .into_iter()
            .map(|(name, pairs)| EnumDescriptor { name, pairs })
            .collect();
        doc.field_overrides = file
            .overrides
            .fields
            .into_iter()
            .map(|o| (qualify(&o.struct_name, ns), o.field, normalize(&o.ty, ns)))
            .collect();
        doc.function_overrides = file
            .overrides
            .functions
            .into_iter()
            .map(|o| {
                let spec = OverrideSpec {
                    args: o.args.iter().map(|(pos, ty)| (*pos, normalize(ty, ns))).collect(),
                    returns: o.returns.as_ref().map(|ty| normalize(ty, ns)),
                };
                (qualify(&o.function, ns), spec)
            })
            .collect();

        let defaults = DefaultReader::new(&doc.enums, ns);
        for (name, def) in file.structs {
            let name = qualify(&name, ns);
            let fields = defaults.compile_fields(&name, def.fields, |field, _| doc.field_override(&name, field))?;
            doc.oracle = doc.oracle.with_struct(name.clone(), fields);
            doc.struct_names.push(name);
        }
        for (name, def) in file.functions {
            let name = qualify(&name, ns);
            let params = defaults.compile_fields(&name, def.params, |_, position| doc.arg_override(&name, position))?;
            let exceptions = defaults.compile_fields(&name, def.exceptions, |_, _| None)?;
            let function = RawFunction::new(params, def.reply).with_exceptions(exceptions);
            doc.oracle = doc.oracle.with_function(name.clone(), function);
            doc.function_names.push(name);
        }

        debug!(
            structs = doc.struct_names.len(),
            functions = doc.function_names.len(),
            enums = doc.enums.len(),
            "Compiled schema document"
        );
        Ok(doc)
    }

    fn field_override(&self, struct_name: &str, field: &str) -> Option<TypeSpec> {
        self.field_overrides
            .iter()
            .find(|(s, f, _)| s == struct_name && f == field)
            .map(|(_, _, spec)| spec.clone())
    }

    fn arg_override(&self, function: &str, position: usize) -> Option<TypeSpec> {
        self.function_overrides
            .iter()
            .filter(|(name, _)| name == function)
            .find_map(|(_, spec)| spec.args.get(&position).cloned())
    }

    /// Document namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Qualified struct names, in document order.
    pub fn struct_names(&self) -> &[String] {
        &self.struct_names
    }

    /// Qualified function names, in document order.
    pub fn function_names(&self) -> &[String] {
        &self.function_names
    }

    /// Enum tables declared by the document.
    pub fn enums(&self) -> &[EnumDescriptor] {
        &self.enums
    }

    /// A builder rooted at every struct and function of the document, with
    /// its enums and overrides registered and its namespace configured.
    pub fn builder(&self) -> BridgeBuilder<'_> {
        let config = BridgeConfig {
            schema_namespace: self.namespace.clone(),
            ..BridgeConfig::default()
        };
        self.builder_with_config(config)
    }

    /// Like [`builder`](Self::builder) with an explicit configuration. The
    /// document namespace wins when the configuration does not set one.
    pub fn builder_with_config(&self, mut config: BridgeConfig) -> BridgeBuilder<'_> {
        if config.schema_namespace.is_none() {
            config.schema_namespace = self.namespace.clone();
        }
        let mut builder = BridgeBuilder::new(self).config(config);
        for name in &self.struct_names {
            builder = builder.root_struct(name.clone());
        }
        for name in &self.function_names {
            builder = builder.root_function(name.clone());
        }
        for descriptor in &self.enums {
            builder = builder.enumeration(descriptor.clone());
        }
        for (struct_name, field, spec) in &self.field_overrides {
            builder = builder.struct_override(struct_name.clone(), field.clone(), spec.clone());
        }
        for (function, spec) in &self.function_overrides {
            builder = builder.function_override(function.clone(), spec.clone());
        }
        builder
    }
}

impl SchemaOracle for SchemaDocument {
    fn struct_fields(&self, name: &str) -> Option<Vec<RawField>> {
        self.oracle.struct_fields(name)
    }

    fn function(&self, name: &str) -> Option<RawFunction> {
        self.oracle.function(name)
    }
}

// =============================================================================
// Defaults
// =============================================================================

/// Decodes field defaults by effective type, resolving enum symbols through
/// the document's own enum tables.
struct DefaultReader<'a> {
    enums: EnumRegistry,
    ns: Option<&'a str>,
}

impl<'a> DefaultReader<'a> {
    fn new(descriptors: &[EnumDescriptor], ns: Option<&'a str>) -> Self {
        let mut enums = EnumRegistry::with_namespace(ns.map(str::to_string));
        for descriptor in descriptors {
            let mut descriptor = descriptor.clone();
            descriptor.name = qualify(&descriptor.name, ns);
            // A malformed table fails the build later; symbols of it stay unknown here.
            if let Err(err) = enums.register(descriptor) {
                debug!(error = %err, "Enum table skipped for default decoding");
            }
        }
        Self { enums, ns }
    }

    /// Compile field definitions. `effective` yields the override type of a
    /// field, given the field name and its position in id order.
    fn compile_fields<F>(&self, owner: &str, defs: Vec<FieldDef>, effective: F) -> Result<Vec<RawField>, DocumentError>
    where
        F: Fn(&str, usize) -> Option<TypeSpec>,
    {
        let mut ids: Vec<i16> = defs.iter().map(|def| def.id).collect();
        ids.sort_unstable();

        let mut fields = Vec::with_capacity(defs.len());
        for def in defs {
            let mut field = RawField::new(def.id, def.name, def.ty);
            field.required = def.required;
            if let Some(json) = def.default {
                let position = ids.iter().position(|id| *id == field.id).unwrap_or_default();
                let spec = effective(&field.name, position).unwrap_or_else(|| normalize(&field.ty, self.ns));
                if spec.contains_struct() {
                    debug!(
                        target_field = %format!("{owner}.{}", field.name),
                        spec = %spec,
                        "Skipping default of struct-typed field"
                    );
                } else {
                    let wire = wire_from_json(&json, &spec, &self.enums).map_err(|source| {
                        DocumentError::InvalidDefault {
                            target: format!("{owner}.{}", field.name),
                            source,
                        }
                    })?;
                    field.default = Some(wire);
                }
            }
            fields.push(field);
        }
        Ok(fields)
    }
}
