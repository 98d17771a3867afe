//! Type overrides.
//!
//! A wire schema cannot say "this i32 is an enum". Overrides fill that gap:
//! an explicit [`TypeSpec`] for a struct field, a function argument position
//! or a function's return value. Resolution order for any position is
//! override, then the schema's own type, then [`TypeSpec::Any`].
//!
//! Overrides are validated against the extracted schema when the bridge is
//! built; one that points at nothing is an [`OverrideConflict`](BuildError::OverrideConflict).

use std::collections::{BTreeMap, HashMap};
use tracing::{trace, warn};

use crate::error::{BuildError, BuildResult};
use crate::extract::ExtractedSchema;
use crate::schema::FieldDescriptor;
use crate::types::{qualify_spec, TypeSpec};

/// Overrides for one function.
///
/// Argument positions are 0-based indexes into the function's parameter
/// list (parameters sorted by field id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSpec {
    pub args: BTreeMap<usize, TypeSpec>,
    pub returns: Option<TypeSpec>,
}

impl OverrideSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a positional list where `None` means "no override".
    pub fn from_positions(positions: impl IntoIterator<Item = Option<TypeSpec>>) -> Self {
        Self {
            args: positions
                .into_iter()
                .enumerate()
                .filter_map(|(pos, spec)| spec.map(|spec| (pos, spec)))
                .collect(),
            returns: None,
        }
    }

    /// Override one argument position.
    #[must_use]
    pub fn arg(mut self, position: usize, spec: TypeSpec) -> Self {
        self.args.insert(position, spec);
        self
    }

    /// Override the return type.
    #[must_use]
    pub fn returns(mut self, spec: TypeSpec) -> Self {
        self.returns = Some(spec);
        self
    }
}

/// Holds every declared override.
#[derive(Debug, Clone, Default)]
pub struct OverrideResolver {
    fields: HashMap<(String, String), TypeSpec>,
    functions: HashMap<String, OverrideSpec>,
}

impl OverrideResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a struct field override.
    pub fn add_field(
        &mut self,
        struct_name: impl Into<String>,
        field: impl Into<String>,
        spec: TypeSpec,
    ) -> BuildResult<()> {
        let key = (struct_name.into(), field.into());
        if self.fields.contains_key(&key) {
            return Err(BuildError::conflict(
                format!("{}.{}", key.0, key.1),
                "field override declared twice",
            ));
        }
        trace!(struct_name = %key.0, field = %key.1, spec = %spec, "Adding field override");
        self.fields.insert(key, spec);
        Ok(())
    }

    /// Declare overrides for a function.
    ///
    /// Declaring a second spec for the same function merges it, but the same
    /// position may only be overridden once.
    pub fn add_function(&mut self, function: impl Into<String>, spec: OverrideSpec) -> BuildResult<()> {
        let function = function.into();
        let entry = self.functions.entry(function.clone()).or_default();
        for (pos, arg) in spec.args {
            if entry.args.insert(pos, arg).is_some() {
                return Err(BuildError::conflict(
                    format!("{function}[{pos}]"),
                    "argument override declared twice",
                ));
            }
        }
        if let Some(returns) = spec.returns {
            if entry.returns.replace(returns).is_some() {
                return Err(BuildError::conflict(function, "return override declared twice"));
            }
        }
        trace!(function = %function, "Adding function override");
        Ok(())
    }

    /// Qualify every name in the resolver with `namespace`.
    pub(crate) fn qualified(self, namespace: Option<&str>) -> Self {
        let fields = self
            .fields
            .into_iter()
            .map(|((st, field), spec)| {
                (
                    (crate::types::qualify(&st, namespace), field),
                    qualify_spec(&spec, namespace),
                )
            })
            .collect();
        let functions = self
            .functions
            .into_iter()
            .map(|(name, spec)| {
                let spec = OverrideSpec {
                    args: spec
                        .args
                        .into_iter()
                        .map(|(pos, s)| (pos, qualify_spec(&s, namespace)))
                        .collect(),
                    returns: spec.returns.map(|s| qualify_spec(&s, namespace)),
                };
                (crate::types::qualify(&name, namespace), spec)
            })
            .collect();
        Self { fields, functions }
    }

    /// Check every override against the extracted schema.
    pub fn validate(&self, schema: &ExtractedSchema) -> BuildResult<()> {
        for (struct_name, field) in self.fields.keys() {
            let target = format!("{struct_name}.{field}");
            let descriptor = schema.structs.get(struct_name).ok_or_else(|| {
                warn!(target = %target, "Override targets unknown struct");
                BuildError::conflict(&target, "struct is not part of the extracted schema")
            })?;
            if descriptor.field(field).is_none() {
                warn!(target = %target, "Override targets unknown field");
                return Err(BuildError::conflict(&target, "struct has no such field"));
            }
        }
        for (name, spec) in &self.functions {
            let function = schema.functions.get(name).ok_or_else(|| {
                warn!(function = %name, "Override targets unknown function");
                BuildError::conflict(name, "function is not part of the extracted schema")
            })?;
            if let Some((&pos, _)) = spec.args.iter().find(|(pos, _)| **pos >= function.params.len()) {
                warn!(function = %name, position = pos, "Override targets missing argument");
                return Err(BuildError::conflict(
                    format!("{name}[{pos}]"),
                    format!("function has {} parameter(s)", function.params.len()),
                ));
            }
        }
        Ok(())
    }

    /// Effective type of a struct field.
    pub fn resolve_field(&self, struct_name: &str, field: &FieldDescriptor) -> TypeSpec {
        self.fields
            .get(&(struct_name.to_string(), field.name.clone()))
            .cloned()
            .unwrap_or_else(|| field.spec.clone())
    }

    /// Effective type of a function argument.
    pub fn resolve_arg(&self, function: &str, position: usize, param: Option<&FieldDescriptor>) -> TypeSpec {
        self.functions
            .get(function)
            .and_then(|spec| spec.args.get(&position))
            .cloned()
            .or_else(|| param.map(|p| p.spec.clone()))
            .unwrap_or(TypeSpec::Any)
    }

    /// Effective return type of a function.
    pub fn resolve_return(&self, function: &str, reply: Option<&TypeSpec>) -> TypeSpec {
        self.functions
            .get(function)
            .and_then(|spec| spec.returns.clone())
            .or_else(|| reply.cloned())
            .unwrap_or(TypeSpec::Any)
    }

    /// Every overriding type, for reference checks.
    pub(crate) fn specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.fields.values().chain(
            self.functions
                .values()
                .flat_map(|spec| spec.args.values().chain(spec.returns.iter())),
        )
    }
}
