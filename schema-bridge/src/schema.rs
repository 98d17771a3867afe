//! Schema model and the schema oracle seam.
//!
//! A [`SchemaOracle`] answers "what are the fields of struct X" and "what is
//! the signature of function Y" by qualified name. It is read-only and
//! external: generated code, a parsed IDL, or a [`SchemaDocument`](crate::SchemaDocument).
//!
//! The extractor turns oracle answers into [`StructDescriptor`]s and
//! [`FunctionDescriptor`]s, which are immutable afterwards.

use std::collections::HashMap;

use crate::types::{RawType, TypeSpec};
use crate::value::WireValue;

// =============================================================================
// Oracle input
// =============================================================================

/// A field as the oracle reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Declared field id; defines wire position
    pub id: i16,
    pub name: String,
    pub ty: RawType,
    /// Schema-declared default, in wire form
    pub default: Option<WireValue>,
    pub required: bool,
}

impl RawField {
    pub fn new(id: i16, name: impl Into<String>, ty: RawType) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
            default: None,
            required: false,
        }
    }

    /// Attach a wire-form default.
    #[must_use]
    pub fn with_default(mut self, default: WireValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Mark the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A function signature as the oracle reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFunction {
    pub params: Vec<RawField>,
    pub reply: RawType,
    pub exceptions: Vec<RawField>,
}

impl RawFunction {
    pub fn new(params: Vec<RawField>, reply: RawType) -> Self {
        Self {
            params,
            reply,
            exceptions: Vec::new(),
        }
    }

    /// Declare the exceptions the function may raise.
    #[must_use]
    pub fn with_exceptions(mut self, exceptions: Vec<RawField>) -> Self {
        self.exceptions = exceptions;
        self
    }
}

/// Read-only source of struct and function definitions.
///
/// Names are fully qualified. `None` means the oracle does not know the name;
/// the extractor turns that into a build error.
pub trait SchemaOracle {
    /// Field list of a struct.
    fn struct_fields(&self, name: &str) -> Option<Vec<RawField>>;

    /// Signature of a function.
    fn function(&self, name: &str) -> Option<RawFunction>;
}

/// In-memory oracle, mostly useful for tests and hand-wired schemas.
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    structs: HashMap<String, Vec<RawField>>,
    functions: HashMap<String, RawFunction>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a struct.
    #[must_use]
    pub fn with_struct(mut self, name: impl Into<String>, fields: Vec<RawField>) -> Self {
        self.structs.insert(name.into(), fields);
        self
    }

    /// Define a function.
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, function: RawFunction) -> Self {
        self.functions.insert(name.into(), function);
        self
    }
}

impl SchemaOracle for StaticOracle {
    fn struct_fields(&self, name: &str) -> Option<Vec<RawField>> {
        self.structs.get(name).cloned()
    }

    fn function(&self, name: &str) -> Option<RawFunction> {
        self.functions.get(name).cloned()
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// A normalized struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub id: i16,
    pub name: String,
    /// Type inferred from the schema alone (overrides are applied later)
    pub spec: TypeSpec,
    pub default: Option<WireValue>,
    pub required: bool,
}

/// A normalized struct: its qualified name is the wire tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub name: String,
    /// Fields sorted by id
    pub fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wire position of a field (0-based, tag excluded).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A normalized function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Parameters sorted by id; argument position is the index in this list
    pub params: Vec<FieldDescriptor>,
    pub reply: TypeSpec,
    pub exceptions: Vec<FieldDescriptor>,
}
