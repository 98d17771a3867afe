//! Error types for schema-bridge
//!
//! Errors fall into two families:
//!
//! - [`BuildError`] is raised while the [`Bridge`](crate::Bridge) is being
//!   built. These are configuration problems (a referenced struct that the
//!   schema does not know, an override pointing at a field that does not
//!   exist, ...). A build error means no bridge exists at all.
//! - [`ConversionError`] is raised by an individual conversion call. These
//!   describe a mismatch between the value and the type it was converted as,
//!   and are handed back to whoever invoked the conversion. They are never
//!   retried.
//!
//! Both expose a stable [`ErrorCode`] for callers that need to branch on the
//! kind of failure without matching on variants.
//!
//! An enum integer with no declared symbol is *not* an error: it converts to
//! an unresolved [`EnumValue`](crate::EnumValue).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable error codes for build and conversion failures.
///
/// When serialized, codes are converted to SCREAMING_SNAKE_CASE strings
/// (e.g., `TagMismatch` becomes `"TAG_MISMATCH"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Build-time errors
    /// A referenced struct, function or enum is unknown to the schema
    SchemaLookup,
    /// An override or callback targets a position that does not exist
    OverrideConflict,
    /// A struct declares the same field id twice
    DuplicateFieldId,
    /// An enum declares the same symbol twice
    DuplicateEnumSymbol,
    /// A callback guard pattern failed to compile
    InvalidGuard,
    /// A schema-declared default does not fit the field type
    InvalidDefault,
    /// A schema document could not be read or parsed
    InvalidDocument,
    /// The bridge configuration is invalid
    InvalidConfig,

    // Call-time errors
    /// A wire struct carries a different tag than expected
    TagMismatch,
    /// A tuple or argument list has the wrong number of elements
    ArityMismatch,
    /// A value does not have the shape its type requires
    ValueMismatch,
    /// Wire bytes declared as text are not valid UTF-8
    InvalidUtf8,
    /// A record field is not declared by its struct
    UnknownField,
    /// A struct name is not part of the compiled schema
    UnknownStruct,
    /// A function name is not part of the compiled schema
    UnknownFunction,
    /// An enum name is not registered
    UnknownEnum,
    /// An enum symbol is not declared by its enum
    UnknownEnumSymbol,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaLookup => "SCHEMA_LOOKUP",
            Self::OverrideConflict => "OVERRIDE_CONFLICT",
            Self::DuplicateFieldId => "DUPLICATE_FIELD_ID",
            Self::DuplicateEnumSymbol => "DUPLICATE_ENUM_SYMBOL",
            Self::InvalidGuard => "INVALID_GUARD",
            Self::InvalidDefault => "INVALID_DEFAULT",
            Self::InvalidDocument => "INVALID_DOCUMENT",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::TagMismatch => "TAG_MISMATCH",
            Self::ArityMismatch => "ARITY_MISMATCH",
            Self::ValueMismatch => "VALUE_MISMATCH",
            Self::InvalidUtf8 => "INVALID_UTF8",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::UnknownStruct => "UNKNOWN_STRUCT",
            Self::UnknownFunction => "UNKNOWN_FUNCTION",
            Self::UnknownEnum => "UNKNOWN_ENUM",
            Self::UnknownEnumSymbol => "UNKNOWN_ENUM_SYMBOL",
        }
    }

    /// Returns true if this code is only produced while building a bridge.
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            Self::SchemaLookup
                | Self::OverrideConflict
                | Self::DuplicateFieldId
                | Self::DuplicateEnumSymbol
                | Self::InvalidGuard
                | Self::InvalidDefault
                | Self::InvalidDocument
                | Self::InvalidConfig
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location of a failure inside a converted value.
///
/// Segments are pushed from the innermost failure outwards, so the path reads
/// root first: `NeedsFixup.time`, `items[3]`, `mappings<key>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuePath(Vec<String>);

impl ValuePath {
    /// An empty path (the root value).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Prepend a segment.
    pub fn push_front(&mut self, segment: impl Into<String>) {
        self.0.insert(0, segment.into());
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        let joined: String = self.0.concat();
        write!(f, "{}", joined.trim_start_matches('.'))
    }
}

/// Errors raised while building a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A struct, function or enum referenced by the schema is unknown.
    #[error("unknown {kind} '{name}' (referenced from {referrer})")]
    SchemaLookup {
        kind: &'static str,
        name: String,
        referrer: String,
    },

    /// An override or callback does not fit the extracted schema.
    #[error("override conflict on '{target}': {message}")]
    OverrideConflict { target: String, message: String },

    /// A struct declares the same field id more than once.
    #[error("struct '{struct_name}' declares field id {id} more than once")]
    DuplicateFieldId { struct_name: String, id: i16 },

    /// An enum declares the same symbol more than once.
    #[error("enum '{enum_name}' declares symbol '{symbol}' more than once")]
    DuplicateEnumSymbol { enum_name: String, symbol: String },

    /// A symbol lookup named a symbol the enum does not declare.
    #[error("enum '{enum_name}' has no symbol '{symbol}'")]
    UnknownEnumSymbol { enum_name: String, symbol: String },

    /// A callback guard could not be compiled.
    #[error("invalid guard pattern '{pattern}': {message}")]
    InvalidGuard { pattern: String, message: String },

    /// A schema default could not be converted to its native form.
    #[error("default for '{struct_name}.{field}' is invalid: {source}")]
    Default {
        struct_name: String,
        field: String,
        #[source]
        source: ConversionError,
    },

    /// A schema document could not be loaded.
    #[error("schema document error: {0}")]
    Document(String),

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BuildError {
    /// Create a schema lookup error.
    pub fn lookup(kind: &'static str, name: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::SchemaLookup {
            kind,
            name: name.into(),
            referrer: referrer.into(),
        }
    }

    /// Create an override conflict error.
    pub fn conflict(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OverrideConflict {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SchemaLookup { .. } => ErrorCode::SchemaLookup,
            Self::OverrideConflict { .. } => ErrorCode::OverrideConflict,
            Self::DuplicateFieldId { .. } => ErrorCode::DuplicateFieldId,
            Self::DuplicateEnumSymbol { .. } => ErrorCode::DuplicateEnumSymbol,
            Self::UnknownEnumSymbol { .. } => ErrorCode::UnknownEnumSymbol,
            Self::InvalidGuard { .. } => ErrorCode::InvalidGuard,
            Self::Default { .. } => ErrorCode::InvalidDefault,
            Self::Document(_) => ErrorCode::InvalidDocument,
            Self::Config(_) => ErrorCode::InvalidConfig,
        }
    }
}

/// Errors raised by a single conversion call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The wire tuple's tag is not the struct the caller expected.
    #[error("{path}: expected struct '{expected}', found '{found}'")]
    TagMismatch {
        expected: String,
        found: String,
        path: ValuePath,
    },

    /// A tuple or argument list has the wrong number of elements.
    #[error("{path}: '{target}' expects {expected} value(s), found {found}")]
    ArityMismatch {
        target: String,
        expected: usize,
        found: usize,
        path: ValuePath,
    },

    /// The value does not have the shape the type requires.
    #[error("{path}: expected {expected}, found {found}")]
    ValueMismatch {
        expected: String,
        found: String,
        path: ValuePath,
    },

    /// Bytes declared as text are not valid UTF-8.
    #[error("{path}: string is not valid UTF-8: {message}")]
    InvalidUtf8 { message: String, path: ValuePath },

    /// A record carries a field its struct does not declare.
    #[error("{path}: struct '{struct_name}' has no field '{field}'")]
    UnknownField {
        struct_name: String,
        field: String,
        path: ValuePath,
    },

    /// The struct is not part of the compiled schema.
    #[error("{path}: unknown struct '{name}'")]
    UnknownStruct { name: String, path: ValuePath },

    /// The function is not part of the compiled schema.
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    /// The enum is not registered.
    #[error("{path}: unknown enum '{name}'")]
    UnknownEnum { name: String, path: ValuePath },

    /// A native symbol is not declared by its enum.
    #[error("{path}: enum '{enum_name}' has no symbol '{symbol}'")]
    UnknownEnumSymbol {
        enum_name: String,
        symbol: String,
        path: ValuePath,
    },
}

impl ConversionError {
    /// Create a value mismatch error at the root path.
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ValueMismatch {
            expected: expected.into(),
            found: found.into(),
            path: ValuePath::root(),
        }
    }

    /// Create a tag mismatch error at the root path.
    pub fn tag_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TagMismatch {
            expected: expected.into(),
            found: found.into(),
            path: ValuePath::root(),
        }
    }

    /// Create an unknown struct error at the root path.
    pub fn unknown_struct(name: impl Into<String>) -> Self {
        Self::UnknownStruct {
            name: name.into(),
            path: ValuePath::root(),
        }
    }

    /// Create an unknown field error at the root path.
    pub fn unknown_field(struct_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            struct_name: struct_name.into(),
            field: field.into(),
            path: ValuePath::root(),
        }
    }

    /// Prepend a path segment, returning the error.
    ///
    /// Used while unwinding out of nested conversions so the final error
    /// points at the offending element.
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        if let Some(path) = self.path_mut() {
            path.push_front(segment);
        }
        self
    }

    /// The location of the failure, if the variant tracks one.
    pub fn path(&self) -> Option<&ValuePath> {
        match self {
            Self::TagMismatch { path, .. }
            | Self::ArityMismatch { path, .. }
            | Self::ValueMismatch { path, .. }
            | Self::InvalidUtf8 { path, .. }
            | Self::UnknownField { path, .. }
            | Self::UnknownStruct { path, .. }
            | Self::UnknownEnum { path, .. }
            | Self::UnknownEnumSymbol { path, .. } => Some(path),
            Self::UnknownFunction { .. } => None,
        }
    }

    fn path_mut(&mut self) -> Option<&mut ValuePath> {
        match self {
            Self::TagMismatch { path, .. }
            | Self::ArityMismatch { path, .. }
            | Self::ValueMismatch { path, .. }
            | Self::InvalidUtf8 { path, .. }
            | Self::UnknownField { path, .. }
            | Self::UnknownStruct { path, .. }
            | Self::UnknownEnum { path, .. }
            | Self::UnknownEnumSymbol { path, .. } => Some(path),
            Self::UnknownFunction { .. } => None,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TagMismatch { .. } => ErrorCode::TagMismatch,
            Self::ArityMismatch { .. } => ErrorCode::ArityMismatch,
            Self::ValueMismatch { .. } => ErrorCode::ValueMismatch,
            Self::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::UnknownStruct { .. } => ErrorCode::UnknownStruct,
            Self::UnknownFunction { .. } => ErrorCode::UnknownFunction,
            Self::UnknownEnum { .. } => ErrorCode::UnknownEnum,
            Self::UnknownEnumSymbol { .. } => ErrorCode::UnknownEnumSymbol,
        }
    }
}

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;
