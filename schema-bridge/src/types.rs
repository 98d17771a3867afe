//! Type descriptors.
//!
//! [`RawType`] is the loose syntax a schema oracle speaks: primitive names
//! with aliases, wrapper objects, possibly unqualified struct names.
//! [`TypeSpec`] is the closed, normalized form every other component works
//! with. [`normalize`] turns one into the other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// 64-bit float
    Double,
    /// Text; bytes on the wire, a native string
    String,
    /// Opaque bytes in both representations
    Binary,
}

impl PrimitiveKind {
    /// Canonical name of the primitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
        }
    }

    /// Parse a primitive name, accepting the common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "boolean" => Self::Bool,
            "byte" | "i8" => Self::Byte,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "double" | "float" | "f64" => Self::Double,
            "string" | "text" => Self::String,
            "binary" | "bytes" => Self::Binary,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the primitive is an integer kind.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Byte | Self::I16 | Self::I32 | Self::I64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized type of a value.
///
/// Structs and enums are referenced by qualified name, never embedded, so
/// mutually recursive structs are representable without cycles in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// A primitive leaf
    Primitive(PrimitiveKind),
    /// Ordered sequence
    List(Box<TypeSpec>),
    /// Unordered, duplicate-free collection
    Set(Box<TypeSpec>),
    /// Key/value association
    Map(Box<TypeSpec>, Box<TypeSpec>),
    /// Reference to a struct by qualified name
    Struct(String),
    /// Reference to an enum by qualified name
    Enum(String),
    /// No type information; values pass through
    Any,
}

impl TypeSpec {
    /// `list<inner>`
    pub fn list(inner: TypeSpec) -> Self {
        Self::List(Box::new(inner))
    }

    /// `set<inner>`
    pub fn set(inner: TypeSpec) -> Self {
        Self::Set(Box::new(inner))
    }

    /// `map<key, value>`
    pub fn map(key: TypeSpec, value: TypeSpec) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Reference to a struct.
    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    /// Reference to an enum.
    pub fn enum_ref(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// The `string` primitive.
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    /// The `i32` primitive.
    pub fn i32() -> Self {
        Self::Primitive(PrimitiveKind::I32)
    }

    /// The `i64` primitive.
    pub fn i64() -> Self {
        Self::Primitive(PrimitiveKind::I64)
    }

    /// The `bool` primitive.
    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    /// The `double` primitive.
    pub fn double() -> Self {
        Self::Primitive(PrimitiveKind::Double)
    }

    /// Innermost leaves, found by unwrapping every list/set/map layer.
    ///
    /// A map contributes the leaves of both its key and value types.
    pub fn leaves(&self) -> Vec<&TypeSpec> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(spec) = stack.pop() {
            match spec {
                Self::List(inner) | Self::Set(inner) => stack.push(inner),
                Self::Map(key, value) => {
                    stack.push(value);
                    stack.push(key);
                }
                leaf => out.push(leaf),
            }
        }
        out
    }

    /// Names of structs referenced anywhere in this type.
    pub fn struct_refs(&self) -> impl Iterator<Item = &str> {
        self.leaves().into_iter().filter_map(|leaf| match leaf {
            Self::Struct(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Names of enums referenced anywhere in this type.
    pub fn enum_refs(&self) -> impl Iterator<Item = &str> {
        self.leaves().into_iter().filter_map(|leaf| match leaf {
            Self::Enum(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether any leaf of this type is a struct reference.
    pub fn contains_struct(&self) -> bool {
        self.struct_refs().next().is_some()
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Set(inner) => write!(f, "set<{inner}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::Struct(name) => write!(f, "struct {name}"),
            Self::Enum(name) => write!(f, "enum {name}"),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Type syntax as supplied by a schema oracle.
///
/// In JSON a raw type is either a name (`"i32"`, `"string"`) or a single-key
/// wrapper object:
///
/// ```json
/// {"list": "i32"}
/// {"map": ["string", {"enum": "TimePeriod"}]}
/// {"struct": "models.NeedsFixup"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawType {
    /// A bare type name
    Name(String),
    /// A wrapper or reference
    Compound(RawCompound),
}

/// Wrapper and reference forms of [`RawType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawCompound {
    List(Box<RawType>),
    Set(Box<RawType>),
    Map(Box<RawType>, Box<RawType>),
    Struct(String),
    Enum(String),
}

impl RawType {
    /// A bare name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// `{"list": inner}`
    pub fn list(inner: RawType) -> Self {
        Self::Compound(RawCompound::List(Box::new(inner)))
    }

    /// `{"set": inner}`
    pub fn set(inner: RawType) -> Self {
        Self::Compound(RawCompound::Set(Box::new(inner)))
    }

    /// `{"map": [key, value]}`
    pub fn map(key: RawType, value: RawType) -> Self {
        Self::Compound(RawCompound::Map(Box::new(key), Box::new(value)))
    }

    /// `{"struct": name}`
    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self::Compound(RawCompound::Struct(name.into()))
    }

    /// `{"enum": name}`
    pub fn enum_ref(name: impl Into<String>) -> Self {
        Self::Compound(RawCompound::Enum(name.into()))
    }
}

impl From<&TypeSpec> for RawType {
    fn from(spec: &TypeSpec) -> Self {
        match spec {
            TypeSpec::Primitive(kind) => RawType::name(kind.as_str()),
            TypeSpec::List(inner) => RawType::list(inner.as_ref().into()),
            TypeSpec::Set(inner) => RawType::set(inner.as_ref().into()),
            TypeSpec::Map(key, value) => RawType::map(key.as_ref().into(), value.as_ref().into()),
            TypeSpec::Struct(name) => RawType::struct_ref(name.clone()),
            TypeSpec::Enum(name) => RawType::enum_ref(name.clone()),
            TypeSpec::Any => RawType::name("any"),
        }
    }
}

/// Qualify a bare name with a namespace.
///
/// Names that already contain a `.` are considered qualified and are
/// returned unchanged, which keeps qualification idempotent.
pub fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !name.contains('.') => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

/// Normalize a raw type.
///
/// Total: names that are neither primitives nor `any` normalize to
/// [`TypeSpec::Any`]. Struct and enum references are qualified with
/// `namespace` when bare. Idempotent through `RawType::from`.
pub fn normalize(raw: &RawType, namespace: Option<&str>) -> TypeSpec {
    match raw {
        RawType::Name(name) => PrimitiveKind::from_name(name)
            .map(TypeSpec::Primitive)
            .unwrap_or(TypeSpec::Any),
        RawType::Compound(compound) => match compound {
            RawCompound::List(inner) => TypeSpec::list(normalize(inner, namespace)),
            RawCompound::Set(inner) => TypeSpec::set(normalize(inner, namespace)),
            RawCompound::Map(key, value) => {
                TypeSpec::map(normalize(key, namespace), normalize(value, namespace))
            }
            RawCompound::Struct(name) => TypeSpec::Struct(qualify(name, namespace)),
            RawCompound::Enum(name) => TypeSpec::Enum(qualify(name, namespace)),
        },
    }
}

/// Qualify every struct/enum reference inside an already-normalized type.
pub(crate) fn qualify_spec(spec: &TypeSpec, namespace: Option<&str>) -> TypeSpec {
    normalize(&RawType::from(spec), namespace)
}
