//! Wire and native value representations.
//!
//! [`WireValue`] is what a transport decoder hands over: positional tagged
//! tuples, plain integers for enums, bytes for strings and opaque set/map
//! containers. [`NativeValue`] is what application code works with: named
//! records, symbolic enums, text and ordered collections.
//!
//! Both types are totally ordered (doubles compare with `f64::total_cmp`) so
//! any value can be a set element or a map key.

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::enums::EnumValue;

// =============================================================================
// Wire values
// =============================================================================

/// A decoded wire value.
#[derive(Debug, Clone)]
pub enum WireValue {
    /// An absent optional field
    Unset,
    Bool(bool),
    /// Any integer width; enums are integers on the wire
    Int(i64),
    Double(f64),
    /// Byte sequence; carries both strings and binaries
    Binary(Vec<u8>),
    List(Vec<WireValue>),
    Set(WireSet),
    Map(WireMap),
    /// Positional tuple led by the struct tag
    Struct(WireStruct),
}

/// Opaque, duplicate-free wire set.
///
/// Only conversion to and from a sequence of elements is exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct WireSet(BTreeSet<WireValue>);

impl WireSet {
    /// Build a set from elements; duplicates collapse.
    pub fn from_elements(elements: impl IntoIterator<Item = WireValue>) -> Self {
        Self(elements.into_iter().collect())
    }

    /// The elements as an ordered sequence.
    pub fn to_elements(&self) -> Vec<WireValue> {
        self.0.iter().cloned().collect()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, value: &WireValue) -> bool {
        self.0.contains(value)
    }
}

/// Opaque wire association.
///
/// Keys are stored in their wire form (an enum key stays an integer).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct WireMap(BTreeMap<WireValue, WireValue>);

impl WireMap {
    /// Build a map from pairs; a later duplicate key replaces an earlier one.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (WireValue, WireValue)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// The pairs as an ordered sequence.
    pub fn to_pairs(&self) -> Vec<(WireValue, WireValue)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Look up a value by its wire key.
    pub fn get(&self, key: &WireValue) -> Option<&WireValue> {
        self.0.get(key)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A wire struct: `(tag, v1, ..., vN)` with values in field-id order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WireStruct {
    pub tag: String,
    pub fields: Vec<WireValue>,
}

impl WireStruct {
    pub fn new(tag: impl Into<String>, fields: Vec<WireValue>) -> Self {
        Self {
            tag: tag.into(),
            fields,
        }
    }
}

impl WireValue {
    /// A string as wire bytes.
    pub fn string(text: impl AsRef<str>) -> Self {
        Self::Binary(text.as_ref().as_bytes().to_vec())
    }

    /// A tagged tuple.
    pub fn tuple(tag: impl Into<String>, fields: Vec<WireValue>) -> Self {
        Self::Struct(WireStruct::new(tag, fields))
    }

    /// A wire set.
    pub fn set(elements: impl IntoIterator<Item = WireValue>) -> Self {
        Self::Set(WireSet::from_elements(elements))
    }

    /// A wire map.
    pub fn map(pairs: impl IntoIterator<Item = (WireValue, WireValue)>) -> Self {
        Self::Map(WireMap::from_pairs(pairs))
    }

    /// Short shape name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Double(_) => "double",
            Self::Binary(_) => "binary",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Double(_) => 3,
            Self::Binary(_) => 4,
            Self::List(_) => 5,
            Self::Set(_) => 6,
            Self::Map(_) => 7,
            Self::Struct(_) => 8,
        }
    }
}

impl Ord for WireValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unset, Self::Unset) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Binary(a), Self::Binary(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Struct(a), Self::Struct(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for WireValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for WireValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WireValue {}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(value: Vec<WireValue>) -> Self {
        Self::List(value)
    }
}

/// Generic JSON rendering: structs become `[tag, ...fields]`, sets become
/// arrays, maps become arrays of `[key, value]` pairs, UTF-8 binaries become
/// strings.
impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => bytes.serialize(serializer),
            },
            Self::List(items) => items.serialize(serializer),
            Self::Set(set) => set.0.iter().collect::<Vec<_>>().serialize(serializer),
            Self::Map(map) => {
                let mut seq = serializer.serialize_seq(Some(map.len()))?;
                for pair in map.0.iter() {
                    seq.serialize_element(&pair)?;
                }
                seq.end()
            }
            Self::Struct(st) => {
                let mut seq = serializer.serialize_seq(Some(st.fields.len() + 1))?;
                seq.serialize_element(&st.tag)?;
                for field in &st.fields {
                    seq.serialize_element(field)?;
                }
                seq.end()
            }
        }
    }
}

// =============================================================================
// Native values
// =============================================================================

/// A native value.
#[derive(Debug, Clone)]
pub enum NativeValue {
    /// The unset sentinel
    Unset,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Enum(EnumValue),
    List(Vec<NativeValue>),
    Set(BTreeSet<NativeValue>),
    Map(BTreeMap<NativeValue, NativeValue>),
    Record(NativeRecord),
    /// A wire value that had no type to convert it by
    Opaque(WireValue),
}

/// A named-field native record.
///
/// Fields keep declaration order.
#[derive(Debug, Clone)]
pub struct NativeRecord {
    /// Native type name (the struct tag after namespace mapping)
    pub type_name: String,
    fields: IndexMap<String, NativeValue>,
}

impl NativeRecord {
    /// An empty record.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: NativeValue) {
        self.fields.insert(name.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<NativeValue>) -> Self {
        self.set(name, value.into());
        self
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.fields.get(name)
    }

    /// Mutable field value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut NativeValue> {
        self.fields.get_mut(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl NativeRecord {
    // Set fields sorted by name. An absent field and an `Unset` one are the
    // same field.
    fn keyed(&self) -> Vec<(&str, &NativeValue)> {
        let mut keyed: Vec<_> = self.fields().filter(|(_, value)| !value.is_unset()).collect();
        keyed.sort_unstable_by(|a, b| a.0.cmp(b.0));
        keyed
    }
}

/// Records compare as name-keyed maps: field insertion order is irrelevant.
impl Ord for NativeRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_name
            .cmp(&other.type_name)
            .then_with(|| self.keyed().cmp(&other.keyed()))
    }
}

impl PartialOrd for NativeRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NativeRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NativeRecord {}

impl NativeValue {
    /// Text value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Native set.
    pub fn set(elements: impl IntoIterator<Item = NativeValue>) -> Self {
        Self::Set(elements.into_iter().collect())
    }

    /// Native map.
    pub fn map(pairs: impl IntoIterator<Item = (NativeValue, NativeValue)>) -> Self {
        Self::Map(pairs.into_iter().collect())
    }

    /// Whether this is the unset sentinel.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The record, if this is one.
    pub fn as_record(&self) -> Option<&NativeRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The enum value, if this is one.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// The text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short shape name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Opaque(_) => "opaque",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Double(_) => 3,
            Self::Text(_) => 4,
            Self::Bytes(_) => 5,
            Self::Enum(_) => 6,
            Self::List(_) => 7,
            Self::Set(_) => 8,
            Self::Map(_) => 9,
            Self::Record(_) => 10,
            Self::Opaque(_) => 11,
        }
    }
}

impl Ord for NativeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Unset, Self::Unset) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Record(a), Self::Record(b)) => a.cmp(b),
            (Self::Opaque(a), Self::Opaque(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for NativeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NativeValue {}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<EnumValue> for NativeValue {
    fn from(value: EnumValue) -> Self {
        Self::Enum(value)
    }
}

impl From<NativeRecord> for NativeValue {
    fn from(value: NativeRecord) -> Self {
        Self::Record(value)
    }
}

impl From<Vec<NativeValue>> for NativeValue {
    fn from(value: Vec<NativeValue>) -> Self {
        Self::List(value)
    }
}

/// JSON rendering for application-facing output.
///
/// Records become objects, resolved enums their symbol, unresolved enums
/// their integer. Maps whose keys are all text or resolved enums become
/// objects; any other map becomes an array of `[key, value]` pairs.
impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Bytes(bytes) => bytes.serialize(serializer),
            Self::Enum(value) => match value.symbol() {
                Some(symbol) => serializer.serialize_str(symbol),
                None => serializer.serialize_i64(value.value()),
            },
            Self::List(items) => items.serialize(serializer),
            Self::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let keys: Option<Vec<&str>> = map.keys().map(json_key).collect();
                match keys {
                    Some(keys) => {
                        let mut out = serializer.serialize_map(Some(map.len()))?;
                        for (key, value) in keys.into_iter().zip(map.values()) {
                            out.serialize_entry(key, value)?;
                        }
                        out.end()
                    }
                    None => {
                        let mut seq = serializer.serialize_seq(Some(map.len()))?;
                        for pair in map.iter() {
                            seq.serialize_element(&pair)?;
                        }
                        seq.end()
                    }
                }
            }
            Self::Record(record) => {
                let mut out = serializer.serialize_map(Some(record.len()))?;
                for (name, value) in record.fields() {
                    out.serialize_entry(name, value)?;
                }
                out.end()
            }
            Self::Opaque(wire) => wire.serialize(serializer),
        }
    }
}

fn json_key(key: &NativeValue) -> Option<&str> {
    match key {
        NativeValue::Text(text) => Some(text),
        NativeValue::Enum(value) => value.symbol(),
        _ => None,
    }
}
