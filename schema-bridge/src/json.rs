//! JSON input for wire and native values.
//!
//! Both value types serialize to JSON through serde. Reading them back needs
//! the type, because JSON cannot tell a struct tuple from a list or an enum
//! symbol from a string. The functions here parse JSON guided by a
//! [`TypeSpec`]:
//!
//! | Type         | Wire JSON                         | Native JSON               |
//! |--------------|-----------------------------------|---------------------------|
//! | `struct S`   | `["S", v1, v2, ...]`              | `{"field": value, ...}`   |
//! | `enum E`     | integer or symbol                 | symbol or integer         |
//! | `string`     | string                            | string                    |
//! | `binary`     | string or array of bytes          | string or array of bytes  |
//! | `set<T>`     | array                             | array                     |
//! | `map<K, V>`  | object or array of `[k, v]` pairs | same                      |

use serde_json::Value as Json;
use std::collections::BTreeMap;

use crate::bridge::Bridge;
use crate::convert::Converter;
use crate::enums::EnumRegistry;
use crate::error::{ConversionError, ConversionResult};
use crate::types::{PrimitiveKind, TypeSpec};
use crate::value::{NativeRecord, NativeValue, WireMap, WireSet, WireStruct, WireValue};

/// Field types of structs by name, used to read struct tuples.
pub trait StructLookup {
    /// Effective field types of struct `name`, in wire order.
    fn field_types(&self, name: &str) -> Option<Vec<TypeSpec>>;

    /// Integer code of an enum symbol, for wire enums written as symbols.
    fn enum_code(&self, _enum_name: &str, _symbol: &str) -> Option<i64> {
        None
    }
}

/// A lookup that knows no structs.
///
/// Struct tuples are then read positionally with untyped fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStructs;

impl StructLookup for NoStructs {
    fn field_types(&self, _name: &str) -> Option<Vec<TypeSpec>> {
        None
    }
}

/// Knows enum symbols but no structs.
impl StructLookup for EnumRegistry {
    fn field_types(&self, _name: &str) -> Option<Vec<TypeSpec>> {
        None
    }

    fn enum_code(&self, enum_name: &str, symbol: &str) -> Option<i64> {
        self.by_symbol(enum_name, symbol).ok().map(|value| value.value())
    }
}

impl StructLookup for Converter {
    fn field_types(&self, name: &str) -> Option<Vec<TypeSpec>> {
        self.compiled(name).map(|compiled| compiled.specs.clone())
    }

    fn enum_code(&self, enum_name: &str, symbol: &str) -> Option<i64> {
        self.enums().enum_code(enum_name, symbol)
    }
}

impl StructLookup for Bridge {
    fn field_types(&self, name: &str) -> Option<Vec<TypeSpec>> {
        self.converter().field_types(name)
    }

    fn enum_code(&self, enum_name: &str, symbol: &str) -> Option<i64> {
        self.converter().enum_code(enum_name, symbol)
    }
}

// =============================================================================
// Wire
// =============================================================================

/// Read a wire value from JSON.
pub fn wire_from_json(json: &Json, spec: &TypeSpec, structs: &dyn StructLookup) -> ConversionResult<WireValue> {
    match (spec, json) {
        (_, Json::Null) => Ok(WireValue::Unset),
        (TypeSpec::Primitive(kind), _) => wire_primitive(*kind, json),
        (TypeSpec::Enum(_), Json::Number(_)) => json_int(json).map(WireValue::Int),
        (TypeSpec::Enum(name), Json::String(symbol)) => structs
            .enum_code(name, symbol)
            .map(WireValue::Int)
            .ok_or_else(|| ConversionError::UnknownEnumSymbol {
                enum_name: name.clone(),
                symbol: symbol.clone(),
                path: Default::default(),
            }),
        (TypeSpec::List(inner), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| wire_from_json(item, inner, structs).map_err(|e| e.at(format!("[{i}]"))))
            .collect::<ConversionResult<Vec<_>>>()
            .map(WireValue::List),
        (TypeSpec::Set(inner), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| wire_from_json(item, inner, structs).map_err(|e| e.at(format!("[{i}]"))))
            .collect::<ConversionResult<Vec<_>>>()
            .map(|elements| WireValue::Set(WireSet::from_elements(elements))),
        (TypeSpec::Map(key_spec, value_spec), _) => {
            let mut pairs = Vec::new();
            for (key, value) in json_pairs(json)? {
                let key = wire_key(&key, key_spec, structs).map_err(|e| e.at(format!("<{key}>")))?;
                let value = wire_from_json(&value, value_spec, structs)?;
                pairs.push((key, value));
            }
            Ok(WireValue::Map(WireMap::from_pairs(pairs)))
        }
        (TypeSpec::Struct(name), Json::Array(items)) => {
            let (tag, values) = split_tuple(items)?;
            let types = structs
                .field_types(name)
                .unwrap_or_else(|| vec![TypeSpec::Any; values.len()]);
            if types.len() != values.len() {
                return Err(ConversionError::ArityMismatch {
                    target: tag.to_string(),
                    expected: types.len(),
                    found: values.len(),
                    path: Default::default(),
                });
            }
            let fields = values
                .iter()
                .zip(&types)
                .enumerate()
                .map(|(i, (value, ty))| wire_from_json(value, ty, structs).map_err(|e| e.at(format!("[{}]", i + 1))))
                .collect::<ConversionResult<Vec<_>>>()?;
            Ok(WireValue::Struct(WireStruct::new(tag, fields)))
        }
        (TypeSpec::Any, _) => wire_any(json),
        (spec, json) => Err(ConversionError::mismatch(spec.to_string(), json_kind(json))),
    }
}

fn wire_primitive(kind: PrimitiveKind, json: &Json) -> ConversionResult<WireValue> {
    match (kind, json) {
        (PrimitiveKind::Bool, Json::Bool(b)) => Ok(WireValue::Bool(*b)),
        (PrimitiveKind::Double, Json::Number(n)) => n
            .as_f64()
            .map(WireValue::Double)
            .ok_or_else(|| ConversionError::mismatch("double", n.to_string())),
        (kind, Json::Number(_)) if kind.is_integer() => json_int(json).map(WireValue::Int),
        (PrimitiveKind::String | PrimitiveKind::Binary, Json::String(text)) => Ok(WireValue::string(text)),
        (PrimitiveKind::Binary, Json::Array(_)) => json_bytes(json).map(WireValue::Binary),
        (kind, json) => Err(ConversionError::mismatch(kind.as_str(), json_kind(json))),
    }
}

fn wire_any(json: &Json) -> ConversionResult<WireValue> {
    let value = match json {
        Json::Null => WireValue::Unset,
        Json::Bool(b) => WireValue::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => WireValue::Int(i),
            None => WireValue::Double(n.as_f64().unwrap_or_default()),
        },
        Json::String(text) => WireValue::string(text),
        Json::Array(items) => WireValue::List(items.iter().map(wire_any).collect::<ConversionResult<Vec<_>>>()?),
        Json::Object(map) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (key, value) in map {
                pairs.push((WireValue::string(key), wire_any(value)?));
            }
            WireValue::Map(WireMap::from_pairs(pairs))
        }
    };
    Ok(value)
}

// Object keys are always strings; integer and enum keys are parsed back.
fn wire_key(key: &Json, spec: &TypeSpec, structs: &dyn StructLookup) -> ConversionResult<WireValue> {
    match key {
        Json::String(text) if integer_keyed(spec) => match text.parse::<i64>() {
            Ok(code) => Ok(WireValue::Int(code)),
            Err(_) if matches!(spec, TypeSpec::Enum(_)) => wire_from_json(key, spec, structs),
            Err(_) => Err(ConversionError::mismatch("integer key", text.clone())),
        },
        _ => wire_from_json(key, spec, structs),
    }
}

fn integer_keyed(spec: &TypeSpec) -> bool {
    match spec {
        TypeSpec::Enum(_) => true,
        TypeSpec::Primitive(kind) => kind.is_integer(),
        _ => false,
    }
}

// =============================================================================
// Native
// =============================================================================

/// Read a native value from JSON.
pub fn native_from_json(json: &Json, spec: &TypeSpec, bridge: &Bridge) -> ConversionResult<NativeValue> {
    match (spec, json) {
        (_, Json::Null) => Ok(NativeValue::Unset),
        (TypeSpec::Primitive(kind), _) => native_primitive(*kind, json),
        (TypeSpec::Enum(name), _) => native_enum(name, json, bridge),
        (TypeSpec::List(inner), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| native_from_json(item, inner, bridge).map_err(|e| e.at(format!("[{i}]"))))
            .collect::<ConversionResult<Vec<_>>>()
            .map(NativeValue::List),
        (TypeSpec::Set(inner), Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| native_from_json(item, inner, bridge).map_err(|e| e.at(format!("[{i}]"))))
            .collect::<ConversionResult<Vec<_>>>()
            .map(NativeValue::set),
        (TypeSpec::Map(key_spec, value_spec), _) => {
            let mut out = BTreeMap::new();
            for (key, value) in json_pairs(json)? {
                let native_key = native_key(&key, key_spec, bridge).map_err(|e| e.at(format!("<{key}>")))?;
                let value = native_from_json(&value, value_spec, bridge)?;
                out.insert(native_key, value);
            }
            Ok(NativeValue::Map(out))
        }
        (TypeSpec::Struct(name), Json::Object(map)) => {
            let compiled = bridge
                .compiled_struct(name)
                .ok_or_else(|| ConversionError::unknown_struct(name))?;
            let mut record = NativeRecord::new(&compiled.native_name);
            for (field, value) in map {
                let position = compiled
                    .descriptor
                    .position(field)
                    .ok_or_else(|| ConversionError::unknown_field(&compiled.descriptor.name, field))?;
                let native = native_from_json(value, &compiled.specs[position], bridge)
                    .map_err(|e| e.at(format!(".{field}")))?;
                record.set(field.clone(), native);
            }
            Ok(NativeValue::Record(record))
        }
        (TypeSpec::Any, _) => native_any(json),
        (spec, json) => Err(ConversionError::mismatch(spec.to_string(), json_kind(json))),
    }
}

fn native_primitive(kind: PrimitiveKind, json: &Json) -> ConversionResult<NativeValue> {
    match (kind, json) {
        (PrimitiveKind::Bool, Json::Bool(b)) => Ok(NativeValue::Bool(*b)),
        (PrimitiveKind::Double, Json::Number(n)) => n
            .as_f64()
            .map(NativeValue::Double)
            .ok_or_else(|| ConversionError::mismatch("double", n.to_string())),
        (kind, Json::Number(_)) if kind.is_integer() => json_int(json).map(NativeValue::Int),
        (PrimitiveKind::String, Json::String(text)) => Ok(NativeValue::Text(text.clone())),
        (PrimitiveKind::Binary, Json::String(text)) => Ok(NativeValue::Bytes(text.as_bytes().to_vec())),
        (PrimitiveKind::Binary, Json::Array(_)) => json_bytes(json).map(NativeValue::Bytes),
        (kind, json) => Err(ConversionError::mismatch(kind.as_str(), json_kind(json))),
    }
}

fn native_enum(name: &str, json: &Json, bridge: &Bridge) -> ConversionResult<NativeValue> {
    let enums = bridge.enums();
    let value = match json {
        Json::String(symbol) => enums.by_symbol(name, symbol).map_err(|_| {
            if enums.contains(name) {
                ConversionError::UnknownEnumSymbol {
                    enum_name: name.to_string(),
                    symbol: symbol.clone(),
                    path: Default::default(),
                }
            } else {
                ConversionError::UnknownEnum {
                    name: name.to_string(),
                    path: Default::default(),
                }
            }
        })?,
        Json::Number(_) => enums
            .by_value(name, json_int(json)?)
            .map_err(|_| ConversionError::UnknownEnum {
                name: name.to_string(),
                path: Default::default(),
            })?,
        other => return Err(ConversionError::mismatch(format!("enum {name}"), json_kind(other))),
    };
    Ok(NativeValue::Enum(value))
}

fn native_key(key: &Json, spec: &TypeSpec, bridge: &Bridge) -> ConversionResult<NativeValue> {
    match key {
        Json::String(text) if integer_keyed(spec) => match text.parse::<i64>() {
            Ok(code) => native_from_json(&Json::from(code), spec, bridge),
            // Enum keys may also be written as symbols.
            Err(_) if matches!(spec, TypeSpec::Enum(_)) => native_from_json(key, spec, bridge),
            Err(_) => Err(ConversionError::mismatch("integer key", text.clone())),
        },
        _ => native_from_json(key, spec, bridge),
    }
}

fn native_any(json: &Json) -> ConversionResult<NativeValue> {
    let value = match json {
        Json::Null => NativeValue::Unset,
        Json::Bool(b) => NativeValue::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => NativeValue::Int(i),
            None => NativeValue::Double(n.as_f64().unwrap_or_default()),
        },
        Json::String(text) => NativeValue::Text(text.clone()),
        Json::Array(items) => NativeValue::List(items.iter().map(native_any).collect::<ConversionResult<Vec<_>>>()?),
        Json::Object(map) => {
            let mut out = BTreeMap::new();
            for (key, value) in map {
                out.insert(NativeValue::Text(key.clone()), native_any(value)?);
            }
            NativeValue::Map(out)
        }
    };
    Ok(value)
}

// =============================================================================
// Helpers
// =============================================================================

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn json_int(json: &Json) -> ConversionResult<i64> {
    json.as_i64()
        .ok_or_else(|| ConversionError::mismatch("integer", json.to_string()))
}

fn json_bytes(json: &Json) -> ConversionResult<Vec<u8>> {
    let items = json
        .as_array()
        .ok_or_else(|| ConversionError::mismatch("byte array", json_kind(json)))?;
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| ConversionError::mismatch("byte", item.to_string()))
        })
        .collect()
}

// A map is an object, or an array of two-element arrays.
fn json_pairs(json: &Json) -> ConversionResult<Vec<(Json, Json)>> {
    match json {
        Json::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| (Json::String(key.clone()), value.clone()))
            .collect()),
        Json::Array(items) => items
            .iter()
            .map(|item| match item.as_array().map(Vec::as_slice) {
                Some([key, value]) => Ok((key.clone(), value.clone())),
                _ => Err(ConversionError::mismatch("[key, value] pair", json_kind(item))),
            })
            .collect(),
        other => Err(ConversionError::mismatch("map", json_kind(other))),
    }
}

fn split_tuple(items: &[Json]) -> ConversionResult<(&str, &[Json])> {
    match items.split_first() {
        Some((Json::String(tag), rest)) => Ok((tag.as_str(), rest)),
        Some((other, _)) => Err(ConversionError::mismatch("struct tag", json_kind(other))),
        None => Err(ConversionError::mismatch("struct tuple", "empty array")),
    }
}
