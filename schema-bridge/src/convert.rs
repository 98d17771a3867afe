//! Conversion engine.
//!
//! A single table-driven interpreter walks a [`TypeSpec`] at call time and
//! converts in either direction. Struct leaves are looked up by qualified
//! name in the compiled struct table, so recursive schemas need no special
//! handling: recursion follows the value, which is always finite.

use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

use crate::callback::CallbackRegistry;
use crate::enums::EnumRegistry;
use crate::error::{ConversionError, ConversionResult};
use crate::schema::StructDescriptor;
use crate::types::{qualify, PrimitiveKind, TypeSpec};
use crate::value::{NativeRecord, NativeValue, WireMap, WireSet, WireStruct, WireValue};

/// A struct ready for conversion.
#[derive(Debug, Clone)]
pub struct CompiledStruct {
    pub descriptor: StructDescriptor,
    /// Effective type of each field (override-aware), in field order
    pub specs: Vec<TypeSpec>,
    /// Type name used for native records
    pub native_name: String,
    /// Synthesized native default of each field, in field order
    pub defaults: Vec<NativeValue>,
}

impl CompiledStruct {
    pub(crate) fn new(descriptor: StructDescriptor, specs: Vec<TypeSpec>, native_name: String) -> Self {
        let defaults = vec![NativeValue::Unset; specs.len()];
        Self {
            descriptor,
            specs,
            native_name,
            defaults,
        }
    }

    /// Qualified struct name; also the wire tag.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Fields paired with their effective types.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &TypeSpec)> {
        self.descriptor
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.specs.iter())
    }

    /// A record holding every synthesized default.
    pub fn default_record(&self) -> NativeRecord {
        let mut record = NativeRecord::new(&self.native_name);
        for (field, default) in self.descriptor.fields.iter().zip(&self.defaults) {
            record.set(field.name.clone(), default.clone());
        }
        record
    }
}

/// The compiled conversion table.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    structs: IndexMap<String, CompiledStruct>,
    native_names: HashMap<String, String>,
    enums: EnumRegistry,
    callbacks: CallbackRegistry,
    namespace: Option<String>,
    debug_logging: bool,
}

impl Converter {
    pub(crate) fn new(
        structs: IndexMap<String, CompiledStruct>,
        enums: EnumRegistry,
        namespace: Option<String>,
    ) -> Self {
        let native_names = structs
            .values()
            .map(|s| (s.native_name.clone(), s.descriptor.name.clone()))
            .collect();
        Self {
            structs,
            native_names,
            enums,
            callbacks: CallbackRegistry::new(),
            namespace,
            debug_logging: false,
        }
    }

    pub(crate) fn set_defaults(&mut self, name: &str, defaults: Vec<NativeValue>) {
        if let Some(compiled) = self.structs.get_mut(name) {
            compiled.defaults = defaults;
        }
    }

    pub(crate) fn attach_callbacks(&mut self, callbacks: CallbackRegistry) {
        self.callbacks = callbacks;
    }

    pub(crate) fn set_debug_logging(&mut self, enabled: bool) {
        self.debug_logging = enabled;
    }

    /// The enum registry.
    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// Compiled structs in discovery order.
    pub fn structs(&self) -> impl Iterator<Item = &CompiledStruct> {
        self.structs.values()
    }

    /// Compiled struct by qualified name, bare name or native type name.
    pub fn compiled(&self, name: &str) -> Option<&CompiledStruct> {
        self.structs
            .get(name)
            .or_else(|| self.structs.get(&qualify(name, self.namespace.as_deref())))
            .or_else(|| {
                self.native_names
                    .get(name)
                    .and_then(|qualified| self.structs.get(qualified))
            })
    }

    fn require(&self, name: &str) -> ConversionResult<&CompiledStruct> {
        self.compiled(name)
            .ok_or_else(|| ConversionError::unknown_struct(name))
    }

    // =========================================================================
    // Wire to native
    // =========================================================================

    /// Convert a wire value according to `spec`.
    pub fn to_native(&self, wire: &WireValue, spec: &TypeSpec) -> ConversionResult<NativeValue> {
        match (spec, wire) {
            (_, WireValue::Unset) => Ok(NativeValue::Unset),
            (TypeSpec::Any, _) => self.any_to_native(wire),
            (TypeSpec::Primitive(kind), _) => primitive_to_native(*kind, wire),
            (TypeSpec::List(inner), WireValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.to_native(item, inner).map_err(|e| e.at(format!("[{i}]"))))
                .collect::<ConversionResult<Vec<_>>>()
                .map(NativeValue::List),
            (TypeSpec::Set(inner), WireValue::Set(set)) => set
                .to_elements()
                .iter()
                .enumerate()
                .map(|(i, item)| self.to_native(item, inner).map_err(|e| e.at(format!("{{{i}}}"))))
                .collect::<ConversionResult<BTreeSet<_>>>()
                .map(NativeValue::Set),
            (TypeSpec::Map(key_spec, value_spec), WireValue::Map(map)) => {
                let mut out = BTreeMap::new();
                for (key, value) in map.to_pairs() {
                    let label = wire_label(&key);
                    let key = self
                        .to_native(&key, key_spec)
                        .map_err(|e| e.at(format!("<{label}>")))?;
                    let value = self
                        .to_native(&value, value_spec)
                        .map_err(|e| e.at(format!("[{label}]")))?;
                    out.insert(key, value);
                }
                Ok(NativeValue::Map(out))
            }
            (TypeSpec::Struct(name), WireValue::Struct(st)) => self.struct_to_native(name, st),
            (TypeSpec::Enum(name), WireValue::Int(value)) => self
                .enums
                .to_native(name, *value)
                .map(NativeValue::Enum),
            (spec, wire) => Err(ConversionError::mismatch(spec.to_string(), wire.kind_name())),
        }
    }

    /// Convert a wire tuple as struct `name`, then run its callbacks.
    pub fn struct_to_native(&self, name: &str, wire: &WireStruct) -> ConversionResult<NativeValue> {
        let compiled = self.require(name)?;
        if wire.tag != compiled.descriptor.name {
            return Err(ConversionError::tag_mismatch(&compiled.descriptor.name, &wire.tag));
        }
        if wire.fields.len() != compiled.specs.len() {
            return Err(ConversionError::ArityMismatch {
                target: compiled.descriptor.name.clone(),
                expected: compiled.specs.len(),
                found: wire.fields.len(),
                path: Default::default(),
            });
        }

        let mut record = NativeRecord::new(&compiled.native_name);
        for ((field, spec), value) in compiled
            .descriptor
            .fields
            .iter()
            .zip(&compiled.specs)
            .zip(&wire.fields)
        {
            let native = self
                .to_native(value, spec)
                .map_err(|e| e.at(format!(".{}", field.name)))?;
            record.set(field.name.clone(), native);
        }

        if self.debug_logging {
            debug!(struct_name = %compiled.descriptor.name, fields = record.len(), "Converted struct to native");
        }
        let value = NativeValue::Record(record);
        Ok(match self.callbacks.to_native_chain(&compiled.descriptor.name) {
            Some(chain) => chain.apply(value),
            None => value,
        })
    }

    fn any_to_native(&self, wire: &WireValue) -> ConversionResult<NativeValue> {
        let value = match wire {
            WireValue::Unset => NativeValue::Unset,
            WireValue::Bool(b) => NativeValue::Bool(*b),
            WireValue::Int(i) => NativeValue::Int(*i),
            WireValue::Double(d) => NativeValue::Double(*d),
            WireValue::Binary(bytes) => NativeValue::Bytes(bytes.clone()),
            WireValue::List(_) | WireValue::Set(_) | WireValue::Map(_) => {
                return self.to_native(wire, &any_container(wire));
            }
            WireValue::Struct(st) => match self.structs.get(&st.tag) {
                Some(_) => return self.struct_to_native(&st.tag, st),
                None => {
                    trace!(tag = %st.tag, "Untyped struct kept opaque");
                    NativeValue::Opaque(wire.clone())
                }
            },
        };
        Ok(value)
    }

    // =========================================================================
    // Native to wire
    // =========================================================================

    /// Convert a native value according to `spec`.
    pub fn to_wire(&self, native: &NativeValue, spec: &TypeSpec) -> ConversionResult<WireValue> {
        match (spec, native) {
            (_, NativeValue::Unset) => Ok(WireValue::Unset),
            (TypeSpec::Any, _) => self.any_to_wire(native),
            (TypeSpec::Primitive(kind), _) => primitive_to_wire(*kind, native),
            (TypeSpec::List(inner), NativeValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.to_wire(item, inner).map_err(|e| e.at(format!("[{i}]"))))
                .collect::<ConversionResult<Vec<_>>>()
                .map(WireValue::List),
            (TypeSpec::Set(inner), NativeValue::Set(items)) => {
                let elements = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.to_wire(item, inner).map_err(|e| e.at(format!("{{{i}}}"))))
                    .collect::<ConversionResult<Vec<_>>>()?;
                Ok(WireValue::Set(WireSet::from_elements(elements)))
            }
            (TypeSpec::Map(key_spec, value_spec), NativeValue::Map(map)) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let label = native_label(key);
                    let key = self
                        .to_wire(key, key_spec)
                        .map_err(|e| e.at(format!("<{label}>")))?;
                    let value = self
                        .to_wire(value, value_spec)
                        .map_err(|e| e.at(format!("[{label}]")))?;
                    pairs.push((key, value));
                }
                Ok(WireValue::Map(WireMap::from_pairs(pairs)))
            }
            (TypeSpec::Struct(name), NativeValue::Record(record)) => self.struct_to_wire(name, record),
            (TypeSpec::Enum(name), _) => self.enum_to_wire(name, native),
            (spec, native) => Err(ConversionError::mismatch(spec.to_string(), native.kind_name())),
        }
    }

    /// Convert a native record as struct `name`, then run its callbacks.
    ///
    /// Fields missing from the record are sent as unset.
    pub fn struct_to_wire(&self, name: &str, record: &NativeRecord) -> ConversionResult<WireValue> {
        let compiled = self.require(name)?;
        if record.type_name != compiled.native_name && record.type_name != compiled.descriptor.name {
            return Err(ConversionError::tag_mismatch(&compiled.native_name, &record.type_name));
        }
        if let Some(unknown) = record
            .field_names()
            .find(|field| compiled.descriptor.field(field).is_none())
        {
            return Err(ConversionError::unknown_field(&compiled.descriptor.name, unknown));
        }

        let mut fields = Vec::with_capacity(compiled.specs.len());
        for (field, spec) in compiled.descriptor.fields.iter().zip(&compiled.specs) {
            let value = record.get(&field.name).unwrap_or(&NativeValue::Unset);
            let wire = self
                .to_wire(value, spec)
                .map_err(|e| e.at(format!(".{}", field.name)))?;
            fields.push(wire);
        }

        if self.debug_logging {
            debug!(struct_name = %compiled.descriptor.name, fields = fields.len(), "Converted struct to wire");
        }
        let value = WireValue::Struct(WireStruct::new(&compiled.descriptor.name, fields));
        Ok(match self.callbacks.to_wire_chain(&compiled.descriptor.name) {
            Some(chain) => chain.apply(value),
            None => value,
        })
    }

    fn enum_to_wire(&self, name: &str, native: &NativeValue) -> ConversionResult<WireValue> {
        match native {
            NativeValue::Enum(value) if self.enums.same_enum(name, value) => Ok(WireValue::Int(value.value())),
            NativeValue::Enum(value) => Err(ConversionError::mismatch(
                format!("enum {name}"),
                format!("enum {}", value.enum_name()),
            )),
            NativeValue::Int(value) => {
                // Raw codes are accepted as-is, but the enum must exist.
                self.enums.to_native(name, *value)?;
                Ok(WireValue::Int(*value))
            }
            NativeValue::Text(symbol) => self.enums.symbol_to_value(name, symbol).map(WireValue::Int),
            other => Err(ConversionError::mismatch(format!("enum {name}"), other.kind_name())),
        }
    }

    fn any_to_wire(&self, native: &NativeValue) -> ConversionResult<WireValue> {
        let value = match native {
            NativeValue::Unset => WireValue::Unset,
            NativeValue::Bool(b) => WireValue::Bool(*b),
            NativeValue::Int(i) => WireValue::Int(*i),
            NativeValue::Double(d) => WireValue::Double(*d),
            NativeValue::Text(text) => WireValue::string(text),
            NativeValue::Bytes(bytes) => WireValue::Binary(bytes.clone()),
            NativeValue::Enum(value) => WireValue::Int(value.value()),
            NativeValue::List(items) => WireValue::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.any_to_wire(item).map_err(|e| e.at(format!("[{i}]"))))
                    .collect::<ConversionResult<Vec<_>>>()?,
            ),
            NativeValue::Set(items) => WireValue::Set(WireSet::from_elements(
                items
                    .iter()
                    .map(|item| self.any_to_wire(item))
                    .collect::<ConversionResult<Vec<_>>>()?,
            )),
            NativeValue::Map(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (key, value) in map {
                    pairs.push((self.any_to_wire(key)?, self.any_to_wire(value)?));
                }
                WireValue::Map(WireMap::from_pairs(pairs))
            }
            NativeValue::Record(record) => {
                let name = self.require(&record.type_name)?.descriptor.name.clone();
                return self.struct_to_wire(&name, record);
            }
            NativeValue::Opaque(wire) => wire.clone(),
        };
        Ok(value)
    }
}

fn primitive_to_native(kind: PrimitiveKind, wire: &WireValue) -> ConversionResult<NativeValue> {
    match (kind, wire) {
        (PrimitiveKind::String, WireValue::Binary(bytes)) => String::from_utf8(bytes.clone())
            .map(NativeValue::Text)
            .map_err(|e| ConversionError::InvalidUtf8 {
                message: e.utf8_error().to_string(),
                path: Default::default(),
            }),
        (PrimitiveKind::Binary, WireValue::Binary(bytes)) => Ok(NativeValue::Bytes(bytes.clone())),
        (PrimitiveKind::Bool, WireValue::Bool(b)) => Ok(NativeValue::Bool(*b)),
        (PrimitiveKind::Double, WireValue::Double(d)) => Ok(NativeValue::Double(*d)),
        (kind, WireValue::Int(i)) if kind.is_integer() => Ok(NativeValue::Int(*i)),
        (kind, wire) => Err(ConversionError::mismatch(kind.as_str(), wire.kind_name())),
    }
}

fn primitive_to_wire(kind: PrimitiveKind, native: &NativeValue) -> ConversionResult<WireValue> {
    match (kind, native) {
        (PrimitiveKind::String, NativeValue::Text(text)) => Ok(WireValue::string(text)),
        (PrimitiveKind::Binary, NativeValue::Bytes(bytes)) => Ok(WireValue::Binary(bytes.clone())),
        (PrimitiveKind::Bool, NativeValue::Bool(b)) => Ok(WireValue::Bool(*b)),
        (PrimitiveKind::Double, NativeValue::Double(d)) => Ok(WireValue::Double(*d)),
        (kind, NativeValue::Int(i)) if kind.is_integer() => Ok(WireValue::Int(*i)),
        (kind, native) => Err(ConversionError::mismatch(kind.as_str(), native.kind_name())),
    }
}

// Container spec with `Any` leaves matching the shape of `wire`.
fn any_container(wire: &WireValue) -> TypeSpec {
    match wire {
        WireValue::List(_) => TypeSpec::list(TypeSpec::Any),
        WireValue::Set(_) => TypeSpec::set(TypeSpec::Any),
        WireValue::Map(_) => TypeSpec::map(TypeSpec::Any, TypeSpec::Any),
        _ => TypeSpec::Any,
    }
}

fn wire_label(key: &WireValue) -> String {
    match key {
        WireValue::Int(i) => i.to_string(),
        WireValue::Binary(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => format!("{text:?}"),
            Err(_) => "binary".to_string(),
        },
        other => other.kind_name().to_string(),
    }
}

fn native_label(key: &NativeValue) -> String {
    match key {
        NativeValue::Int(i) => i.to_string(),
        NativeValue::Text(text) => format!("{text:?}"),
        NativeValue::Enum(value) => value.to_string(),
        other => other.kind_name().to_string(),
    }
}
