//! Command implementations.
//!
//! Each command works on a [`Bridge`] built from a schema document and
//! returns plain data; `main.rs` does the printing.

use serde_json::Value as Json;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use schema_bridge::{
    native_from_json, normalize, wire_from_json, Bridge, NativeValue, PrimitiveKind, RawType,
    SchemaDocument, TypeSpec,
};

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Load the configured schema document and build its bridge.
pub fn load_bridge(config: &Config) -> CliResult<Bridge> {
    let path = config.schema_path()?;
    let document = SchemaDocument::from_path(path)?;
    let bridge = document.builder_with_config(config.bridge.clone()).build()?;
    info!(
        path = %path.display(),
        structs = bridge.struct_names().len(),
        functions = bridge.function_names().len(),
        "Schema loaded"
    );
    Ok(bridge)
}

/// Parse a type expression.
///
/// Accepts a JSON raw type (`{"list": "i32"}`, `"string"`) or a bare name,
/// which is tried as a primitive, then a struct, then an enum.
pub fn parse_type(expr: &str, bridge: &Bridge) -> CliResult<TypeSpec> {
    let expr = expr.trim();
    let namespace = bridge.config().schema_namespace.as_deref();

    if expr.starts_with('{') || expr.starts_with('"') {
        let raw: RawType = serde_json::from_str(expr)
            .map_err(|e| CliError::Input(format!("type expression '{expr}': {e}")))?;
        return Ok(normalize(&raw, namespace));
    }
    if expr == "any" {
        return Ok(TypeSpec::Any);
    }
    if let Some(kind) = PrimitiveKind::from_name(expr) {
        return Ok(TypeSpec::Primitive(kind));
    }
    if let Some(compiled) = bridge.compiled_struct(expr) {
        return Ok(TypeSpec::struct_ref(compiled.name()));
    }
    if let Some(descriptor) = bridge.enums().descriptor(expr) {
        return Ok(TypeSpec::enum_ref(descriptor.name.clone()));
    }
    Err(CliError::Input(format!("unknown type '{expr}'")))
}

/// Read JSON input from a file, or from stdin when the path is absent or `-`.
pub fn read_input(path: Option<&Path>) -> CliResult<Json> {
    let content = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&content)?)
}

/// Wire JSON in, native JSON out.
pub fn to_native(bridge: &Bridge, spec: &TypeSpec, input: &Json) -> CliResult<Json> {
    let wire = wire_from_json(input, spec, bridge)?;
    let native = bridge.to_native(&wire, spec)?;
    debug!(spec = %spec, kind = native.kind_name(), "Converted to native");
    Ok(serde_json::to_value(&native)?)
}

/// Native JSON in, wire JSON out.
pub fn to_wire(bridge: &Bridge, spec: &TypeSpec, input: &Json) -> CliResult<Json> {
    let native = native_from_json(input, spec, bridge)?;
    let wire = bridge.to_wire(&native, spec)?;
    debug!(spec = %spec, kind = wire.kind_name(), "Converted to wire");
    Ok(serde_json::to_value(&wire)?)
}

/// The zero-argument record of a struct, as native JSON.
pub fn defaults(bridge: &Bridge, struct_name: &str) -> CliResult<Json> {
    let record = bridge.new_record(struct_name)?;
    Ok(serde_json::to_value(NativeValue::Record(record))?)
}

/// Render JSON for output.
pub fn render(json: &Json, pretty: bool) -> CliResult<String> {
    let text = if pretty {
        serde_json::to_string_pretty(json)?
    } else {
        serde_json::to_string(json)?
    };
    Ok(text)
}

// =============================================================================
// Inspection
// =============================================================================

/// Summary of a built bridge.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub structs: Vec<StructReport>,
    pub functions: Vec<FunctionReport>,
    pub enums: Vec<EnumReport>,
}

#[derive(Debug, Clone)]
pub struct StructReport {
    pub name: String,
    pub native_name: String,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone)]
pub struct FieldReport {
    pub id: i16,
    pub name: String,
    /// Effective type
    pub spec: String,
    pub required: bool,
    /// Synthesized native default, when the field has one
    pub default: Option<Json>,
}

#[derive(Debug, Clone)]
pub struct FunctionReport {
    pub name: String,
    pub args: Vec<(String, String)>,
    pub reply: String,
}

#[derive(Debug, Clone)]
pub struct EnumReport {
    pub name: String,
    pub values: Vec<(String, i64)>,
}

/// Describe the bridge. A non-empty `roots` limits the struct list to the
/// named structs.
pub fn inspect(bridge: &Bridge, roots: &[String]) -> CliResult<Inspection> {
    let mut selected = Vec::new();
    if roots.is_empty() {
        selected.extend(bridge.struct_names().into_iter().map(str::to_string));
    } else {
        for root in roots {
            let compiled = bridge
                .compiled_struct(root)
                .ok_or_else(|| CliError::Input(format!("unknown struct '{root}'")))?;
            selected.push(compiled.name().to_string());
        }
    }

    let mut structs = Vec::with_capacity(selected.len());
    for name in &selected {
        let Some(compiled) = bridge.compiled_struct(name) else {
            continue;
        };
        let mut fields = Vec::with_capacity(compiled.specs.len());
        for ((field, spec), default) in compiled
            .descriptor
            .fields
            .iter()
            .zip(&compiled.specs)
            .zip(&compiled.defaults)
        {
            let default = match default {
                NativeValue::Unset => None,
                value => Some(serde_json::to_value(value)?),
            };
            fields.push(FieldReport {
                id: field.id,
                name: field.name.clone(),
                spec: spec.to_string(),
                required: field.required,
                default,
            });
        }
        structs.push(StructReport {
            name: compiled.name().to_string(),
            native_name: compiled.native_name.clone(),
            fields,
        });
    }

    let functions = bridge
        .function_names()
        .into_iter()
        .filter_map(|name| bridge.function(name))
        .map(|function| FunctionReport {
            name: function.descriptor.name.clone(),
            args: function
                .descriptor
                .params
                .iter()
                .zip(&function.args)
                .map(|(param, spec)| (param.name.clone(), spec.to_string()))
                .collect(),
            reply: function.reply.to_string(),
        })
        .collect();

    let enums = bridge
        .enums()
        .names()
        .into_iter()
        .filter_map(|name| bridge.enums().descriptor(name))
        .map(|descriptor| EnumReport {
            name: descriptor.name.clone(),
            values: descriptor.pairs.clone(),
        })
        .collect();

    Ok(Inspection {
        structs,
        functions,
        enums,
    })
}
