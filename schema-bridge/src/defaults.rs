//! Default value synthesis.
//!
//! Schema defaults arrive in wire form. Each one is converted to its native
//! form exactly once, while the bridge is built, using the field's effective
//! type. Fields whose type mentions a struct anywhere are never given a
//! default: the result would be a shared record instance, so those fields
//! always start out unset.

use tracing::{debug, trace};

use crate::convert::{CompiledStruct, Converter};
use crate::error::{BuildError, BuildResult};
use crate::value::NativeValue;

/// Computes native defaults for compiled structs.
pub struct DefaultSynthesizer<'a> {
    converter: &'a Converter,
}

impl<'a> DefaultSynthesizer<'a> {
    pub fn new(converter: &'a Converter) -> Self {
        Self { converter }
    }

    /// Native defaults of `compiled`, in field order.
    pub fn synthesize(&self, compiled: &CompiledStruct) -> BuildResult<Vec<NativeValue>> {
        compiled
            .descriptor
            .fields
            .iter()
            .zip(&compiled.specs)
            .map(|(field, spec)| {
                let Some(default) = &field.default else {
                    return Ok(NativeValue::Unset);
                };
                if spec.contains_struct() {
                    debug!(
                        struct_name = %compiled.descriptor.name,
                        field = %field.name,
                        spec = %spec,
                        "Dropping schema default of struct-typed field"
                    );
                    return Ok(NativeValue::Unset);
                }
                let native = self
                    .converter
                    .to_native(default, spec)
                    .map_err(|source| BuildError::Default {
                        struct_name: compiled.descriptor.name.clone(),
                        field: field.name.clone(),
                        source,
                    })?;
                trace!(struct_name = %compiled.descriptor.name, field = %field.name, "Synthesized default");
                Ok(native)
            })
            .collect()
    }
}
