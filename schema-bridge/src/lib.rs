//! # schema-bridge
//!
//! Schema-driven conversion between wire values and native values.
//!
//! ## Overview
//!
//! RPC transports hand over decoded values in a positional shape: structs
//! are tagged tuples, enums are bare integers, sets and maps are opaque
//! containers. Application code wants named records, symbolic enums and
//! ordinary collections. This crate bridges the two, driven entirely by a
//! schema:
//!
//! - **Extraction** of every struct reachable from a set of roots
//! - **Enum reification** with forward-compatible unresolved values
//! - **Default synthesis** for zero-argument record construction
//! - **Type overrides** for what the schema cannot say ("this i32 is an enum")
//! - **Callback hooks** that post-process fully converted structs
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌───────────┐    ┌────────────────────┐
//! │ SchemaOracle │───▶│ Extractor │───▶│ Overrides/Defaults │
//! └──────────────┘    └───────────┘    └─────────┬──────────┘
//!                                                ▼
//!        WireValue ◀──────────────▶ ┌──────────────────────────┐
//!                                   │ Bridge (Converter table) │
//!      NativeValue ◀──────────────▶ └──────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schema_bridge::prelude::*;
//!
//! let oracle = StaticOracle::new().with_struct(
//!     "NeedsFixup",
//!     vec![
//!         RawField::new(1, "name", RawType::name("string")),
//!         RawField::new(2, "time", RawType::name("i32")),
//!     ],
//! );
//!
//! let bridge = BridgeBuilder::new(&oracle)
//!     .root_struct("NeedsFixup")
//!     .enumeration(
//!         EnumDescriptor::new("TimePeriod")
//!             .value("day", 1)
//!             .value("week", 2)
//!             .value("month", 3),
//!     )
//!     .struct_override("NeedsFixup", "time", TypeSpec::enum_ref("TimePeriod"))
//!     .build()?;
//!
//! let wire = WireValue::tuple("NeedsFixup", vec!["Foo".into(), 2.into()]);
//! let native = bridge.struct_to_native("NeedsFixup", &wire)?;
//! ```
//!
//! A [`Bridge`] is immutable after [`BridgeBuilder::build`] and can be
//! shared across threads behind an `Arc`.

pub mod bridge;
pub mod callback;
pub mod config;
pub mod convert;
pub mod defaults;
pub mod document;
pub mod enums;
pub mod error;
pub mod extract;
pub mod json;
pub mod overrides;
pub mod schema;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;

// Public API
pub use bridge::{Bridge, BridgeBuilder, CompiledFunction};
pub use callback::{Callback, CallbackChain, CallbackRegistry, Direction, Guard};
pub use config::{BridgeConfig, NamespaceMap};
pub use convert::{CompiledStruct, Converter};
pub use defaults::DefaultSynthesizer;
pub use document::{DocumentError, SchemaDocument};
pub use enums::{EnumDescriptor, EnumRegistry, EnumSymbol, EnumValue};
pub use error::{BuildError, BuildResult, ConversionError, ConversionResult, ErrorCode, ValuePath};
pub use extract::{ExtractedSchema, Extractor, Root};
pub use json::{native_from_json, wire_from_json, NoStructs, StructLookup};
pub use overrides::{OverrideResolver, OverrideSpec};
pub use schema::{
    FieldDescriptor, FunctionDescriptor, RawField, RawFunction, SchemaOracle, StaticOracle,
    StructDescriptor,
};
pub use types::{normalize, qualify, PrimitiveKind, RawCompound, RawType, TypeSpec};
pub use value::{NativeRecord, NativeValue, WireMap, WireSet, WireStruct, WireValue};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use schema_bridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Building
        Bridge,
        BridgeBuilder,
        BridgeConfig,
        // Errors
        BuildError,
        BuildResult,
        ConversionError,
        ConversionResult,
        // Enums
        EnumDescriptor,
        EnumRegistry,
        EnumValue,
        // Callbacks
        Guard,
        // Values
        NativeRecord,
        NativeValue,
        OverrideSpec,
        // Schema
        RawField,
        RawFunction,
        RawType,
        SchemaDocument,
        SchemaOracle,
        StaticOracle,
        TypeSpec,
        WireValue,
    };
}
