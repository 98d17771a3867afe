//! Bridge builder and the compiled bridge.
//!
//! [`BridgeBuilder::build`] runs the whole pipeline in one pass:
//!
//! 1. extract every struct reachable from the roots (and from overrides)
//! 2. normalize and qualify all names
//! 3. resolve overrides into effective field/argument/return types
//! 4. synthesize native defaults
//! 5. compile the conversion table
//! 6. attach callbacks
//!
//! Any failure aborts the build. The resulting [`Bridge`] is immutable and
//! `Send + Sync`; share it behind an `Arc` and call it from any thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use schema_bridge::prelude::*;
//!
//! let bridge = BridgeBuilder::new(&oracle)
//!     .root_struct("NeedsFixup")
//!     .enumeration(EnumDescriptor::new("TimePeriod").value("day", 1).value("week", 2))
//!     .struct_override("NeedsFixup", "time", TypeSpec::enum_ref("TimePeriod"))
//!     .build()?;
//!
//! let native = bridge.struct_to_native("NeedsFixup", &wire)?;
//! ```

use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, info, trace, warn};

use crate::callback::{Callback, CallbackRegistry, Guard};
use crate::config::BridgeConfig;
use crate::convert::{CompiledStruct, Converter};
use crate::defaults::DefaultSynthesizer;
use crate::enums::{EnumDescriptor, EnumRegistry};
use crate::error::{BuildError, BuildResult, ConversionError, ConversionResult};
use crate::extract::{ExtractedSchema, Extractor, Root};
use crate::overrides::{OverrideResolver, OverrideSpec};
use crate::schema::{FunctionDescriptor, SchemaOracle, StructDescriptor};
use crate::types::{qualify, TypeSpec};
use crate::value::{NativeRecord, NativeValue, WireValue};

// =============================================================================
// Builder
// =============================================================================

/// Collects roots, enums, overrides and callbacks, then builds a [`Bridge`].
#[must_use = "Builders do nothing unless .build() is called"]
pub struct BridgeBuilder<'a> {
    oracle: &'a dyn SchemaOracle,
    config: BridgeConfig,
    roots: Vec<Root>,
    enums: Vec<EnumDescriptor>,
    field_overrides: Vec<(String, String, TypeSpec)>,
    function_overrides: Vec<(String, OverrideSpec)>,
    callbacks: CallbackRegistry,
}

impl<'a> BridgeBuilder<'a> {
    /// Start a builder over `oracle`.
    pub fn new(oracle: &'a dyn SchemaOracle) -> Self {
        Self {
            oracle,
            config: BridgeConfig::default(),
            roots: Vec::new(),
            enums: Vec::new(),
            field_overrides: Vec::new(),
            function_overrides: Vec::new(),
            callbacks: CallbackRegistry::new(),
        }
    }

    /// Replace the configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a root struct.
    pub fn root_struct(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        trace!(struct_name = %name, "Adding root struct");
        self.roots.push(Root::Struct(name));
        self
    }

    /// Add a root function.
    pub fn root_function(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        trace!(function = %name, "Adding root function");
        self.roots.push(Root::Function(name));
        self
    }

    /// Register an enum table.
    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Self {
        self.enums.push(descriptor);
        self
    }

    /// Override the type of a struct field.
    pub fn struct_override(mut self, struct_name: impl Into<String>, field: impl Into<String>, spec: TypeSpec) -> Self {
        self.field_overrides.push((struct_name.into(), field.into(), spec));
        self
    }

    /// Override argument and/or return types of a function.
    pub fn function_override(mut self, function: impl Into<String>, spec: OverrideSpec) -> Self {
        self.function_overrides.push((function.into(), spec));
        self
    }

    /// Register a wire-to-native callback.
    pub fn on_to_native<F>(mut self, struct_name: impl Into<String>, guard: Guard<NativeValue>, transform: F) -> Self
    where
        F: Fn(NativeValue) -> NativeValue + Send + Sync + 'static,
    {
        self.callbacks.add_to_native(struct_name, Callback::new(guard, transform));
        self
    }

    /// Register a native-to-wire callback.
    pub fn on_to_wire<F>(mut self, struct_name: impl Into<String>, guard: Guard<WireValue>, transform: F) -> Self
    where
        F: Fn(WireValue) -> WireValue + Send + Sync + 'static,
    {
        self.callbacks.add_to_wire(struct_name, Callback::new(guard, transform));
        self
    }

    /// Replace the callback registry wholesale.
    pub fn callbacks(mut self, callbacks: CallbackRegistry) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Run the build pipeline.
    pub fn build(self) -> BuildResult<Bridge> {
        self.config.validate()?;
        let namespace = self.config.schema_namespace.as_deref();

        let mut overrides = OverrideResolver::new();
        for (struct_name, field, spec) in self.field_overrides {
            overrides.add_field(struct_name, field, spec)?;
        }
        for (function, spec) in self.function_overrides {
            overrides.add_function(function, spec)?;
        }
        let overrides = overrides.qualified(namespace);

        // Structs mentioned only by an override still need descriptors.
        let mut roots = self.roots;
        let override_structs: BTreeSet<String> = overrides
            .specs()
            .flat_map(|spec| spec.struct_refs().map(str::to_string).collect::<Vec<_>>())
            .collect();
        roots.extend(override_structs.into_iter().map(Root::Struct));

        let schema = Extractor::new(self.oracle)
            .with_namespace(namespace)
            .extract(&roots)?;

        let mut enums = EnumRegistry::with_namespace(self.config.schema_namespace.clone());
        for mut descriptor in self.enums {
            descriptor.name = qualify(&descriptor.name, namespace);
            enums.register(descriptor)?;
        }

        overrides.validate(&schema)?;
        check_enum_refs(&schema, &overrides, &enums)?;

        let names = self.config.namespaces();
        let structs: IndexMap<String, CompiledStruct> = schema
            .structs
            .values()
            .map(|descriptor| {
                let specs = descriptor
                    .fields
                    .iter()
                    .map(|field| overrides.resolve_field(&descriptor.name, field))
                    .collect();
                let compiled = CompiledStruct::new(descriptor.clone(), specs, names.native_name(&descriptor.name));
                (descriptor.name.clone(), compiled)
            })
            .collect();
        let functions: IndexMap<String, CompiledFunction> = schema
            .functions
            .values()
            .map(|descriptor| {
                let args = descriptor
                    .params
                    .iter()
                    .enumerate()
                    .map(|(pos, param)| overrides.resolve_arg(&descriptor.name, pos, Some(param)))
                    .collect();
                let reply = overrides.resolve_return(&descriptor.name, Some(&descriptor.reply));
                let compiled = CompiledFunction {
                    descriptor: descriptor.clone(),
                    args,
                    reply,
                };
                (descriptor.name.clone(), compiled)
            })
            .collect();

        let mut converter = Converter::new(structs, enums, self.config.schema_namespace.clone());
        let mut defaults = Vec::new();
        {
            let synthesizer = DefaultSynthesizer::new(&converter);
            for compiled in converter.structs() {
                defaults.push((compiled.name().to_string(), synthesizer.synthesize(compiled)?));
            }
        }
        for (name, values) in defaults {
            converter.set_defaults(&name, values);
        }

        let callbacks = self.callbacks.qualified(namespace);
        callbacks.validate(&schema)?;
        converter.attach_callbacks(callbacks);
        converter.set_debug_logging(self.config.debug_logging);

        info!(
            structs = schema.structs.len(),
            functions = functions.len(),
            enums = converter.enums().names().len(),
            "Bridge built"
        );

        Ok(Bridge {
            config: self.config,
            converter,
            functions,
        })
    }
}

fn check_enum_refs(schema: &ExtractedSchema, overrides: &OverrideResolver, enums: &EnumRegistry) -> BuildResult<()> {
    let schema_refs = schema.enum_refs.iter().map(|name| (name.as_str(), "schema"));
    let override_refs = overrides
        .specs()
        .flat_map(|spec| spec.enum_refs().collect::<Vec<_>>())
        .map(|name| (name, "override"));
    for (name, referrer) in schema_refs.chain(override_refs) {
        if !enums.contains(name) {
            warn!(enum_name = %name, referrer, "Referenced enum is not registered");
            return Err(BuildError::lookup("enum", name, referrer));
        }
    }
    debug!(enums = enums.names().len(), "Enum references resolved");
    Ok(())
}

// =============================================================================
// Bridge
// =============================================================================

/// Function signature with effective argument and reply types.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub descriptor: FunctionDescriptor,
    /// Effective argument types, by position
    pub args: Vec<TypeSpec>,
    /// Effective reply type
    pub reply: TypeSpec,
}

/// The compiled, immutable conversion table.
#[derive(Debug, Clone)]
pub struct Bridge {
    config: BridgeConfig,
    converter: Converter,
    functions: IndexMap<String, CompiledFunction>,
}

impl Bridge {
    /// Configuration the bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The enum registry.
    pub fn enums(&self) -> &EnumRegistry {
        self.converter.enums()
    }

    /// The conversion table.
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Qualified names of all compiled structs, in discovery order.
    pub fn struct_names(&self) -> Vec<&str> {
        self.converter.structs().map(CompiledStruct::name).collect()
    }

    /// Compiled struct by qualified, bare or native name.
    pub fn compiled_struct(&self, name: &str) -> Option<&CompiledStruct> {
        self.converter.compiled(name)
    }

    /// Descriptor of a struct.
    pub fn struct_descriptor(&self, name: &str) -> Option<&StructDescriptor> {
        self.compiled_struct(name).map(|compiled| &compiled.descriptor)
    }

    /// Native type name used for records of a struct.
    pub fn native_type_name(&self, name: &str) -> Option<&str> {
        self.compiled_struct(name)
            .map(|compiled| compiled.native_name.as_str())
    }

    /// Effective (override-aware) type of a struct field.
    pub fn field_spec(&self, struct_name: &str, field: &str) -> Option<&TypeSpec> {
        let compiled = self.compiled_struct(struct_name)?;
        let position = compiled.descriptor.position(field)?;
        compiled.specs.get(position)
    }

    /// Qualified names of all compiled functions.
    pub fn function_names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    /// Compiled function by qualified or bare name.
    pub fn function(&self, name: &str) -> Option<&CompiledFunction> {
        self.functions
            .get(name)
            .or_else(|| self.functions.get(&qualify(name, self.config.schema_namespace.as_deref())))
    }

    fn require_function(&self, name: &str) -> ConversionResult<&CompiledFunction> {
        self.function(name)
            .ok_or_else(|| ConversionError::UnknownFunction { name: name.to_string() })
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    /// A record of struct `name` holding every synthesized default.
    pub fn new_record(&self, name: &str) -> ConversionResult<NativeRecord> {
        self.compiled_struct(name)
            .map(CompiledStruct::default_record)
            .ok_or_else(|| ConversionError::unknown_struct(name))
    }

    /// A record of struct `name` with the given fields; every other field
    /// keeps its default.
    pub fn record<I, K>(&self, name: &str, fields: I) -> ConversionResult<NativeRecord>
    where
        I: IntoIterator<Item = (K, NativeValue)>,
        K: Into<String>,
    {
        let compiled = self
            .compiled_struct(name)
            .ok_or_else(|| ConversionError::unknown_struct(name))?;
        let mut record = compiled.default_record();
        for (field, value) in fields {
            let field = field.into();
            match record.get_mut(&field) {
                Some(slot) => *slot = value,
                None => return Err(ConversionError::unknown_field(&compiled.descriptor.name, field)),
            }
        }
        Ok(record)
    }

    // -------------------------------------------------------------------------
    // Conversion
    // -------------------------------------------------------------------------

    /// Convert a wire value by type.
    pub fn to_native(&self, wire: &WireValue, spec: &TypeSpec) -> ConversionResult<NativeValue> {
        self.converter.to_native(wire, spec)
    }

    /// Convert a native value by type.
    pub fn to_wire(&self, native: &NativeValue, spec: &TypeSpec) -> ConversionResult<WireValue> {
        self.converter.to_wire(native, spec)
    }

    /// Convert a wire tuple as struct `name`.
    pub fn struct_to_native(&self, name: &str, wire: &WireValue) -> ConversionResult<NativeValue> {
        match wire {
            WireValue::Struct(st) => self
                .converter
                .struct_to_native(name, st)
                .map_err(|e| e.at(name)),
            other => Err(ConversionError::mismatch(format!("struct {name}"), other.kind_name())),
        }
    }

    /// Convert a native record as struct `name`.
    pub fn struct_to_wire(&self, name: &str, record: &NativeRecord) -> ConversionResult<WireValue> {
        self.converter
            .struct_to_wire(name, record)
            .map_err(|e| e.at(name))
    }

    // -------------------------------------------------------------------------
    // Function adapters
    // -------------------------------------------------------------------------

    /// Effective type of argument `position` (0-based).
    pub fn arg_spec(&self, function: &str, position: usize) -> Option<&TypeSpec> {
        self.function(function)?.args.get(position)
    }

    /// Effective reply type.
    pub fn reply_spec(&self, function: &str) -> Option<&TypeSpec> {
        self.function(function).map(|f| &f.reply)
    }

    /// Incoming call, server side: wire arguments to native.
    pub fn args_to_native(&self, function: &str, args: &[WireValue]) -> ConversionResult<Vec<NativeValue>> {
        let compiled = self.require_function(function)?;
        check_arity(compiled, args.len())?;
        args.iter()
            .zip(&compiled.args)
            .zip(&compiled.descriptor.params)
            .map(|((arg, spec), param)| {
                self.converter
                    .to_native(arg, spec)
                    .map_err(|e| e.at(format!("{}({})", function, param.name)))
            })
            .collect()
    }

    /// Outgoing reply, server side: native reply to wire.
    pub fn reply_to_wire(&self, function: &str, reply: &NativeValue) -> ConversionResult<WireValue> {
        let compiled = self.require_function(function)?;
        self.converter
            .to_wire(reply, &compiled.reply)
            .map_err(|e| e.at(format!("{function}()")))
    }

    /// Outgoing call, client side: native arguments to wire.
    pub fn args_to_wire(&self, function: &str, args: &[NativeValue]) -> ConversionResult<Vec<WireValue>> {
        let compiled = self.require_function(function)?;
        check_arity(compiled, args.len())?;
        args.iter()
            .zip(&compiled.args)
            .zip(&compiled.descriptor.params)
            .map(|((arg, spec), param)| {
                self.converter
                    .to_wire(arg, spec)
                    .map_err(|e| e.at(format!("{}({})", function, param.name)))
            })
            .collect()
    }

    /// Incoming reply, client side: wire reply to native.
    pub fn reply_to_native(&self, function: &str, reply: &WireValue) -> ConversionResult<NativeValue> {
        let compiled = self.require_function(function)?;
        self.converter
            .to_native(reply, &compiled.reply)
            .map_err(|e| e.at(format!("{function}()")))
    }
}

fn check_arity(function: &CompiledFunction, found: usize) -> ConversionResult<()> {
    if function.args.len() != found {
        return Err(ConversionError::ArityMismatch {
            target: function.descriptor.name.clone(),
            expected: function.args.len(),
            found,
            path: Default::default(),
        });
    }
    Ok(())
}
