//! Post-conversion callback hooks.
//!
//! A callback is a `(guard, transform)` pair registered for one struct and
//! one direction. After a struct has been fully converted, its chain is
//! evaluated in registration order: the first guard that accepts the value
//! runs its transform, and the transform's output is what the caller
//! receives. When no guard matches the value is returned unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! let callbacks = CallbackRegistry::new()
//!     .on_to_native(
//!         "NeedsFixup",
//!         Guard::field_eq("name", NativeValue::text("Foo")),
//!         |value| value,
//!     );
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::error::{BuildError, BuildResult};
use crate::extract::ExtractedSchema;
use crate::types::qualify;
use crate::value::{NativeValue, WireValue};

/// Conversion direction a callback is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Wire to native
    ToNative,
    /// Native to wire
    ToWire,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToNative => write!(f, "to_native"),
            Self::ToWire => write!(f, "to_wire"),
        }
    }
}

/// Guard predicate type
pub type GuardFn<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// Transform function type
pub type TransformFn<V> = Arc<dyn Fn(V) -> V + Send + Sync>;

/// Structural predicate deciding whether a callback applies.
pub struct Guard<V>(GuardFn<V>);

impl<V> Clone for Guard<V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<V> fmt::Debug for Guard<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}

impl<V: 'static> Guard<V> {
    /// Matches every value.
    pub fn always() -> Self {
        Self(Arc::new(|_| true))
    }

    /// Arbitrary predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluate the guard.
    pub fn matches(&self, value: &V) -> bool {
        (self.0)(value)
    }
}

impl Guard<NativeValue> {
    /// Matches records whose `field` equals `expected`.
    pub fn field_eq(field: impl Into<String>, expected: NativeValue) -> Self {
        let field = field.into();
        Self::new(move |value: &NativeValue| {
            value
                .as_record()
                .and_then(|record| record.get(&field))
                .is_some_and(|actual| *actual == expected)
        })
    }

    /// Matches records whose text `field` matches `pattern`.
    pub fn field_matches(field: impl Into<String>, pattern: &str) -> BuildResult<Self> {
        let regex = compile(pattern)?;
        let field = field.into();
        Ok(Self::new(move |value: &NativeValue| {
            value
                .as_record()
                .and_then(|record| record.get(&field))
                .and_then(NativeValue::as_text)
                .is_some_and(|text| regex.is_match(text))
        }))
    }
}

impl Guard<WireValue> {
    /// Matches wire structs whose tag matches `pattern`.
    pub fn tag_matches(pattern: &str) -> BuildResult<Self> {
        let regex = compile(pattern)?;
        Ok(Self::new(move |value: &WireValue| match value {
            WireValue::Struct(st) => regex.is_match(&st.tag),
            _ => false,
        }))
    }

    /// Matches wire structs whose value at `position` equals `expected`.
    pub fn field_at_eq(position: usize, expected: WireValue) -> Self {
        Self::new(move |value: &WireValue| match value {
            WireValue::Struct(st) => st.fields.get(position) == Some(&expected),
            _ => false,
        })
    }
}

fn compile(pattern: &str) -> BuildResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        warn!(pattern = %pattern, error = %e, "Invalid guard pattern");
        BuildError::InvalidGuard {
            pattern: pattern.to_string(),
            message: e.to_string(),
        }
    })
}

/// A guarded transform.
pub struct Callback<V> {
    guard: Guard<V>,
    transform: TransformFn<V>,
}

impl<V> Clone for Callback<V> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            transform: Arc::clone(&self.transform),
        }
    }
}

impl<V: 'static> Callback<V> {
    pub fn new<F>(guard: Guard<V>, transform: F) -> Self
    where
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        Self {
            guard,
            transform: Arc::new(transform),
        }
    }
}

/// Ordered callbacks for one struct and direction.
pub struct CallbackChain<V> {
    callbacks: Vec<Callback<V>>,
}

impl<V> Default for CallbackChain<V> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<V> Clone for CallbackChain<V> {
    fn clone(&self) -> Self {
        Self {
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<V> fmt::Debug for CallbackChain<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

impl<V: 'static> CallbackChain<V> {
    /// Append a callback; it is tried after every earlier one.
    pub fn push(&mut self, callback: Callback<V>) {
        self.callbacks.push(callback);
    }

    /// Number of callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run the first matching transform, or return `value` unchanged.
    pub fn apply(&self, value: V) -> V {
        match self.callbacks.iter().find(|cb| cb.guard.matches(&value)) {
            Some(callback) => (callback.transform)(value),
            None => value,
        }
    }
}

/// Callbacks for every struct, keyed by struct name.
#[derive(Debug, Clone, Default)]
pub struct CallbackRegistry {
    to_native: HashMap<String, CallbackChain<NativeValue>>,
    to_wire: HashMap<String, CallbackChain<WireValue>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wire-to-native callback for `struct_name`.
    #[must_use]
    pub fn on_to_native<F>(mut self, struct_name: impl Into<String>, guard: Guard<NativeValue>, transform: F) -> Self
    where
        F: Fn(NativeValue) -> NativeValue + Send + Sync + 'static,
    {
        self.add_to_native(struct_name, Callback::new(guard, transform));
        self
    }

    /// Register a native-to-wire callback for `struct_name`.
    #[must_use]
    pub fn on_to_wire<F>(mut self, struct_name: impl Into<String>, guard: Guard<WireValue>, transform: F) -> Self
    where
        F: Fn(WireValue) -> WireValue + Send + Sync + 'static,
    {
        self.add_to_wire(struct_name, Callback::new(guard, transform));
        self
    }

    pub fn add_to_native(&mut self, struct_name: impl Into<String>, callback: Callback<NativeValue>) {
        let struct_name = struct_name.into();
        trace!(struct_name = %struct_name, direction = %Direction::ToNative, "Adding callback");
        self.to_native.entry(struct_name).or_default().push(callback);
    }

    pub fn add_to_wire(&mut self, struct_name: impl Into<String>, callback: Callback<WireValue>) {
        let struct_name = struct_name.into();
        trace!(struct_name = %struct_name, direction = %Direction::ToWire, "Adding callback");
        self.to_wire.entry(struct_name).or_default().push(callback);
    }

    /// Chain for a struct in the wire-to-native direction.
    pub fn to_native_chain(&self, struct_name: &str) -> Option<&CallbackChain<NativeValue>> {
        self.to_native.get(struct_name)
    }

    /// Chain for a struct in the native-to-wire direction.
    pub fn to_wire_chain(&self, struct_name: &str) -> Option<&CallbackChain<WireValue>> {
        self.to_wire.get(struct_name)
    }

    /// Number of callbacks registered for a struct in a direction.
    pub fn count(&self, struct_name: &str, direction: Direction) -> usize {
        match direction {
            Direction::ToNative => self.to_native.get(struct_name).map_or(0, CallbackChain::len),
            Direction::ToWire => self.to_wire.get(struct_name).map_or(0, CallbackChain::len),
        }
    }

    pub(crate) fn qualified(self, namespace: Option<&str>) -> Self {
        Self {
            to_native: merge_qualified(self.to_native, namespace),
            to_wire: merge_qualified(self.to_wire, namespace),
        }
    }

    /// Every callback must target a struct of the extracted schema.
    pub fn validate(&self, schema: &ExtractedSchema) -> BuildResult<()> {
        let targets = self
            .to_native
            .keys()
            .map(|name| (name, Direction::ToNative))
            .chain(self.to_wire.keys().map(|name| (name, Direction::ToWire)));
        for (name, direction) in targets {
            if !schema.structs.contains_key(name) {
                warn!(struct_name = %name, direction = %direction, "Callback targets unknown struct");
                return Err(BuildError::conflict(
                    name.as_str(),
                    format!("{direction} callback registered for a struct outside the schema"),
                ));
            }
        }
        Ok(())
    }
}

// Registration order is kept within a key. If a bare and a qualified name
// collide, the relative order of their two chains is unspecified.
fn merge_qualified<V>(
    chains: HashMap<String, CallbackChain<V>>,
    namespace: Option<&str>,
) -> HashMap<String, CallbackChain<V>> {
    let mut out: HashMap<String, CallbackChain<V>> = HashMap::with_capacity(chains.len());
    for (name, chain) in chains {
        let entry = out.entry(qualify(&name, namespace)).or_default();
        entry.callbacks.extend(chain.callbacks);
    }
    out
}
