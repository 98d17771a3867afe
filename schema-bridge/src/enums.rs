//! Enum tables and symbolic enum values.
//!
//! On the wire an enum is indistinguishable from an integer. The registry
//! holds, per enum, the declared `(symbol, value)` pairs in declaration order
//! and resolves in both directions.
//!
//! Reverse lookup never fails for a registered enum: an integer the table
//! does not declare yields an [`EnumValue`] whose symbol is
//! [`EnumSymbol::Unresolved`]. Producers may be running a newer schema, and
//! rejecting their values would break forward compatibility.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

use crate::error::{BuildError, BuildResult, ConversionError, ValuePath};

/// Declared table of one enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    /// Enum name
    pub name: String,
    /// `(symbol, value)` pairs in declaration order
    pub pairs: Vec<(String, i64)>,
}

impl EnumDescriptor {
    /// An enum with no values yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pairs: Vec::new(),
        }
    }

    /// Declare a symbol.
    #[must_use = "This method returns a new EnumDescriptor and does not modify self"]
    pub fn value(mut self, symbol: impl Into<String>, value: i64) -> Self {
        self.pairs.push((symbol.into(), value));
        self
    }
}

/// Symbol half of an [`EnumValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumSymbol {
    /// The value matches a declared symbol
    Resolved(String),
    /// The value is not declared by this schema version
    Unresolved,
}

/// A symbolic enum value: `{symbol, value}` tagged with its enum name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumValue {
    name: String,
    value: i64,
    symbol: EnumSymbol,
}

impl EnumValue {
    /// Enum name.
    pub fn enum_name(&self) -> &str {
        &self.name
    }

    /// Integer value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Symbol, or `None` when unresolved.
    pub fn symbol(&self) -> Option<&str> {
        match &self.symbol {
            EnumSymbol::Resolved(symbol) => Some(symbol),
            EnumSymbol::Unresolved => None,
        }
    }

    /// The raw symbol half.
    pub fn enum_symbol(&self) -> &EnumSymbol {
        &self.symbol
    }

    /// Whether the value matched a declared symbol.
    pub fn is_resolved(&self) -> bool {
        matches!(self.symbol, EnumSymbol::Resolved(_))
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            EnumSymbol::Resolved(symbol) => write!(f, "{}::{}", self.name, symbol),
            EnumSymbol::Unresolved => write!(f, "{}::<unresolved {}>", self.name, self.value),
        }
    }
}

#[derive(Debug, Clone)]
struct EnumTable {
    descriptor: EnumDescriptor,
    by_symbol: HashMap<String, i64>,
    by_value: HashMap<i64, String>,
}

impl EnumTable {
    fn build(descriptor: EnumDescriptor) -> BuildResult<Self> {
        let mut by_symbol = HashMap::with_capacity(descriptor.pairs.len());
        let mut by_value = HashMap::with_capacity(descriptor.pairs.len());
        for (symbol, value) in &descriptor.pairs {
            if by_symbol.insert(symbol.clone(), *value).is_some() {
                return Err(BuildError::DuplicateEnumSymbol {
                    enum_name: descriptor.name.clone(),
                    symbol: symbol.clone(),
                });
            }
            // Aliased values resolve to the first declared symbol.
            by_value.entry(*value).or_insert_with(|| symbol.clone());
        }
        Ok(Self {
            descriptor,
            by_symbol,
            by_value,
        })
    }
}

/// Registry of enum tables, keyed by enum name.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    tables: HashMap<String, EnumTable>,
    namespace: Option<String>,
}

impl EnumRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry that also resolves bare names inside `namespace`.
    pub fn with_namespace(namespace: Option<String>) -> Self {
        Self {
            tables: HashMap::new(),
            namespace,
        }
    }

    /// Register an enum. Re-registering a name replaces the earlier table.
    pub fn register(&mut self, descriptor: EnumDescriptor) -> BuildResult<()> {
        trace!(enum_name = %descriptor.name, values = descriptor.pairs.len(), "Registering enum");
        let table = EnumTable::build(descriptor)?;
        self.tables.insert(table.descriptor.name.clone(), table);
        Ok(())
    }

    fn table(&self, name: &str) -> Option<&EnumTable> {
        self.tables.get(name).or_else(|| {
            let ns = self.namespace.as_deref()?;
            self.tables.get(&format!("{ns}.{name}"))
        })
    }

    /// Whether an enum is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Registered enum names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The declared table of an enum.
    pub fn descriptor(&self, name: &str) -> Option<&EnumDescriptor> {
        self.table(name).map(|table| &table.descriptor)
    }

    /// Forward lookup: symbol to value.
    ///
    /// A symbol the enum does not declare is a programming error in the
    /// calling code, never a wire condition, and fails hard.
    pub fn by_symbol(&self, name: &str, symbol: &str) -> BuildResult<EnumValue> {
        let table = self
            .table(name)
            .ok_or_else(|| BuildError::lookup("enum", name, "symbol lookup"))?;
        let value = table
            .by_symbol
            .get(symbol)
            .copied()
            .ok_or_else(|| BuildError::UnknownEnumSymbol {
                enum_name: table.descriptor.name.clone(),
                symbol: symbol.to_string(),
            })?;
        // An alias yields the canonical (first declared) symbol of its value.
        let canonical = table.by_value.get(&value).map_or(symbol, String::as_str);
        Ok(EnumValue {
            name: table.descriptor.name.clone(),
            value,
            symbol: EnumSymbol::Resolved(canonical.to_string()),
        })
    }

    /// Reverse lookup: value to symbol.
    ///
    /// Fails only when the enum itself is not registered. Any integer,
    /// negative or out of any declared range, produces a value.
    pub fn by_value(&self, name: &str, value: i64) -> BuildResult<EnumValue> {
        let table = self
            .table(name)
            .ok_or_else(|| BuildError::lookup("enum", name, "value lookup"))?;
        Ok(Self::resolve(table, value))
    }

    fn resolve(table: &EnumTable, value: i64) -> EnumValue {
        let symbol = match table.by_value.get(&value) {
            Some(symbol) => EnumSymbol::Resolved(symbol.clone()),
            None => {
                debug!(enum_name = %table.descriptor.name, value, "Unresolved enum value");
                EnumSymbol::Unresolved
            }
        };
        EnumValue {
            name: table.descriptor.name.clone(),
            value,
            symbol,
        }
    }

    /// Symbols in declaration order.
    pub fn ordinals(&self, name: &str) -> Option<Vec<&str>> {
        self.descriptor(name)
            .map(|d| d.pairs.iter().map(|(symbol, _)| symbol.as_str()).collect())
    }

    /// Values in declaration order.
    pub fn values(&self, name: &str) -> Option<Vec<i64>> {
        self.descriptor(name)
            .map(|d| d.pairs.iter().map(|(_, value)| *value).collect())
    }

    /// `(symbol, value)` pairs in declaration order.
    pub fn mappings(&self, name: &str) -> Option<Vec<(&str, i64)>> {
        self.descriptor(name).map(|d| {
            d.pairs
                .iter()
                .map(|(symbol, value)| (symbol.as_str(), *value))
                .collect()
        })
    }

    // -------------------------------------------------------------------------
    // Leaf dispatch used by the conversion engine
    // -------------------------------------------------------------------------

    pub(crate) fn to_native(&self, name: &str, value: i64) -> Result<EnumValue, ConversionError> {
        let table = self.table(name).ok_or_else(|| ConversionError::UnknownEnum {
            name: name.to_string(),
            path: ValuePath::root(),
        })?;
        Ok(Self::resolve(table, value))
    }

    pub(crate) fn symbol_to_value(&self, name: &str, symbol: &str) -> Result<i64, ConversionError> {
        let table = self.table(name).ok_or_else(|| ConversionError::UnknownEnum {
            name: name.to_string(),
            path: ValuePath::root(),
        })?;
        table
            .by_symbol
            .get(symbol)
            .copied()
            .ok_or_else(|| ConversionError::UnknownEnumSymbol {
                enum_name: table.descriptor.name.clone(),
                symbol: symbol.to_string(),
                path: ValuePath::root(),
            })
    }

    /// Whether `value` belongs to the enum `name`.
    pub(crate) fn same_enum(&self, name: &str, value: &EnumValue) -> bool {
        self.table(name)
            .is_some_and(|table| table.descriptor.name == value.name)
    }
}
