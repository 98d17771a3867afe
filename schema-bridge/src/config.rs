//! Bridge configuration.
//!
//! This module provides [`BridgeConfig`], which controls naming only:
//! namespaces never change how a value converts.
//!
//! # Example
//! ```rust,ignore
//! use schema_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_schema_namespace("models")
//!     .with_target_namespace("app.models")
//!     .with_debug_logging(true);
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BuildError, BuildResult};

/// Bridge configuration.
///
/// # Fields
///
/// * `schema_namespace` - Namespace used to qualify bare struct, enum and
///   function names when they are looked up in the schema. Default: none.
///
/// * `target_namespace` - Namespace of native record type names. A struct
///   `models.User` under schema namespace `models` and target namespace
///   `app` produces records named `app.User`. Default: none.
///
/// * `debug_logging` - Emit a `debug` event for every struct converted.
///   Default: false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Schema namespace for bare names (default: none)
    pub schema_namespace: Option<String>,
    /// Native type namespace (default: none)
    pub target_namespace: Option<String>,
    /// Per-conversion debug events (default: false)
    pub debug_logging: bool,
}

impl BridgeConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema namespace.
    ///
    /// # Example
    /// ```rust,ignore
    /// let config = BridgeConfig::new().with_schema_namespace("models");
    /// ```
    pub fn with_schema_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.schema_namespace = Some(namespace.into());
        self
    }

    /// Set the native type namespace.
    pub fn with_target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// Enable or disable per-conversion debug events.
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Check that both namespaces are dotted identifiers.
    pub fn validate(&self) -> BuildResult<()> {
        let pattern = Regex::new(NAMESPACE_PATTERN)
            .map_err(|e| BuildError::Config(format!("namespace pattern: {e}")))?;
        for (label, namespace) in [
            ("schema_namespace", &self.schema_namespace),
            ("target_namespace", &self.target_namespace),
        ] {
            if let Some(ns) = namespace {
                if !pattern.is_match(ns) {
                    warn!(field = label, namespace = %ns, "Invalid namespace in configuration");
                    return Err(BuildError::Config(format!(
                        "{label} '{ns}' is not a dotted identifier"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Naming view of this configuration.
    pub fn namespaces(&self) -> NamespaceMap {
        NamespaceMap {
            schema: self.schema_namespace.clone(),
            target: self.target_namespace.clone(),
        }
    }
}

const NAMESPACE_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

/// Maps schema names to native type names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    schema: Option<String>,
    target: Option<String>,
}

impl NamespaceMap {
    /// Qualify a bare schema name.
    pub fn qualify(&self, name: &str) -> String {
        crate::types::qualify(name, self.schema.as_deref())
    }

    /// Native type name for a struct tag.
    pub fn native_name(&self, tag: &str) -> String {
        let local = self
            .schema
            .as_deref()
            .and_then(|ns| tag.strip_prefix(ns))
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(tag);
        match &self.target {
            Some(target) => format!("{target}.{local}"),
            None => local.to_string(),
        }
    }
}
