//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `schema-bridge.toml`
//! files and merging with command-line arguments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use schema_bridge::BridgeConfig;

use crate::error::{CliResult, ConfigError};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "schema-bridge.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema document location.
    pub schema: SchemaConfig,

    /// Bridge naming and logging.
    pub bridge: BridgeConfig,

    /// Output formatting.
    pub output: OutputConfig,
}

/// Schema document configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Path of the JSON schema document.
    pub path: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    /// The schema document path, or an error when none is configured.
    pub fn schema_path(&self) -> CliResult<&Path> {
        self.schema
            .path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSchema.into())
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path.clone(), e.to_string()))?;

        debug!(path = %config_path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref schema) = args.schema {
            config.schema.path = Some(schema.clone());
        }

        if let Some(ref namespace) = args.target_namespace {
            config.bridge.target_namespace = Some(namespace.clone());
        }

        if let Some(debug_logging) = args.debug_logging {
            config.bridge.debug_logging = debug_logging;
        }

        if let Some(pretty) = args.pretty {
            config.output.pretty = pretty;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# schema-bridge configuration file

[schema]
# JSON schema document describing structs, functions, enums and overrides
path = "schema.json"

[bridge]
# Namespace used to qualify bare names (defaults to the document namespace)
# schema_namespace = "models"

# Namespace of native record type names
# target_namespace = "app"

# Emit a debug event for every converted struct
debug_logging = false

[output]
# Pretty-print JSON output
pretty = true
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Schema document override.
    pub schema: Option<PathBuf>,

    /// Native type namespace override.
    pub target_namespace: Option<String>,

    /// Debug logging override.
    pub debug_logging: Option<bool>,

    /// Pretty output override.
    pub pretty: Option<bool>,
}
