//! Error types for the CLI.
//!
//! This module wraps library errors and adds the failures that only exist
//! at the command line: configuration files, input files and type
//! expressions.

use std::path::PathBuf;
use thiserror::Error;

use schema_bridge::{BuildError, ConversionError, DocumentError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error loading the schema document.
    #[error("Failed to load schema: {0}")]
    Document(#[from] DocumentError),

    /// The bridge could not be built.
    #[error("Failed to build bridge: {0}")]
    Build(#[from] BuildError),

    /// A value did not convert.
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// Input could not be read as the requested type.
    #[error("Invalid input: {0}")]
    Input(String),

    /// A command precondition failed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// JSON could not be parsed or rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 for conversion failures, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Conversion(_) => 2,
            _ => 1,
        }
    }
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// No schema document was given on the command line or in the config.
    #[error("No schema document given; pass --schema or set [schema].path")]
    MissingSchema,

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }
}
