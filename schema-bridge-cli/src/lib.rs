//! # schema-bridge-cli
//!
//! CLI library for inspecting schema documents and converting JSON-encoded
//! values between wire and native form.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`commands`] - Command implementations over a built bridge
//! - [`error`] - Error types and handling

pub mod commands;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use commands::{inspect, load_bridge, parse_type, Inspection};
pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
