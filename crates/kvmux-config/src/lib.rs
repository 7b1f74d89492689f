#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Layered configuration for kvmux tools.
//!
//! # Usage
//!
//! ```rust,no_run
//! use kvmux_config::Config;
//!
//! // Defaults, then the user config file, then KVMUX_* variables.
//! let config = Config::load(None).unwrap();
//! println!("backend: {}", config.storage.backend);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`KVMUX_BACKEND`, `KVMUX_PATH`,
//!    `KVMUX_LAYOUT`, `KVMUX_LOG_LEVEL`, `KVMUX_LOG_FORMAT`,
//!    `KVMUX_LOG_TARGET`, `KVMUX_LOG_DIR`)
//! 2. **Config file** (given explicitly, or the per-user `config.toml`)
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate does not depend on the storage or telemetry crates; the CLI
//! converts the config into backends and log settings.

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// See [`loader::load`] for the algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
