//! Config file discovery and layered loading.
//!
//! `Config::load()` proceeds as follows:
//! 1. Parse the embedded `defaults.toml` as the base
//! 2. Merge the config file, if it exists
//! 3. Apply `KVMUX_*` environment overrides
//! 4. Deserialize the merged tree into [`Config`]
//! 5. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the configuration from defaults, `path` (or the user config file
/// when `path` is `None`) and the process environment.
///
/// A config file that does not exist is skipped.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable, too large or
/// malformed, if an environment variable is not UTF-8, or if the result
/// fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    let env_vars = collect_env_vars()?;
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => user_config_path(),
    };
    load_with_env(path.as_deref(), &env_vars)
}

/// [`load`] with an explicit environment instead of the process one.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    if let Some(path) = path
        && let Some(overlay) = try_load_file(path)?
    {
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let env_count = apply_env_overrides(&mut merged, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable overrides");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no defaults layer, no
/// environment).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    check_size(path, metadata.len())?;

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// The per-user config file (`$XDG_CONFIG_HOME/kvmux/config.toml` on
/// Linux), if a home directory can be determined.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "kvmux").map(|d| d.config_dir().join("config.toml"))
}

fn check_size(path: &Path, len: u64) -> ConfigResult<()> {
    if len > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {len} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }
    Ok(())
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Reads once and checks the size afterwards, so there is no window between
/// a stat and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    check_size(path, content.len() as u64)?;

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Recursively merge `overlay` into `base`.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}
