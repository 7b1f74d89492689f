//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_storage(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Whether `name` is a plain SQL identifier: ASCII letters, digits and
/// underscores, not starting with a digit.
///
/// Must accept exactly the names `kvmux_storage::SqlDatabase::new` accepts,
/// so a config that validates never fails later when the database opens.
/// `kvmux-cli` tests the two rules against each other.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_storage(config: &Config) -> ConfigResult<()> {
    let s = &config.storage;

    if s.backend.needs_path() && s.path.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
        return Err(ConfigError::ValidationError {
            field: "storage.path".to_owned(),
            message: format!("the {} backend needs a file path", s.backend),
        });
    }

    if !is_identifier(&s.sql_table) {
        return Err(ConfigError::ValidationError {
            field: "storage.sql_table".to_owned(),
            message: format!(
                "'{}' is not a valid SQL identifier; use letters, digits and underscores",
                s.sql_table
            ),
        });
    }

    if s.flat_table.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "storage.flat_table".to_owned(),
            message: "flat_table must not be empty".to_owned(),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    let valid_targets = ["stderr", "stdout", "file"];
    if !valid_targets.contains(&config.logging.target.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.target".to_owned(),
            message: format!(
                "unsupported log target '{}'; expected one of: {}",
                config.logging.target,
                valid_targets.join(", ")
            ),
        });
    }

    if config.logging.target == "file"
        && config
            .logging
            .dir
            .as_ref()
            .is_none_or(|d| d.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "logging.dir".to_owned(),
            message: "the file log target needs a directory".to_owned(),
        });
    }

    let valid_rotations = ["daily", "hourly", "never"];
    if !valid_rotations.contains(&config.logging.rotation.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.rotation".to_owned(),
            message: format!(
                "unsupported log rotation '{}'; expected one of: {}",
                config.logging.rotation,
                valid_rotations.join(", ")
            ),
        });
    }

    Ok(())
}
