//! Environment variable overrides.
//!
//! `KVMUX_*` variables override whatever the embedded defaults and the
//! config file set. Empty values are ignored.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by every recognised variable.
pub const ENV_PREFIX: &str = "KVMUX_";

/// Mapping from environment variable name to config field.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    key: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "KVMUX_BACKEND",
        section: "storage",
        key: "backend",
    },
    EnvMapping {
        var_name: "KVMUX_PATH",
        section: "storage",
        key: "path",
    },
    EnvMapping {
        var_name: "KVMUX_LAYOUT",
        section: "storage",
        key: "layout",
    },
    EnvMapping {
        var_name: "KVMUX_LOG_LEVEL",
        section: "logging",
        key: "level",
    },
    EnvMapping {
        var_name: "KVMUX_LOG_FORMAT",
        section: "logging",
        key: "format",
    },
    EnvMapping {
        var_name: "KVMUX_LOG_TARGET",
        section: "logging",
        key: "target",
    },
    EnvMapping {
        var_name: "KVMUX_LOG_DIR",
        section: "logging",
        key: "dir",
    },
];

/// Apply `KVMUX_*` overrides to the merged TOML tree.
///
/// Returns the number of variables applied.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let Some(root) = merged.as_table_mut() else {
        return 0;
    };
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if val.is_empty() {
            debug!(var = mapping.var_name, "ignoring empty env var");
            continue;
        }

        debug!(
            var = mapping.var_name,
            field = %format!("{}.{}", mapping.section, mapping.key),
            "applying env var override"
        );
        let section = root
            .entry(mapping.section)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = section.as_table_mut() {
            table.insert(mapping.key.to_owned(), toml::Value::String(val.clone()));
            count = count.saturating_add(1);
        }
    }

    count
}

/// Collect the `KVMUX_*` environment variables.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if one of them is not valid UTF-8.
pub fn collect_env_vars() -> ConfigResult<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for (name, value) in std::env::vars_os() {
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(ENV_PREFIX) {
            continue;
        }
        let value = value.into_string().map_err(|_| ConfigError::EnvError {
            var_name: name.to_owned(),
            message: "value is not valid UTF-8".to_owned(),
        })?;
        vars.insert(name.to_owned(), value);
    }
    Ok(vars)
}
