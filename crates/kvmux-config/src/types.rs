//! Configuration types.
//!
//! These types do not depend on the storage crate; the CLI converts them into
//! backends at startup. Every struct implements [`Default`] with the same
//! values as the embedded `defaults.toml`, so a bare `[section]` header
//! produces a working configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend to use and how to lay tables out in it.
    pub storage: StorageConfig,
    /// Where and how log lines are written.
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Storage backend kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local map; nothing persists.
    #[default]
    Memory,
    /// Embedded single-file redb store.
    Redb,
    /// SQLite file with one key-value SQL table.
    Sqlite,
}

impl BackendKind {
    /// Whether this backend stores data in a file and so needs a path.
    #[must_use]
    pub fn needs_path(self) -> bool {
        !matches!(self, Self::Memory)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
            Self::Sqlite => "sqlite",
        })
    }
}

/// How logical tables map onto the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Each logical table is a native table of the backend.
    #[default]
    Native,
    /// All logical tables share one flat table through key prefixes.
    Multiplexed,
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: BackendKind,
    /// File for the redb and sqlite backends. Relative paths resolve
    /// against the working directory.
    pub path: Option<PathBuf>,
    /// SQL table that holds every row (sqlite only).
    pub sql_table: String,
    /// Name of the single flat table used by the multiplexed layout.
    pub flat_table: String,
    /// Native or multiplexed table layout.
    pub layout: Layout,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            sql_table: "kv".to_owned(),
            flat_table: "kv".to_owned(),
            layout: Layout::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Where log lines go: `"stderr"`, `"stdout"`, or `"file"`.
    pub target: String,
    /// Directory for rolling log files; required when `target = "file"`.
    pub dir: Option<PathBuf>,
    /// Log file rotation: `"daily"`, `"hourly"`, or `"never"`.
    pub rotation: String,
    /// Prefix each line with a timestamp.
    pub timestamps: bool,
    /// Colour terminal output. Files and JSON are never coloured.
    pub ansi: bool,
    /// Per-crate tracing directives (e.g. `["kvmux_storage=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            target: "stderr".to_owned(),
            dir: None,
            rotation: "daily".to_owned(),
            timestamps: true,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[storage]\n[logging]\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_storage_section_parses() {
        let config: Config = toml::from_str(
            r#"
[storage]
backend = "redb"
path = "data/kv.redb"
layout = "multiplexed"
flat_table = "everything"
"#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, BackendKind::Redb);
        assert_eq!(config.storage.path, Some(PathBuf::from("data/kv.redb")));
        assert_eq!(config.storage.layout, Layout::Multiplexed);
        assert_eq!(config.storage.flat_table, "everything");
        assert_eq!(config.storage.sql_table, "kv");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[storage]\nbackend = \"postgres\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_needs_path() {
        assert!(!BackendKind::Memory.needs_path());
        assert!(BackendKind::Redb.needs_path());
        assert!(BackendKind::Sqlite.needs_path());
        assert_eq!(BackendKind::Sqlite.to_string(), "sqlite");
    }

    #[test]
    fn test_logging_section_parses() {
        let config: Config = toml::from_str(
            r#"
[logging]
target = "file"
dir = "/var/log/kvmux"
rotation = "hourly"
ansi = false
"#,
        )
        .unwrap();

        assert_eq!(config.logging.target, "file");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/kvmux")));
        assert_eq!(config.logging.rotation, "hourly");
        assert!(!config.logging.ansi);
        assert!(config.logging.timestamps);
        assert_eq!(config.logging.level, "warn");
    }
}
