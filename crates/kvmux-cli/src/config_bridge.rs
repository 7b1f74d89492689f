//! Bridge from `kvmux_config::Config` to storage backends and log settings.

use anyhow::{Context, Result};
use kvmux_config::{BackendKind, Config, Layout, StorageConfig};
use kvmux_storage::{
    Database, MemoryDatabase, MemoryTable, MultiplexedDatabase, RedbDatabase, SqlDatabase,
};
use kvmux_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};
use tracing::debug;

/// Convert the logging section to a [`LogConfig`].
///
/// Values were checked by `kvmux_config::validate`; anything unparseable
/// falls back to the telemetry defaults.
pub(crate) fn to_log_config(cfg: &Config) -> LogConfig {
    let logging = &cfg.logging;
    let format = logging.format.parse().unwrap_or(LogFormat::Compact);

    let mut log_config = LogConfig::new(&logging.level).with_format(format);
    log_config.timestamps = logging.timestamps;
    log_config.ansi = logging.ansi;

    match (logging.target.as_str(), &logging.dir) {
        ("file", Some(dir)) => {
            let rotation = logging.rotation.parse().unwrap_or(FileRotation::Daily);
            log_config = log_config.with_file_target(dir, rotation);
        },
        ("stdout", _) => log_config.target = LogTarget::Stdout,
        _ => log_config.target = LogTarget::Stderr,
    }

    for directive in &logging.directives {
        log_config = log_config.with_directive(directive);
    }

    log_config
}

/// Open the configured backend as a [`Database`].
///
/// With [`Layout::Multiplexed`] every logical table lives in the backend's
/// single `flat_table`, and closing the returned database closes the backend.
pub(crate) fn open_database(cfg: &StorageConfig) -> Result<Box<dyn Database>> {
    let db: Box<dyn Database> = match cfg.backend {
        BackendKind::Memory => match cfg.layout {
            Layout::Native => Box::new(MemoryDatabase::new()),
            Layout::Multiplexed => Box::new(MultiplexedDatabase::from_table(MemoryTable::new())),
        },
        BackendKind::Redb => {
            let path = require_path(cfg)?;
            let db = RedbDatabase::create(path)
                .with_context(|| format!("failed to open redb file {}", path.display()))?;
            match cfg.layout {
                Layout::Native => Box::new(db),
                Layout::Multiplexed => {
                    Box::new(MultiplexedDatabase::from_table(db.into_table(&cfg.flat_table)))
                },
            }
        },
        BackendKind::Sqlite => {
            let path = require_path(cfg)?;
            let db = SqlDatabase::open_path(path, &cfg.sql_table)
                .with_context(|| format!("failed to open sqlite file {}", path.display()))?;
            match cfg.layout {
                Layout::Native => Box::new(db),
                Layout::Multiplexed => {
                    Box::new(MultiplexedDatabase::from_table(db.into_table(&cfg.flat_table)))
                },
            }
        },
    };

    debug!(backend = %cfg.backend, layout = ?cfg.layout, "opened database");
    Ok(db)
}

fn require_path(cfg: &StorageConfig) -> Result<&std::path::Path> {
    cfg.path
        .as_deref()
        .with_context(|| format!("storage.path is required for the {} backend", cfg.backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvmux_test::{FRUIT, assert_entries, fill, test_dir, test_path};

    fn storage(backend: BackendKind, layout: Layout, path: Option<std::path::PathBuf>) -> StorageConfig {
        StorageConfig {
            backend,
            path,
            layout,
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_log_config_from_defaults() {
        let mut cfg = Config::default();
        cfg.logging.format = "json".to_owned();
        cfg.logging.directives = vec!["kvmux_storage=debug".to_owned()];

        let log = to_log_config(&cfg);
        assert_eq!(log.level, "warn");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["kvmux_storage=debug"]);
    }

    #[test]
    fn test_file_logging_config_writes_to_dir() {
        let dir = test_dir();
        let logs = test_path(&dir, "logs");
        let mut cfg = Config::default();
        cfg.logging.level = "debug".to_owned();
        cfg.logging.target = "file".to_owned();
        cfg.logging.dir = Some(logs.clone());
        cfg.logging.rotation = "never".to_owned();
        cfg.logging.directives = vec!["kvmux_storage=trace".to_owned()];

        let log = to_log_config(&cfg);
        assert_eq!(log.target, LogTarget::File(logs.clone()));
        assert_eq!(log.rotation, FileRotation::Never);

        let subscriber = kvmux_telemetry::subscriber(&log).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            let db = open_database(&cfg.storage).unwrap();
            db.open("fruit").unwrap().store(b"apple", Some(b"red")).unwrap();
            db.close().unwrap();
        });

        let content = std::fs::read_to_string(logs.join("kvmux.log")).unwrap();
        assert!(content.contains("opened database"), "{content}");
        assert!(content.contains("backend=memory"), "{content}");
    }

    #[test]
    fn test_stdout_target_and_terminal_flags() {
        let mut cfg = Config::default();
        cfg.logging.target = "stdout".to_owned();
        cfg.logging.ansi = false;
        cfg.logging.timestamps = false;

        let log = to_log_config(&cfg);
        assert_eq!(log.target, LogTarget::Stdout);
        assert!(!log.ansi);
        assert!(!log.timestamps);
        assert_eq!(to_log_config(&Config::default()).target, LogTarget::Stderr);
    }

    #[test]
    fn test_sql_table_rule_matches_sqlite_backend() {
        let names = [
            "kv", "_kv", "Kv_2", "_", "", "1kv", "kv;", "key-value", "kv.main", "kv table",
            "kv\u{e9}",
        ];
        for name in names {
            let config_accepts = kvmux_config::validate::is_identifier(name);
            let backend_accepts = SqlDatabase::open_in_memory(name).is_ok();
            assert_eq!(config_accepts, backend_accepts, "{name:?}");
        }
    }

    #[test]
    fn test_every_backend_and_layout_round_trips() {
        let dir = test_dir();
        let cases = [
            (BackendKind::Memory, None),
            (BackendKind::Redb, Some(test_path(&dir, "kv.redb"))),
            (BackendKind::Sqlite, Some(test_path(&dir, "kv.sqlite"))),
        ];

        for (backend, path) in cases {
            for layout in [Layout::Native, Layout::Multiplexed] {
                let db = open_database(&storage(backend, layout, path.clone())).unwrap();
                let fruit = db.open("fruit").unwrap();
                fill(&*fruit, FRUIT).unwrap();
                assert_entries(&*db.open("fruit").unwrap(), FRUIT);
                db.close().unwrap();
            }
        }
    }

    #[test]
    fn test_multiplexed_redb_persists() {
        let dir = test_dir();
        let cfg = storage(
            BackendKind::Redb,
            Layout::Multiplexed,
            Some(test_path(&dir, "kv.redb")),
        );

        let db = open_database(&cfg).unwrap();
        fill(&*db.open("fruit").unwrap(), FRUIT).unwrap();
        db.close().unwrap();

        let db = open_database(&cfg).unwrap();
        assert_entries(&*db.open("fruit").unwrap(), FRUIT);
        db.close().unwrap();
    }

    #[test]
    fn test_file_backend_without_path_fails() {
        let err = open_database(&storage(BackendKind::Sqlite, Layout::Native, None))
            .err()
            .unwrap();
        assert!(err.to_string().contains("storage.path"));
    }
}
