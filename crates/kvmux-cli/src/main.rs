//! kvmux CLI - read and write key-value tables from the shell.
//!
//! The backend and table layout come from the layered configuration (see
//! `kvmux-config`). A `get` for a missing key prints nothing and exits with
//! status 1. The default memory backend keeps nothing between runs, so
//! writes to it log a warning.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use kvmux_config::{Config, StorageConfig};
use tracing::warn;

mod commands;
mod config_bridge;

use commands::table;

/// kvmux - many logical tables over one key-value store
#[derive(Parser)]
#[command(name = "kvmux")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "KVMUX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// Logical table name
        table: String,
        /// Key to look up
        key: String,
    },

    /// Store a value under a key
    Put {
        /// Logical table name
        table: String,
        /// Key to write
        key: String,
        /// Value to store
        value: String,
    },

    /// Delete a key
    Delete {
        /// Logical table name
        table: String,
        /// Key to delete
        key: String,
    },

    /// List the keys of a table
    List {
        /// Logical table name
        table: String,
    },

    /// Remove a table and all of its keys
    Drop {
        /// Logical table name
        table: String,
    },
}

impl Commands {
    /// Whether the command changes stored data.
    fn mutates(&self) -> bool {
        matches!(self, Self::Put { .. } | Self::Delete { .. } | Self::Drop { .. })
    }
}

/// A write to a backend with no file is gone once the process exits.
fn discards_writes(command: &Commands, storage: &StorageConfig) -> bool {
    command.mutates() && !storage.backend.needs_path()
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    if let Some(path) = path
        && !path.exists()
    {
        bail!("config file {} does not exist", path.display());
    }
    Config::load(path.map(PathBuf::as_path)).context("failed to load configuration")
}

/// Run one command. Returns `false` when `get` finds no value.
fn run(cli: Cli, config: &Config) -> Result<bool> {
    if discards_writes(&cli.command, &config.storage) {
        warn!(
            backend = %config.storage.backend,
            "this write is lost when kvmux exits; set storage.backend and storage.path to persist"
        );
    }

    let db = config_bridge::open_database(&config.storage)?;
    let mut stdout = std::io::stdout().lock();

    let found = match cli.command {
        Commands::Get { table, key } => table::get(&*db, &table, &key, &mut stdout)?,
        Commands::Put { table, key, value } => {
            table::put(&*db, &table, &key, &value)?;
            true
        },
        Commands::Delete { table, key } => {
            table::delete(&*db, &table, &key)?;
            true
        },
        Commands::List { table } => {
            table::list(&*db, &table, &mut stdout)?;
            true
        },
        Commands::Drop { table } => {
            table::drop_table(&*db, &table)?;
            true
        },
    };

    db.close().context("failed to close database")?;
    Ok(found)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let mut log_config = config_bridge::to_log_config(&config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = kvmux_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if run(cli, &config)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_put() {
        let cli = Cli::parse_from(["kvmux", "--verbose", "put", "fruit", "apple", "red"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Put { ref table, ref key, ref value }
                if table == "fruit" && key == "apple" && value == "red"
        ));
    }

    #[test]
    fn test_writes_to_memory_backend_are_flagged() {
        let memory = StorageConfig::default();
        let redb = StorageConfig {
            backend: kvmux_config::BackendKind::Redb,
            path: Some(PathBuf::from("kv.redb")),
            ..StorageConfig::default()
        };

        for args in [
            &["kvmux", "put", "fruit", "apple", "red"][..],
            &["kvmux", "delete", "fruit", "apple"],
            &["kvmux", "drop", "fruit"],
        ] {
            let cli = Cli::parse_from(args);
            assert!(discards_writes(&cli.command, &memory), "{args:?}");
            assert!(!discards_writes(&cli.command, &redb), "{args:?}");
        }

        for args in [&["kvmux", "get", "fruit", "apple"][..], &["kvmux", "list", "fruit"]] {
            let cli = Cli::parse_from(args);
            assert!(!discards_writes(&cli.command, &memory), "{args:?}");
        }
    }

    #[test]
    fn test_memory_backend_forgets_between_runs() {
        let config = Config::default();
        let put = Cli::parse_from(["kvmux", "put", "fruit", "apple", "red"]);
        assert!(run(put, &config).unwrap());

        let get = Cli::parse_from(["kvmux", "get", "fruit", "apple"]);
        assert!(!run(get, &config).unwrap());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = kvmux_test::test_dir();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let dir = kvmux_test::test_dir();
        let path = kvmux_test::test_file_in_dir(
            &dir,
            "kvmux.toml",
            "[storage]\nlayout = \"multiplexed\"\nflat_table = \"flat\"\n",
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.storage.layout, kvmux_config::Layout::Multiplexed);
        assert_eq!(config.storage.flat_table, "flat");
    }

    #[test]
    fn test_run_against_redb_file() {
        let dir = kvmux_test::test_dir();
        let mut config = Config::default();
        config.storage.backend = kvmux_config::BackendKind::Redb;
        config.storage.layout = kvmux_config::Layout::Multiplexed;
        config.storage.path = Some(dir.path().join("kv.redb"));

        let put = Cli::parse_from(["kvmux", "put", "fruit", "apple", "red"]);
        assert!(run(put, &config).unwrap());

        let found = Cli::parse_from(["kvmux", "get", "fruit", "apple"]);
        assert!(run(found, &config).unwrap());

        let missing = Cli::parse_from(["kvmux", "get", "fruit", "pear"]);
        assert!(!run(missing, &config).unwrap());
    }
}
