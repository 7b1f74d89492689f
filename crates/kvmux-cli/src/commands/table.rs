//! Table commands - read and write keys of one logical table.
//!
//! Output goes to the given writer so the commands can be tested without a
//! terminal. Values are written as raw bytes followed by a newline.

use std::io::Write;

use anyhow::{Context, Result};
use kvmux_storage::Database;
use tracing::info;

/// Print the value of `key`. Returns `false` if the key is absent.
pub(crate) fn get(db: &dyn Database, table: &str, key: &str, out: &mut dyn Write) -> Result<bool> {
    let t = db.open(table)?;
    let value = t
        .get(key.as_bytes())
        .with_context(|| format!("failed to read {key:?} from table {table:?}"))?;

    match value {
        Some(value) => {
            out.write_all(&value)?;
            out.write_all(b"\n")?;
            Ok(true)
        },
        None => Ok(false),
    }
}

/// Store `value` under `key`.
pub(crate) fn put(db: &dyn Database, table: &str, key: &str, value: &str) -> Result<()> {
    db.open(table)?
        .store(key.as_bytes(), Some(value.as_bytes()))
        .with_context(|| format!("failed to write {key:?} to table {table:?}"))
}

/// Delete `key`. Deleting a missing key succeeds.
pub(crate) fn delete(db: &dyn Database, table: &str, key: &str) -> Result<()> {
    db.open(table)?
        .store(key.as_bytes(), None)
        .with_context(|| format!("failed to delete {key:?} from table {table:?}"))
}

/// Print every key of `table`, one per line, in sorted order.
pub(crate) fn list(db: &dyn Database, table: &str, out: &mut dyn Write) -> Result<()> {
    let mut keys = db
        .open(table)?
        .list()
        .with_context(|| format!("failed to list table {table:?}"))?;
    keys.sort();

    for key in keys {
        out.write_all(&key)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Remove `table` and all of its keys.
pub(crate) fn drop_table(db: &dyn Database, table: &str) -> Result<()> {
    db.remove(table)
        .with_context(|| format!("failed to drop table {table:?}"))?;
    info!(table, "dropped table");
    Ok(())
}
