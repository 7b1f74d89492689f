//! Relational storage backed by SQLite.
//!
//! Every logical table lives in one SQL table, partitioned by a `grp`
//! column:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv (
//!     id    INTEGER PRIMARY KEY,
//!     grp   TEXT NOT NULL,
//!     key   BLOB NOT NULL,
//!     value BLOB NOT NULL
//! );
//! CREATE UNIQUE INDEX IF NOT EXISTS kv_grp_key ON kv (grp, key);
//! ```
//!
//! A lookup that matches no row is `Ok(None)`; only real query failures are
//! errors.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{StorageError, StorageResult, poisoned};
use crate::traits::{Database, Table};

/// Check that `name` can be spliced into SQL as a bare identifier.
///
/// `kvmux_config::validate::is_identifier` checks `storage.sql_table` with
/// the same rule; keep the two in step.
fn validate_identifier(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StorageError::InvalidName(format!(
            "SQL table name must match [A-Za-z_][A-Za-z0-9_]*, got {name:?}"
        )));
    }
    Ok(())
}

/// The connection and SQL table shared by a database and its tables.
struct Shared {
    conn: Mutex<Option<Connection>>,
    table: String,
}

impl Shared {
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> StorageResult<T> {
        let guard = self.conn.lock().map_err(poisoned)?;
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        Ok(f(conn)?)
    }

    fn close(&self) -> StorageResult<bool> {
        let conn = self.conn.lock().map_err(poisoned)?.take();
        match conn {
            Some(conn) => {
                conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
                Ok(true)
            },
            None => Ok(false),
        }
    }
}

/// A SQL table holding many logical tables, one per `grp` value.
pub struct SqlDatabase {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SqlDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDatabase")
            .field("table", &self.shared.table)
            .finish_non_exhaustive()
    }
}

impl SqlDatabase {
    /// Use `table` in an existing connection.
    ///
    /// Call [`create_table`](Self::create_table) if the table may not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] if `table` is not a plain SQL
    /// identifier.
    pub fn new(conn: Connection, table: impl Into<String>) -> StorageResult<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            shared: Arc::new(Shared {
                conn: Mutex::new(Some(conn)),
                table,
            }),
        })
    }

    /// Open the SQLite file at `path` and create `table` in it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for a bad table name, or
    /// [`StorageError::Sqlite`] if the file cannot be opened.
    pub fn open_path(path: impl AsRef<Path>, table: impl Into<String>) -> StorageResult<Self> {
        let path = path.as_ref();
        let db = Self::new(Connection::open(path)?, table)?;
        db.create_table()?;
        debug!(path = %path.display(), table = %db.shared.table, "opened sqlite database");
        Ok(db)
    }

    /// Open a private in-memory SQLite database with `table` created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for a bad table name, or
    /// [`StorageError::Sqlite`] on failure.
    pub fn open_in_memory(table: impl Into<String>) -> StorageResult<Self> {
        let db = Self::new(Connection::open_in_memory()?, table)?;
        db.create_table()?;
        Ok(db)
    }

    /// Create the key-value table and its `(grp, key)` index if they do not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Sqlite`] if a statement fails.
    pub fn create_table(&self) -> StorageResult<()> {
        let table = &self.shared.table;
        self.shared.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id    INTEGER PRIMARY KEY,
                    grp   TEXT NOT NULL,
                    key   BLOB NOT NULL,
                    value BLOB NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS {table}_grp_key ON {table} (grp, key);"
            ))
        })
    }

    /// Open group `name` with its concrete type. The table stays bound to
    /// this database and does not close the connection.
    #[must_use]
    pub fn table(&self, name: &str) -> SqlTable {
        SqlTable {
            shared: Arc::clone(&self.shared),
            group: name.to_owned(),
            owns_connection: false,
        }
    }

    /// Consume the database, returning group `name` as the owner of the
    /// connection: closing the table closes the connection.
    #[must_use]
    pub fn into_table(self, name: &str) -> SqlTable {
        SqlTable {
            shared: self.shared,
            group: name.to_owned(),
            owns_connection: true,
        }
    }

    /// Names of all groups that hold at least one key, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or
    /// [`StorageError::Sqlite`] if the query fails.
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        let table = &self.shared.table;
        self.shared.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached(&format!("SELECT DISTINCT grp FROM {table} ORDER BY grp"))?;
            let names = stmt.query_map([], |row| row.get(0))?;
            names.collect()
        })
    }
}

impl Database for SqlDatabase {
    fn open(&self, name: &str) -> StorageResult<Box<dyn Table>> {
        Ok(Box::new(self.table(name)))
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let table = &self.shared.table;
        let removed = self.shared.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!("DELETE FROM {table} WHERE grp = ?1"))?;
            stmt.execute(params![name])
        })?;
        debug!(table = name, removed, "removed sql group");
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if self.shared.close()? {
            debug!(table = %self.shared.table, "closed sqlite database");
        }
        Ok(())
    }
}

/// One logical table: the rows of a SQL table with a given `grp`.
pub struct SqlTable {
    shared: Arc<Shared>,
    group: String,
    owns_connection: bool,
}

impl std::fmt::Debug for SqlTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlTable")
            .field("table", &self.shared.table)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl SqlTable {
    /// The `grp` value this table is bound to.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }
}

impl Table for SqlTable {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let table = &self.shared.table;
        self.shared.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT value FROM {table} WHERE grp = ?1 AND key = ?2 LIMIT 1"
            ))?;
            stmt.query_row(params![self.group, key], |row| row.get(0))
                .optional()
        })
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        let table = &self.shared.table;
        self.shared.with_conn(|conn| {
            match value {
                Some(value) => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "INSERT INTO {table} (grp, key, value) VALUES (?1, ?2, ?3)
                         ON CONFLICT (grp, key) DO UPDATE SET value = excluded.value"
                    ))?;
                    stmt.execute(params![self.group, key, value])?;
                },
                None => {
                    let mut stmt = conn.prepare_cached(&format!(
                        "DELETE FROM {table} WHERE grp = ?1 AND key = ?2"
                    ))?;
                    stmt.execute(params![self.group, key])?;
                },
            }
            Ok(())
        })
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        let table = &self.shared.table;
        self.shared.with_conn(|conn| {
            let mut stmt =
                conn.prepare_cached(&format!("SELECT key FROM {table} WHERE grp = ?1"))?;
            let keys = stmt.query_map(params![self.group], |row| row.get(0))?;
            keys.collect()
        })
    }

    fn close(&self) -> StorageResult<()> {
        if self.owns_connection && self.shared.close()? {
            debug!(group = %self.group, "closed sql table");
        }
        Ok(())
    }
}
