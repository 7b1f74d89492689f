//! Embedded single-file storage backed by `redb`.
//!
//! One redb file holds any number of named redb tables. [`RedbDatabase`]
//! maps each logical table onto its own redb table, so removing a table is a
//! single `delete_table`. [`RedbTable`] is one of those tables and can also
//! stand alone as the flat table of a
//! [`MultiplexedDatabase`](crate::MultiplexedDatabase).
//!
//! ```rust,no_run
//! use kvmux_storage::{Database, RedbDatabase};
//!
//! # fn main() -> kvmux_storage::StorageResult<()> {
//! let db = RedbDatabase::create("data/kv.redb")?;
//! let fruit = db.open("fruit")?;
//! fruit.store(b"apple", Some(b"red or green"))?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::{Arc, RwLock};

use ::redb::{ReadableTable, TableDefinition, TableError, TableHandle};
use tracing::debug;

use crate::error::{StorageError, StorageResult, poisoned};
use crate::traits::{Database, Table};

type Bytes = &'static [u8];

/// redb refuses empty table names, so they are rejected up front.
fn definition(name: &str) -> StorageResult<TableDefinition<'_, Bytes, Bytes>> {
    if name.is_empty() {
        return Err(StorageError::InvalidName(
            "redb table names must not be empty".to_owned(),
        ));
    }
    Ok(TableDefinition::new(name))
}

fn redb_err(e: impl Into<::redb::Error>) -> StorageError {
    StorageError::Redb(e.into())
}

/// The open redb file, shared by a database and its tables.
///
/// `None` once closed; dropping the `redb::Database` releases the file.
struct Handle {
    db: RwLock<Option<::redb::Database>>,
}

impl Handle {
    fn with_db<T>(&self, f: impl FnOnce(&::redb::Database) -> StorageResult<T>) -> StorageResult<T> {
        let guard = self.db.read().map_err(poisoned)?;
        let db = guard.as_ref().ok_or(StorageError::Closed)?;
        f(db)
    }

    fn close(&self) -> StorageResult<bool> {
        Ok(self.db.write().map_err(poisoned)?.take().is_some())
    }
}

/// A redb file holding one redb table per logical table.
pub struct RedbDatabase {
    handle: Arc<Handle>,
}

impl std::fmt::Debug for RedbDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDatabase").finish_non_exhaustive()
    }
}

impl RedbDatabase {
    /// Open the redb file at `path`, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Redb`] if the file cannot be opened or is
    /// locked by another process.
    pub fn create(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let db = ::redb::Database::create(path).map_err(redb_err)?;
        debug!(path = %path.display(), "opened redb database");
        Ok(Self {
            handle: Arc::new(Handle {
                db: RwLock::new(Some(db)),
            }),
        })
    }

    /// Open `name` with its concrete type. The table stays bound to this
    /// database and does not close the file.
    #[must_use]
    pub fn table(&self, name: &str) -> RedbTable {
        RedbTable {
            handle: Arc::clone(&self.handle),
            name: name.to_owned(),
            owns_handle: false,
        }
    }

    /// Consume the database, returning table `name` as the owner of the
    /// file: closing the table closes the file.
    #[must_use]
    pub fn into_table(self, name: &str) -> RedbTable {
        RedbTable {
            handle: self.handle,
            name: name.to_owned(),
            owns_handle: true,
        }
    }

    /// Names of all tables in the file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or
    /// [`StorageError::Redb`] if the file cannot be read.
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        self.handle.with_db(|db| {
            let txn = db.begin_read().map_err(redb_err)?;
            let tables = txn.list_tables().map_err(redb_err)?;
            Ok(tables.map(|t| t.name().to_owned()).collect())
        })
    }
}

impl Database for RedbDatabase {
    fn open(&self, name: &str) -> StorageResult<Box<dyn Table>> {
        Ok(Box::new(self.table(name)))
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        self.handle.with_db(|db| {
            let txn = db.begin_write().map_err(redb_err)?;
            let existed = txn.delete_table(definition(name)?).map_err(redb_err)?;
            txn.commit().map_err(redb_err)?;
            debug!(table = name, existed, "removed redb table");
            Ok(())
        })
    }

    fn close(&self) -> StorageResult<()> {
        if self.handle.close()? {
            debug!("closed redb database");
        }
        Ok(())
    }
}

/// A single redb table.
///
/// The table is created on the first write; reading or listing it before
/// that finds nothing.
pub struct RedbTable {
    handle: Arc<Handle>,
    name: String,
    owns_handle: bool,
}

impl std::fmt::Debug for RedbTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbTable")
            .field("name", &self.name)
            .field("owns_handle", &self.owns_handle)
            .finish_non_exhaustive()
    }
}

impl RedbTable {
    /// Open table `name` in the redb file at `path` as a standalone table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Redb`] if the file cannot be opened.
    pub fn create(path: impl AsRef<Path>, name: &str) -> StorageResult<Self> {
        Ok(RedbDatabase::create(path)?.into_table(name))
    }

    /// Name of the redb table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Table for RedbTable {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.handle.with_db(|db| {
            let txn = db.begin_read().map_err(redb_err)?;
            let table = match txn.open_table(definition(&self.name)?) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(redb_err(e)),
            };
            let value = table.get(key).map_err(redb_err)?;
            Ok(value.map(|v| v.value().to_vec()))
        })
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        self.handle.with_db(|db| {
            let txn = db.begin_write().map_err(redb_err)?;
            {
                let mut table = txn.open_table(definition(&self.name)?).map_err(redb_err)?;
                match value {
                    Some(value) => {
                        table.insert(key, value).map_err(redb_err)?;
                    },
                    None => {
                        table.remove(key).map_err(redb_err)?;
                    },
                }
            }
            txn.commit().map_err(redb_err)
        })
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        self.handle.with_db(|db| {
            let txn = db.begin_read().map_err(redb_err)?;
            let table = match txn.open_table(definition(&self.name)?) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(redb_err(e)),
            };
            let mut keys = Vec::new();
            for entry in table.iter().map_err(redb_err)? {
                let (key, _) = entry.map_err(redb_err)?;
                keys.push(key.value().to_vec());
            }
            Ok(keys)
        })
    }

    fn close(&self) -> StorageResult<()> {
        if self.owns_handle && self.handle.close()? {
            debug!(table = %self.name, "closed redb table");
        }
        Ok(())
    }
}
