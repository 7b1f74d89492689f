//! Many logical tables over one flat table.
//!
//! [`MultiplexedDatabase`] owns a single flat [`Table`] and hands out
//! [`MultiplexedTable`] views. Each view prepends its encoded table prefix
//! (see [`codec`](crate::codec)) to every key before delegating, and strips
//! it again when listing. Views hold a shared handle to the flat table but
//! never close it; only the database does, once.
//!
//! ```rust
//! use kvmux_storage::{MemoryTable, MultiplexedDatabase, Table};
//!
//! # fn main() -> kvmux_storage::StorageResult<()> {
//! let db = MultiplexedDatabase::from_table(MemoryTable::new());
//! let users = db.open_table("users");
//! users.store(b"alice", Some(b"admin"))?;
//!
//! // A second handle sees the same data.
//! assert_eq!(db.open_table("users").list()?, vec![b"alice".to_vec()]);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::codec;
use crate::error::{StorageError, StorageResult};
use crate::traits::{Database, Table};

/// A database of logical tables sharing one flat table.
pub struct MultiplexedDatabase<S: Table + ?Sized = dyn Table> {
    flat: Arc<S>,
    closed: AtomicBool,
}

impl<S: Table + ?Sized> std::fmt::Debug for MultiplexedDatabase<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexedDatabase")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<S: Table> MultiplexedDatabase<S> {
    /// Wrap `flat`, taking ownership of it.
    #[must_use]
    pub fn from_table(flat: S) -> Self {
        Self::new(Arc::new(flat))
    }
}

impl<S: Table + ?Sized> MultiplexedDatabase<S> {
    /// Wrap a shared flat table.
    ///
    /// The database becomes responsible for closing it.
    #[must_use]
    pub fn new(flat: Arc<S>) -> Self {
        Self {
            flat,
            closed: AtomicBool::new(false),
        }
    }

    /// Open the logical table `name`.
    ///
    /// Opening never touches the flat table, so it cannot fail. Opening the
    /// same name twice gives two handles over the same keys.
    pub fn open_table(&self, name: impl AsRef<[u8]>) -> MultiplexedTable<S> {
        let prefix = codec::encode_prefix(name.as_ref());
        debug!(prefix_len = prefix.len(), "opened multiplexed table");
        MultiplexedTable {
            flat: Arc::clone(&self.flat),
            prefix,
        }
    }

    /// Delete every key of the logical table `name`.
    ///
    /// Returns the number of keys removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] if the flat table cannot
    /// enumerate its keys, or the flat table's error if a delete fails.
    pub fn remove_table(&self, name: impl AsRef<[u8]>) -> StorageResult<usize> {
        let prefix = codec::encode_prefix(name.as_ref());
        let keys = self.flat.list().map_err(|e| {
            if e.is_unsupported() {
                StorageError::unsupported("remove")
            } else {
                e
            }
        })?;

        let mut removed = 0usize;
        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
            self.flat.store(key, None)?;
            removed = removed.saturating_add(1);
        }
        debug!(removed, "removed multiplexed table");
        Ok(removed)
    }

    /// List the names of the logical tables that currently hold keys.
    ///
    /// Keys in the flat table that no table prefix could have produced are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] if the flat table cannot
    /// enumerate its keys.
    pub fn tables(&self) -> StorageResult<Vec<Vec<u8>>> {
        let mut names: Vec<Vec<u8>> = self
            .flat
            .list()?
            .iter()
            .filter_map(|k| codec::decode_table_name(k).map(|(name, _)| name))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Whether [`close`](Database::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<S: Table + ?Sized + 'static> Database for MultiplexedDatabase<S> {
    fn open(&self, name: &str) -> StorageResult<Box<dyn Table>> {
        Ok(Box::new(self.open_table(name)))
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        self.remove_table(name).map(|_| ())
    }

    fn close(&self) -> StorageResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("multiplexed database already closed");
            return Ok(());
        }
        debug!("closing flat table");
        self.flat.close()
    }
}

/// One logical table inside a [`MultiplexedDatabase`].
pub struct MultiplexedTable<S: Table + ?Sized = dyn Table> {
    flat: Arc<S>,
    prefix: Vec<u8>,
}

impl<S: Table + ?Sized> Clone for MultiplexedTable<S> {
    fn clone(&self) -> Self {
        Self {
            flat: Arc::clone(&self.flat),
            prefix: self.prefix.clone(),
        }
    }
}

impl<S: Table + ?Sized> std::fmt::Debug for MultiplexedTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexedTable")
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .finish_non_exhaustive()
    }
}

impl<S: Table + ?Sized> MultiplexedTable<S> {
    /// The encoded prefix carried by every key of this table.
    #[must_use]
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    fn physical(&self, key: &[u8]) -> Vec<u8> {
        codec::physical_key(&self.prefix, key)
    }
}

impl<S: Table + ?Sized> Table for MultiplexedTable<S> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        trace!(key_len = key.len(), "multiplexed get");
        self.flat.get(&self.physical(key))
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        trace!(key_len = key.len(), delete = value.is_none(), "multiplexed store");
        self.flat.store(&self.physical(key), value)
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        Ok(self
            .flat
            .list()?
            .iter()
            .filter_map(|k| codec::strip_prefix(k, &self.prefix).map(<[u8]>::to_vec))
            .collect())
    }

    /// Views own nothing; the flat table stays open for other views.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
