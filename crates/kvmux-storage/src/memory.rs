//! In-memory tables for tests and ephemeral data.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::{StorageResult, poisoned};
use crate::traits::{Database, Table};

/// In-memory table backed by a `HashMap`.
///
/// Supports enumeration, so it can serve as the flat table of a
/// [`MultiplexedDatabase`](crate::MultiplexedDatabase).
#[derive(Debug, Default)]
pub struct MemoryTable {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryTable {
    /// Create a new empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`](crate::StorageError::Internal) if
    /// the lock is poisoned.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.data.read().map_err(poisoned)?.len())
    }

    /// Returns `true` if the table holds no keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`](crate::StorageError::Internal) if
    /// the lock is poisoned.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Table for MemoryTable {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        match value {
            Some(value) => {
                data.insert(key.to_vec(), value.to_vec());
            },
            None => {
                data.remove(key);
            },
        }
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.keys().cloned().collect())
    }
}

/// In-memory database holding one [`MemoryTable`] per name.
///
/// Removing a table drops it from the database in one step. Handles opened
/// before the removal keep the detached table alive; a later `open` of the
/// same name starts empty.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<String, Arc<MemoryTable>>>,
}

impl MemoryDatabase {
    /// Create a new empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `name` with its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`](crate::StorageError::Internal) if
    /// the lock is poisoned.
    pub fn table(&self, name: &str) -> StorageResult<Arc<MemoryTable>> {
        if let Some(table) = self.tables.read().map_err(poisoned)?.get(name) {
            return Ok(Arc::clone(table));
        }
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.entry(name.to_owned()).or_insert_with(|| {
            debug!(table = name, "created memory table");
            Arc::new(MemoryTable::new())
        });
        Ok(Arc::clone(table))
    }

    /// Names of all tables, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`](crate::StorageError::Internal) if
    /// the lock is poisoned.
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        let mut names: Vec<String> = self.tables.read().map_err(poisoned)?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Database for MemoryDatabase {
    fn open(&self, name: &str) -> StorageResult<Box<dyn Table>> {
        Ok(Box::new(self.table(name)?))
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let removed = self.tables.write().map_err(poisoned)?.remove(name).is_some();
        debug!(table = name, removed, "removed memory table");
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_get_store() {
        let table = MemoryTable::new();
        table.store(b"key", Some(b"hello")).unwrap();
        assert_eq!(table.get(b"key").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn test_memory_get_missing() {
        let table = MemoryTable::new();
        assert!(table.get(b"missing").unwrap().is_none());
    }

    #[test]
    fn test_memory_overwrite() {
        let table = MemoryTable::new();
        table.store(b"k", Some(b"v1")).unwrap();
        table.store(b"k", Some(b"v2")).unwrap();
        assert_eq!(table.get(b"k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(table.len().unwrap(), 1);
    }

    #[test]
    fn test_memory_empty_value_is_not_absence() {
        let table = MemoryTable::new();
        table.store(b"k", Some(b"")).unwrap();
        assert_eq!(table.get(b"k").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_memory_delete() {
        let table = MemoryTable::new();
        table.store(b"k", Some(b"v")).unwrap();
        table.store(b"k", None).unwrap();
        table.store(b"k", None).unwrap();
        assert!(table.get(b"k").unwrap().is_none());
        assert!(table.is_empty().unwrap());
    }

    #[test]
    fn test_memory_list() {
        let table = MemoryTable::new();
        table.store(b"a", Some(b"1")).unwrap();
        table.store(b"b", Some(b"2")).unwrap();
        let mut keys = table.list().unwrap();
        keys.sort();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_database_open_reuses_table() {
        let db = MemoryDatabase::new();
        db.open("t").unwrap().store(b"k", Some(b"v")).unwrap();
        assert_eq!(db.open("t").unwrap().get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(db.open("other").unwrap().get(b"k").unwrap().is_none());
    }

    #[test]
    fn test_database_remove() {
        let db = MemoryDatabase::new();
        let t = db.open("t").unwrap();
        t.store(b"k", Some(b"v")).unwrap();

        db.remove("t").unwrap();
        db.remove("never-opened").unwrap();

        assert!(db.open("t").unwrap().get(b"k").unwrap().is_none());
        // The old handle still points at the detached table.
        assert_eq!(t.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_database_table_names() {
        let db = MemoryDatabase::new();
        db.open("b").unwrap();
        db.open("a").unwrap();
        assert_eq!(db.table_names().unwrap(), vec!["a", "b"]);
        db.close().unwrap();
    }
}
