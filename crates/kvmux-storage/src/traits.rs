//! Table and database contracts.

use std::sync::Arc;

use crate::error::{StorageError, StorageResult};

/// A key-value table over byte-string keys.
///
/// This is also the flat keyspace consumed by
/// [`MultiplexedDatabase`](crate::MultiplexedDatabase): any table can hold
/// the keys of many logical tables.
///
/// Implementations must:
/// - distinguish a missing key (`Ok(None)`) from a stored empty value
///   (`Ok(Some(vec![]))`);
/// - treat `store(key, None)` as delete;
/// - report `Unsupported` from [`list`](Self::list) when they cannot
///   enumerate, never an empty list;
/// - make [`close`](Self::close) idempotent;
/// - propagate backend failures unchanged.
pub trait Table: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// `None` removes the key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()>;

    /// List every key currently stored, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] if the backend cannot enumerate
    /// its keys (the default), or an error if the backend fails.
    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        Err(StorageError::unsupported("list"))
    }

    /// Release the table's resources. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release its resources.
    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// A collection of named tables.
pub trait Database: Send + Sync {
    /// Open the table `name`, creating it if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or rejects the name.
    fn open(&self, name: &str) -> StorageResult<Box<dyn Table>>;

    /// Remove the table `name` and all of its keys.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unsupported`] if the database cannot find the
    /// table's keys, or an error if the backend fails.
    fn remove(&self, name: &str) -> StorageResult<()>;

    /// Close the database and its backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to release its resources.
    fn close(&self) -> StorageResult<()>;
}

impl<T: Table + ?Sized> Table for Arc<T> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        (**self).store(key, value)
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        (**self).list()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}

impl<T: Table + ?Sized> Table for Box<T> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        (**self).store(key, value)
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        (**self).list()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}
