//! Mock tables for exercising capability and failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};

use kvmux_storage::{MemoryTable, StorageError, StorageResult, Table};

/// A working table that cannot enumerate its keys.
///
/// `get` and `store` behave like [`MemoryTable`]; `list` keeps the trait's
/// default and reports [`StorageError::Unsupported`].
#[derive(Debug, Default)]
pub struct UnlistableTable {
    inner: MemoryTable,
}

impl UnlistableTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Table for UnlistableTable {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        self.inner.store(key, value)
    }
}

/// The error kind and message every [`FailingTable`] operation returns.
pub const FAILING_TABLE_MESSAGE: &str = "backend unavailable";

/// A table whose every operation fails with a backend I/O error.
///
/// The error is an [`std::io::Error`] of kind `ConnectionRefused` wrapped in
/// [`StorageError::Backend`], so tests can check it arrives unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingTable;

impl FailingTable {
    fn fail<T>() -> StorageResult<T> {
        Err(StorageError::backend(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            FAILING_TABLE_MESSAGE,
        )))
    }
}

impl Table for FailingTable {
    fn get(&self, _key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Self::fail()
    }

    fn store(&self, _key: &[u8], _value: Option<&[u8]>) -> StorageResult<()> {
        Self::fail()
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        Self::fail()
    }

    fn close(&self) -> StorageResult<()> {
        Self::fail()
    }
}

/// A [`MemoryTable`] that counts calls, including `close`.
#[derive(Debug, Default)]
pub struct CountingTable {
    inner: MemoryTable,
    gets: AtomicUsize,
    stores: AtomicUsize,
    lists: AtomicUsize,
    closes: AtomicUsize,
}

impl CountingTable {
    /// Create an empty table with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls.
    #[must_use]
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `store` calls.
    #[must_use]
    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Number of `list` calls.
    #[must_use]
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Table for CountingTable {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn store(&self, key: &[u8], value: Option<&[u8]>) -> StorageResult<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.inner.store(key, value)
    }

    fn list(&self) -> StorageResult<Vec<Vec<u8>>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list()
    }

    fn close(&self) -> StorageResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
