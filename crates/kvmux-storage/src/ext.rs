//! String and JSON convenience on top of any [`Table`].

use crate::error::{StorageError, StorageResult};
use crate::traits::Table;

/// Typed helpers available on every [`Table`].
///
/// ```rust
/// use kvmux_storage::{MemoryTable, TableExt};
///
/// # fn main() -> kvmux_storage::StorageResult<()> {
/// let table = MemoryTable::new();
/// table.store_str("greeting", Some("hello"))?;
/// assert_eq!(table.get_str("greeting")?.as_deref(), Some("hello"));
/// # Ok(())
/// # }
/// ```
pub trait TableExt: Table {
    /// Get a UTF-8 value by string key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the stored value is not
    /// valid UTF-8.
    fn get_str(&self, key: &str) -> StorageResult<Option<String>> {
        self.get(key.as_bytes())?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// Store a string value under a string key; `None` deletes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn store_str(&self, key: &str, value: Option<&str>) -> StorageResult<()> {
        self.store(key.as_bytes(), value.map(str::as_bytes))
    }

    /// Deserialize a JSON value.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if deserialization fails.
    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &[u8]) -> StorageResult<Option<T>> {
        self.get(key)?
            .map(|b| {
                serde_json::from_slice(&b).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// Serialize a value as JSON and store it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if serialization fails.
    fn store_json<T: serde::Serialize + ?Sized>(&self, key: &[u8], value: &T) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store(key, Some(&bytes))
    }

    /// Check whether `key` holds a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: Table + ?Sized> TableExt for T {}
