//! Storage error types.
//!
//! A missing key is not an error: lookups return `Ok(None)`. Errors raised by
//! a backend are carried as the source of the variant unchanged, so callers
//! keep the original diagnostic.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend lacks the capability the operation needs (for example,
    /// key enumeration).
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the operation that could not be performed.
        operation: &'static str,
    },

    /// The table or database was closed.
    #[error("store is closed")]
    Closed,

    /// A table or backend name is not acceptable to the backend.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A stored value could not be decoded (or a value encoded).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An internal invariant failed (e.g. a poisoned lock).
    #[error("storage error: {0}")]
    Internal(String),

    /// I/O failure from the underlying storage.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reported by the redb backend.
    #[cfg(feature = "redb")]
    #[error(transparent)]
    Redb(#[from] redb::Error),

    /// Failure reported by the SQLite backend.
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Failure reported by any other backend.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    /// Build an [`Unsupported`](Self::Unsupported) error for `operation`.
    #[must_use]
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Wrap an error from a third-party backend.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    /// Returns `true` if this error reports a missing capability.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Map a poisoned lock into [`StorageError::Internal`].
pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Internal(e.to_string())
}
