//! kvmux Storage - uniform key-value tables over interchangeable backends.
//!
//! # Contracts
//!
//! - [`Table`]: byte-level `get` / `store` / `list` / `close`. A value of
//!   `None` is the absence marker: storing it deletes the key, and `get`
//!   returns it for missing keys. `Some(b"")` is a real, stored empty value.
//!   Enumeration (`list`) is optional; backends that cannot enumerate return
//!   [`StorageError::Unsupported`].
//! - [`Database`]: a set of named tables with `open` / `remove` / `close`.
//!
//! # Multiplexing
//!
//! [`MultiplexedDatabase`] exposes any number of logical tables over a single
//! flat [`Table`]. Each table name is encoded by the [`codec`] into an
//! escaped, separator-terminated prefix that is prepended to every key. The
//! encoding is injective and prefix-free, so keys of different tables never
//! collide, whatever bytes the names or keys contain.
//!
//! # Backends
//!
//! | Backend | Table | Database | Feature |
//! |---------|-------|----------|---------|
//! | In-memory map | [`MemoryTable`] | [`MemoryDatabase`] | *(always)* |
//! | redb single file | `RedbTable` | `RedbDatabase` | `redb` |
//! | SQLite | `SqlTable` | `SqlDatabase` | `sqlite` |
//!
//! # Example
//!
//! ```rust
//! use kvmux_storage::{MemoryTable, MultiplexedDatabase, Table};
//!
//! # fn main() -> kvmux_storage::StorageResult<()> {
//! let db = MultiplexedDatabase::from_table(MemoryTable::new());
//! let fruit = db.open_table("fruit");
//! let animals = db.open_table("animals");
//!
//! fruit.store(b"apple", Some(b"red or green"))?;
//! animals.store(b"apple", Some(b"not really an animal"))?;
//!
//! assert_eq!(fruit.get(b"apple")?.as_deref(), Some(&b"red or green"[..]));
//! assert_eq!(animals.get(b"apple")?.as_deref(), Some(&b"not really an animal"[..]));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod codec;
pub mod error;
pub mod ext;
pub mod memory;
pub mod mux;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "sqlite")]
pub mod sql;

pub use error::{StorageError, StorageResult};
pub use ext::TableExt;
pub use memory::{MemoryDatabase, MemoryTable};
pub use mux::{MultiplexedDatabase, MultiplexedTable};
pub use traits::{Database, Table};

#[cfg(feature = "redb")]
pub use crate::redb::{RedbDatabase, RedbTable};

#[cfg(feature = "sqlite")]
pub use sql::{SqlDatabase, SqlTable};
