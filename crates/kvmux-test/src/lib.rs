//! kvmux Test - Shared test utilities for kvmux storage.
//!
//! Mock tables with controlled capabilities and failures, fixtures for the
//! common scenarios, and harness helpers for temporary files and logging.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! kvmux-test.workspace = true
//! ```
//!
//! Then in an integration test:
//!
//! ```rust
//! use kvmux_storage::{MultiplexedDatabase, Table};
//! use kvmux_test::UnlistableTable;
//!
//! let db = MultiplexedDatabase::from_table(UnlistableTable::new());
//! let err = db.open_table("t").list().unwrap_err();
//! assert!(err.is_unsupported());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
