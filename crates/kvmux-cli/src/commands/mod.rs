//! CLI command implementations.

pub(crate) mod table;
