//! kvmux Telemetry - Logging setup for kvmux tools.
//!
//! Libraries in this workspace only emit `tracing` events; binaries call
//! [`setup_logging`] once at startup to decide where those events go.
//! [`subscriber`] builds the same subscriber without installing it, for
//! scoped use with `tracing::subscriber::with_default`.
//!
//! # Example
//!
//! ```rust,no_run
//! use kvmux_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), kvmux_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("kvmux_storage=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging, subscriber};
