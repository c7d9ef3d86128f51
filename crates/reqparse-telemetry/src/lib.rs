//! Structured logging for reqparse.
//!
//! The parser and file store emit `tracing` events; this crate installs a
//! `tracing-subscriber` pipeline (JSON or pretty) for binaries and tests that
//! want to see them.
//!
//! # Example
//!
//! ```rust,ignore
//! use reqparse_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!("ready");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
