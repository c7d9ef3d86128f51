//! Typed configuration for reqparse.
//!
//! This crate holds the settings the request parser needs at runtime:
//! - where uploaded files are written and which sniffed extensions are accepted
//! - how logs are emitted
//!
//! Configuration is layered (defaults → file → env) and strict: unknown
//! fields in a file are rejected.
//!
//! # Example
//!
//! ```no_run
//! use reqparse_config::ConfigLoader;
//!
//! # fn main() -> Result<(), reqparse_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("reqparse.toml")?
//!     .with_env_prefix("REQPARSE")
//!     .load()?;
//!
//! println!("uploads go to {}", config.storage.base_dir.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [storage]
//! base_dir = "storage"
//! allowed_extensions = [".png", ".jpg", ".jpeg", ".pdf"]
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `REQPARSE__STORAGE__BASE_DIR=/srv/uploads`
//! - `REQPARSE__STORAGE__ALLOWED_EXTENSIONS=.png,.pdf`
//! - `REQPARSE__LOGGING__LEVEL=debug`
//! - `REQPARSE__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
