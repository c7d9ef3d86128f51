//! # reqparse
//!
//! **Rule-driven typed extraction of HTTP request fields, with validated
//! file uploads.**
//!
//! - Pull one typed value (or a whole decoded body/query) out of a request
//!   by naming a rule and a target type
//! - Report failures per field, under the snake_case key, with a stable code
//! - Accept uploads only when their sniffed content is on an allow-list, and
//!   store them under a generated name
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reqparse::prelude::*;
//!
//! let config = ConfigLoader::new().with_env_prefix("REQPARSE").load()?;
//! let store = reqparse::init(&config)?;
//!
//! let form = read_multipart(ctx.headers(), ctx.body().clone(), MultipartConfig::default()).await?;
//! let ctx = ctx.with_multipart(form);
//! let parser = Parser::with_store(&ctx, &store);
//!
//! let email: String = parser.parse(&[rule::form("email", true)])?;
//! let avatar: String = parser.parse(&[rule::file("avatar", false)])?;
//! ```

#![doc(html_root_url = "https://docs.rs/reqparse/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export extraction types
pub use reqparse_extract as extract;

// Re-export configuration types
pub use reqparse_config as config;

// Re-export logging setup
pub use reqparse_telemetry as telemetry;

/// Service name recorded by [`init`] when it sets up logging.
pub const SERVICE_NAME: &str = "reqparse";

/// Errors raised while assembling the parser's runtime pieces.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] reqparse_config::ConfigError),

    /// The global log subscriber could not be installed.
    #[error(transparent)]
    Telemetry(#[from] reqparse_telemetry::TelemetryError),
}

/// Validates `config`, installs logging, and builds the file store.
///
/// # Errors
///
/// Returns [`InitError::Config`] for invalid configuration and
/// [`InitError::Telemetry`] if a global subscriber is already installed.
pub fn init(
    config: &reqparse_config::ReqparseConfig,
) -> Result<reqparse_extract::FileStore, InitError> {
    config.validate()?;
    reqparse_telemetry::init_logging(&config.logging.to_log_config(SERVICE_NAME))?;
    Ok(reqparse_extract::FileStore::new(config.storage.clone()))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use reqparse::prelude::*;
///
/// let ctx = ExtractionContextBuilder::new().build();
/// let value: i32 = Parser::new(&ctx).parse(&[rule::query("page", false)]).unwrap();
/// assert_eq!(value, 0);
/// ```
pub mod prelude {
    pub use reqparse_extract::rule;
    pub use reqparse_extract::{
        read_multipart, ErrorCode, ExtractionContext, ExtractionContextBuilder, FieldError,
        FileStore, MultipartConfig, ParseError, Parser, Payload, RequestSource, StoredFile,
        UploadedFile,
    };

    pub use reqparse_config::{ConfigLoader, ReqparseConfig, StorageConfig};
    pub use reqparse_telemetry::{init_logging, LogConfig};
}
