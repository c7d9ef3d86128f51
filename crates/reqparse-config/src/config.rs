//! Main configuration types.
//!
//! This module provides the top-level [`ReqparseConfig`] struct and its builder.

use serde::{Deserialize, Serialize};
use std::path::Component;

use crate::{ConfigError, LogFormat, LoggingConfig, StorageConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Complete configuration for request parsing and upload storage.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use reqparse_config::ReqparseConfig;
///
/// let config = ReqparseConfig::default();
/// assert_eq!(config.storage.base_dir.to_str(), Some("storage"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReqparseConfig {
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReqparseConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ReqparseConfigBuilder {
        ReqparseConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `storage.base_dir` is empty
    /// - an allowed extension lacks its leading dot or contains a separator
    /// - `logging.level` is neither a plain level nor a filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value(
                "storage.base_dir",
                "must not be empty",
            ));
        }

        if self
            .storage
            .base_dir
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(ConfigError::invalid_value(
                "storage.base_dir",
                format!("must not contain '..': {}", self.storage.base_dir.display()),
            ));
        }

        for ext in &self.storage.allowed_extensions {
            if ext.len() < 2 || !ext.starts_with('.') {
                return Err(ConfigError::invalid_value(
                    "storage.allowed_extensions",
                    format!("'{ext}' must start with '.' and name an extension"),
                ));
            }
            if ext.contains(['/', '\\']) || ext[1..].contains('.') {
                return Err(ConfigError::invalid_value(
                    "storage.allowed_extensions",
                    format!("'{ext}' must be a single extension"),
                ));
            }
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) && !level.contains('=') {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {}", self.logging.level),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, colored debug logs with source locations; uploads go to a
    /// local `storage/` directory.
    ///
    /// # Example
    ///
    /// ```
    /// use reqparse_config::ReqparseConfig;
    ///
    /// let config = ReqparseConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use reqparse_config::ReqparseConfig;
    ///
    /// let config = ReqparseConfig::production();
    /// assert_eq!(config.logging.format, reqparse_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config
    }
}

/// Builder for [`ReqparseConfig`].
#[derive(Debug, Default)]
pub struct ReqparseConfigBuilder {
    storage: Option<StorageConfig>,
    logging: Option<LoggingConfig>,
}

impl ReqparseConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage configuration.
    #[must_use]
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> ReqparseConfig {
        ReqparseConfig {
            storage: self.storage.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ReqparseConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
