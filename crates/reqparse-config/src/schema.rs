//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions accepted for uploads when nothing else is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    // images
    ".png", ".jpg", ".jpeg",
    // video
    ".ogv", ".jpm", ".mp4", ".webm", ".mpg", ".mpeg", ".mpe", ".mpv", ".ogg", ".qt", ".3gp",
    ".flv", ".swf", ".avi", ".mov", ".wmv", ".yuv", ".rm", ".rmvb",
    // documents and archives
    ".xlsx", ".zip", ".7z", ".docx", ".pptx", ".csv", ".gz", ".pdf",
];

/// Upload storage section.
///
/// Owned by the file store that writes uploads; there is no process-wide
/// copy of these values.
///
/// # Example
///
/// ```
/// use reqparse_config::StorageConfig;
///
/// let config = StorageConfig::default()
///     .with_base_dir("/var/uploads")
///     .with_allowed_extensions([".png", ".pdf", ".png"]);
///
/// assert_eq!(config.base_dir.to_str(), Some("/var/uploads"));
/// assert_eq!(config.allowed_extensions, vec![".png", ".pdf"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory that receives stored uploads.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Sniffed extensions (with leading dot) accepted for uploads.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl StorageConfig {
    /// Replaces the base directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Replaces the allow-list. Duplicates are dropped, first position kept.
    #[must_use]
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowed: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.into();
            if !allowed.contains(&ext) {
                allowed.push(ext);
            }
        }
        self.allowed_extensions = allowed;
        self
    }

    /// Returns true if `extension` is on the allow-list.
    #[must_use]
    pub fn allows(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }

    /// Joins a stored file name onto the base directory.
    #[must_use]
    pub fn path_of(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(file_name)
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|e| (*e).to_string())
        .collect()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. `info`, `reqparse_extract=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> reqparse_telemetry::LogConfig {
        reqparse_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi: self.ansi_enabled,
            file_line_info: self.include_location,
            service_name: service_name.to_string(),
            ..reqparse_telemetry::LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.base_dir, PathBuf::from("storage"));
        assert_eq!(config.allowed_extensions.len(), DEFAULT_ALLOWED_EXTENSIONS.len());
        assert!(config.allows(".png"));
        assert!(config.allows(".pdf"));
        assert!(!config.allows(".exe"));
        assert!(!config.allows("png"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let toml = r#"
            base_dir = "/srv/uploads"
        "#;
        let config: StorageConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.base_dir, PathBuf::from("/srv/uploads"));
        // Defaults applied
        assert!(config.allows(".jpg"));
    }

    #[test]
    fn test_storage_config_unknown_field_rejected() {
        let toml = r#"
            base_dir = "/srv/uploads"
            max_size = 10
        "#;
        let result: Result<StorageConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_with_allowed_extensions_dedups() {
        let config = StorageConfig::default().with_allowed_extensions(vec![
            ".gif".to_string(),
            ".png".to_string(),
            ".gif".to_string(),
        ]);

        assert_eq!(config.allowed_extensions, vec![".gif", ".png"]);
        assert!(!config.allows(".jpg"));
    }

    #[test]
    fn test_path_of() {
        let config = StorageConfig::default().with_base_dir("/tmp/up");
        assert_eq!(config.path_of("a.png"), PathBuf::from("/tmp/up/a.png"));
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_to_log_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        };

        let log = config.to_log_config("uploads");
        assert_eq!(log.level, "debug");
        assert!(!log.json_format);
        assert!(log.file_line_info);
        assert_eq!(log.service_name, "uploads");
    }
}
