//! Extraction error types.
//!
//! Two layers live here. [`FieldError`] is the expected, user-facing
//! validation failure: a snake_case field name plus a fixed [`ErrorCode`].
//! [`ParseError`] wraps it together with configuration mistakes and
//! collaborator failures (decoding, multipart, disk I/O).

use http::StatusCode;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Where a value was being read from when a collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters (e.g., `/users/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// Request body (JSON, form, multipart)
    Body,
    /// Content-Type header specifically
    ContentType,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// Machine-readable reason attached to a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Required value is absent or empty.
    NotBlank,
    /// Value is not a number, or does not fit the target width.
    MustNumber,
    /// Value is not one of the accepted literals (booleans).
    NotValid,
    /// Uploaded content sniffed as an extension outside the allow-list.
    ExtensionNotAllowed,
}

impl ErrorCode {
    /// Returns the wire form of the code, e.g. `NOT_BLANK`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotBlank => "NOT_BLANK",
            Self::MustNumber => "MUST_NUMBER",
            Self::NotValid => "NOT_VALID",
            Self::ExtensionNotAllowed => "EXTENSION_NOT_ALLOWED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure scoped to a single request field.
///
/// The field name is always the snake_case rendering of the key the caller
/// asked for, so `userId` is reported as `user_id`.
///
/// # Example
///
/// ```rust
/// use reqparse_extract::{ErrorCode, FieldError};
///
/// let err = FieldError::new("email", ErrorCode::NotBlank);
/// assert_eq!(err.to_inline(), r#""email":"NOT_BLANK""#);
/// assert_eq!(err.to_map().get("email").map(String::as_str), Some("NOT_BLANK"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    field: String,
    code: ErrorCode,
}

impl FieldError {
    /// Creates a field error. `field` is stored as given.
    #[must_use]
    pub fn new(field: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            field: field.into(),
            code,
        }
    }

    /// Returns the (snake_case) field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the reason code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Renders the error as a single-entry `{field: code}` map.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([(self.field.clone(), self.code.as_str().to_string())])
    }

    /// Renders the error as a compact `"field":"CODE"` fragment, ready to be
    /// embedded in a larger JSON object. The field name is JSON-escaped.
    #[must_use]
    pub fn to_inline(&self) -> String {
        // Serializing a &str cannot fail.
        let field = serde_json::to_string(&self.field).unwrap_or_default();
        format!("{field}:\"{}\"", self.code.as_str())
    }

    /// Returns the HTTP status a handler should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.code {
            ErrorCode::ExtensionNotAllowed => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.code)
    }
}

impl std::error::Error for FieldError {}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, self.code.as_str())?;
        map.end()
    }
}

/// Error returned by the parser and the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A field-scoped validation failure.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The parser was called without any rule fragment.
    #[error("please provide at least one request parser rule")]
    EmptyRules,

    /// The merged rule names no source kind.
    #[error("unsupported request type")]
    UnsupportedSource,

    /// The declared result type cannot be produced from a single raw value.
    #[error("unsupported parser type: {0}")]
    UnsupportedTarget(&'static str),

    /// A single-field source kind was resolved without a key.
    #[error("missing key for {0} rule")]
    MissingKey(&'static str),

    /// The request collaborator failed to decode a payload.
    #[error("failed to decode {location}: {message}")]
    Decode {
        /// Which part of the request was being decoded.
        location: ExtractionSource,
        /// Decoder message, passed through unchanged.
        message: String,
    },

    /// The multipart body could not be read.
    #[error("multipart error: {0}")]
    Multipart(String),

    /// Opening, reading or persisting a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Creates a decode error for the given source.
    #[must_use]
    pub fn decode(location: ExtractionSource, message: impl Into<String>) -> Self {
        Self::Decode {
            location,
            message: message.into(),
        }
    }

    /// Shorthand for a field-scoped error.
    #[must_use]
    pub fn field(field: impl Into<String>, code: ErrorCode) -> Self {
        Self::Field(FieldError::new(field, code))
    }

    /// Returns the inner field error, if this is a validation failure.
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldError> {
        match self {
            Self::Field(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true for programmer mistakes (bad rules, bad target type).
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyRules
                | Self::UnsupportedSource
                | Self::UnsupportedTarget(_)
                | Self::MissingKey(_)
        )
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Field(err) => err.status_code(),
            Self::Decode { .. } | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::EmptyRules
            | Self::UnsupportedSource
            | Self::UnsupportedTarget(_)
            | Self::MissingKey(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Field(err) => err.code().as_str(),
            Self::EmptyRules => "EMPTY_RULES",
            Self::UnsupportedSource => "UNSUPPORTED_REQUEST_TYPE",
            Self::UnsupportedTarget(_) => "UNSUPPORTED_PARSER_TYPE",
            Self::MissingKey(_) => "MISSING_RULE_KEY",
            Self::Decode { .. } => "DESERIALIZATION_FAILED",
            Self::Multipart(_) => "MULTIPART_FAILED",
            Self::Io(_) => "IO_FAILED",
        }
    }
}
