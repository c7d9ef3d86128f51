//! Multipart form reading for file uploads.
//!
//! A `multipart/form-data` body is drained once, up front, into a
//! [`MultipartForm`]: text parts become form values and parts carrying a
//! filename become [`UploadedFile`]s. The parser then reads from the form
//! synchronously.
//!
//! # Example
//!
//! ```rust,ignore
//! use reqparse_extract::{read_multipart, rule, ExtractionContext, MultipartConfig, Parser};
//!
//! async fn upload(ctx: ExtractionContext, store: &FileStore) -> Result<String, ParseError> {
//!     let form = read_multipart(ctx.headers(), ctx.body().clone(), MultipartConfig::default()).await?;
//!     let ctx = ctx.with_multipart(form);
//!     Parser::with_store(&ctx, store).parse::<String>(&[rule::file("avatar", true)])
//! }
//! ```

use bytes::Bytes;
use http::{header, HeaderMap};
use std::io::{self, Cursor};

use crate::{ExtractionSource, ParseError};

/// Default maximum total body size for multipart (50 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum size per field (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Configuration for multipart parsing.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size per field in bytes.
    pub max_field_size: usize,
    /// Maximum number of fields allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: 100,
        }
    }
}

impl MultipartConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the maximum field size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum number of fields.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// A file received in a multipart form.
///
/// The client-supplied file name and content type are kept for inspection
/// only; storage never trusts them.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Create a new uploaded file.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        file_name: Option<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name,
            content_type,
            data: data.into(),
        }
    }

    /// Get the form field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the file name the client sent.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Get the content type the client claimed.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Opens the file contents as a readable, seekable stream.
    ///
    /// # Errors
    ///
    /// In-memory uploads always open; the `Result` keeps the signature of a
    /// disk-backed handle.
    pub fn open(&self) -> io::Result<Cursor<Bytes>> {
        Ok(Cursor::new(self.data.clone()))
    }
}

/// Text values and files read from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    values: Vec<(String, String)>,
    files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Adds a file.
    #[must_use]
    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Returns the first text value with the given name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first file uploaded under the given field name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field == name)
    }

    /// Returns all uploaded files in arrival order.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }
}

/// Reads a complete `multipart/form-data` body.
///
/// # Errors
///
/// Returns an error if:
/// - The Content-Type header is missing or has no boundary
/// - The body, a single field, or the field count exceeds `config`
/// - The multipart data is malformed or a text part is not UTF-8
pub async fn read_multipart(
    headers: &HeaderMap,
    body: Bytes,
    config: MultipartConfig,
) -> Result<MultipartForm, ParseError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .ok_or_else(|| {
            ParseError::decode(
                ExtractionSource::ContentType,
                "missing Content-Type, expected 'multipart/form-data'",
            )
        })?
        .to_str()
        .map_err(|_| {
            ParseError::decode(
                ExtractionSource::ContentType,
                "invalid UTF-8 in Content-Type header",
            )
        })?;

    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        ParseError::decode(
            ExtractionSource::ContentType,
            "missing or invalid boundary in multipart Content-Type",
        )
    })?;

    if body.len() > config.max_body_size {
        return Err(ParseError::Multipart(format!(
            "payload too large: max {} bytes, got {} bytes",
            config.max_body_size,
            body.len()
        )));
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = MultipartForm::new();
    let mut field_count = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ParseError::Multipart(format!("parse error: {e}")))?
    {
        if field_count >= config.max_fields {
            return Err(ParseError::Multipart(format!(
                "too many fields (max {})",
                config.max_fields
            )));
        }
        field_count += 1;

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(ToString::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| ParseError::Multipart(format!("failed to read field: {e}")))?;

        if data.len() > config.max_field_size {
            return Err(ParseError::Multipart(format!(
                "field '{name}' too large: max {} bytes, got {} bytes",
                config.max_field_size,
                data.len()
            )));
        }

        if file_name.is_some() {
            form.files
                .push(UploadedFile::new(name, file_name, content_type, data));
        } else {
            let value = String::from_utf8(data.to_vec()).map_err(|e| {
                ParseError::Multipart(format!("field '{name}' is not valid UTF-8: {e}"))
            })?;
            form.values.push((name, value));
        }
    }

    tracing::debug!(
        values = form.values.len(),
        files = form.files.len(),
        "read multipart form"
    );

    Ok(form)
}
