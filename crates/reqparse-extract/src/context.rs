//! Request access for the parser.
//!
//! [`RequestSource`] is the seam between the parser and whatever HTTP stack
//! hosts it. [`ExtractionContext`] is the in-memory implementation over
//! `http` types that ships with this crate.

use crate::multipart::{MultipartForm, UploadedFile};
use crate::{ExtractionSource, Params, ParseError};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

/// Default maximum body size for whole-body decoding (1 MB).
const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// What the parser needs from an inbound request.
///
/// Single-value lookups return `None` when the key is absent. The parser
/// treats an empty string the same way.
pub trait RequestSource {
    /// Decodes the whole request body.
    ///
    /// # Errors
    ///
    /// Returns a decode error describing why the body could not be decoded.
    fn decode_body<T: DeserializeOwned>(&self) -> Result<T, ParseError>;

    /// Decodes the whole query string.
    ///
    /// # Errors
    ///
    /// Returns a decode error describing why the query could not be decoded.
    fn decode_query<T: DeserializeOwned>(&self) -> Result<T, ParseError>;

    /// Returns a single form value.
    fn form_value(&self, key: &str) -> Option<String>;

    /// Returns a single query parameter.
    fn query_value(&self, key: &str) -> Option<String>;

    /// Returns a single path parameter.
    fn path_value(&self, key: &str) -> Option<String>;

    /// Returns an uploaded file by form field name.
    fn file(&self, key: &str) -> Option<&UploadedFile>;
}

/// Context providing access to all parts of an HTTP request.
///
/// # Example
///
/// ```rust
/// use reqparse_extract::{ExtractionContext, Params, RequestSource};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/users/123?active=true"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_value("id").as_deref(), Some("123"));
/// assert_eq!(ctx.query_value("active").as_deref(), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    multipart: Option<MultipartForm>,
}

impl ExtractionContext {
    /// Creates a new extraction context.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            multipart: None,
        }
    }

    /// Attaches a multipart form read with [`crate::read_multipart`].
    #[must_use]
    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.multipart = Some(form);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body as bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the matched path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the attached multipart form, if any.
    #[must_use]
    pub fn multipart(&self) -> Option<&MultipartForm> {
        self.multipart.as_ref()
    }

    /// Returns a specific header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    fn media_type(&self) -> Option<mime::Mime> {
        self.content_type().and_then(|ct| ct.parse().ok())
    }

    fn is_urlencoded(&self) -> bool {
        self.media_type()
            .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
    }

    fn body_str(&self) -> Result<&str, ParseError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| ParseError::decode(ExtractionSource::Body, format!("invalid UTF-8: {e}")))
    }

    fn urlencoded_body_value(&self, key: &str) -> Option<String> {
        if !self.is_urlencoded() {
            return None;
        }
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body).ok()?;
        pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl RequestSource for ExtractionContext {
    fn decode_body<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        if self.body.len() > DEFAULT_MAX_BODY_SIZE {
            return Err(ParseError::decode(
                ExtractionSource::Body,
                format!(
                    "payload too large: max {DEFAULT_MAX_BODY_SIZE} bytes, got {} bytes",
                    self.body.len()
                ),
            ));
        }

        if self.body.is_empty() {
            return Err(ParseError::decode(ExtractionSource::Body, "empty request body"));
        }

        match self.media_type() {
            None => decode_json(&self.body),
            Some(m) if m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON) => {
                decode_json(&self.body)
            }
            Some(_) if self.is_urlencoded() => serde_urlencoded::from_str(self.body_str()?)
                .map_err(|e| ParseError::decode(ExtractionSource::Body, e.to_string())),
            Some(m) => Err(ParseError::decode(
                ExtractionSource::ContentType,
                format!(
                    "unsupported content type: expected 'application/json' or \
                     'application/x-www-form-urlencoded', got '{m}'"
                ),
            )),
        }
    }

    fn decode_query<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        let query_string = self.query_string().unwrap_or("");

        serde_urlencoded::from_str(query_string)
            .map_err(|e| ParseError::decode(ExtractionSource::Query, e.to_string()))
    }

    fn form_value(&self, key: &str) -> Option<String> {
        self.multipart
            .as_ref()
            .and_then(|form| form.value(key))
            .map(String::from)
            .or_else(|| self.urlencoded_body_value(key))
    }

    fn query_value(&self, key: &str) -> Option<String> {
        let pairs: Vec<(String, String)> =
            serde_urlencoded::from_str(self.query_string()?).ok()?;
        pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn path_value(&self, key: &str) -> Option<String> {
        self.path_params.get(key).map(String::from)
    }

    fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.multipart.as_ref().and_then(|form| form.file(key))
    }
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ParseError> {
    serde_json::from_slice(body).map_err(|e| ParseError::decode(ExtractionSource::Body, e.to_string()))
}

/// Builder for constructing an `ExtractionContext`.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    multipart: Option<MultipartForm>,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header. Invalid header values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Attaches an already-read multipart form.
    #[must_use]
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.multipart = Some(form);
        self
    }

    /// Builds the extraction context. Method defaults to `GET` and the URI
    /// to `/`.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            body: self.body,
            path_params: self.path_params,
            multipart: self.multipart,
        }
    }
}
