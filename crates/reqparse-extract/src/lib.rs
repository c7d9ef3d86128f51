//! # reqparse extract
//!
//! Rule-driven extraction of typed values from HTTP requests, plus
//! validation and storage of uploaded files.
//!
//! A call names *where* a value lives with a rule, and *what* it should
//! become with a type parameter:
//!
//! | Rule | Reads | Target |
//! |------|-------|--------|
//! | [`rule::body_parser()`] | whole body (JSON or URL-encoded) | [`Payload<T>`] or scalar |
//! | [`rule::query_parser()`] | whole query string | [`Payload<T>`] or scalar |
//! | [`rule::form(key, required)`](rule::form) | one form field | scalar |
//! | [`rule::query(key, required)`](rule::query) | one query parameter | scalar |
//! | [`rule::params(key, required)`](rule::params) | one path parameter | scalar |
//! | [`rule::file(key, required)`](rule::file) | one multipart file | `String` (stored name) |
//!
//! Scalars are `i8`, `i16`, `i32`, `i64`, `isize`, `bool`, `f64` and `String`.
//!
//! ## Example
//!
//! ```rust
//! use reqparse_extract::{rule, ErrorCode, ExtractionContextBuilder, Parser};
//! use http::Uri;
//!
//! let ctx = ExtractionContextBuilder::new()
//!     .uri(Uri::from_static("/orders/7?includeItems=t"))
//!     .path_param("orderId", "7")
//!     .build();
//! let parser = Parser::new(&ctx);
//!
//! let order_id: i64 = parser.parse(&[rule::params("orderId", true)]).unwrap();
//! let include: bool = parser.parse(&[rule::query("includeItems", false)]).unwrap();
//! assert_eq!((order_id, include), (7, true));
//!
//! let err = parser.parse::<i32>(&[rule::query("maxPrice", true)]).unwrap_err();
//! let field = err.as_field().unwrap();
//! assert_eq!(field.field(), "max_price");
//! assert_eq!(field.code(), ErrorCode::NotBlank);
//! ```
//!
//! ## Error Handling
//!
//! [`ParseError`] separates three groups:
//! - field failures ([`FieldError`]: `NOT_BLANK`, `MUST_NUMBER`, `NOT_VALID`,
//!   `EXTENSION_NOT_ALLOWED`), reported under the snake_case key
//! - configuration mistakes (empty rules, unset source, missing key,
//!   unsupported target type)
//! - decode and I/O failures, passed through unchanged

#![doc(html_root_url = "https://docs.rs/reqparse-extract/0.1.0")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod case;
mod context;
pub mod convert;
mod error;
mod multipart;
mod params;
mod parser;
pub mod rule;
mod sniff;
mod storage;

pub use case::to_snake_case;
pub use context::{ExtractionContext, ExtractionContextBuilder, RequestSource};
pub use convert::{Extract, Payload, Scalar, ScalarKind};
pub use error::{ErrorCode, ExtractionSource, FieldError, ParseError};
pub use multipart::{
    read_multipart, MultipartConfig, MultipartForm, UploadedFile, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_MAX_FIELD_SIZE,
};
pub use params::Params;
pub use parser::Parser;
pub use reqparse_config::{StorageConfig, DEFAULT_ALLOWED_EXTENSIONS};
pub use rule::{ResolvedRule, RuleFragment, SourceKind};
pub use sniff::{detect_extension, validate, validate_with, SNIFF_LEN};
pub use storage::{FileStore, StoredFile};
