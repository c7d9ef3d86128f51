//! The rule-driven typed parser.
//!
//! [`Parser`] merges a rule set, reads the addressed value from a
//! [`RequestSource`], and turns it into the caller's declared type. Field
//! failures are reported under the snake_case form of the rule key.
//!
//! # Example
//!
//! ```rust
//! use reqparse_extract::{rule, ExtractionContextBuilder, Parser};
//! use http::Uri;
//!
//! let ctx = ExtractionContextBuilder::new()
//!     .uri(Uri::from_static("/users?userId=42&active=true"))
//!     .build();
//! let parser = Parser::new(&ctx);
//!
//! let id: i64 = parser.parse(&[rule::query("userId", true)]).unwrap();
//! let active: bool = parser.parse(&[rule::query("active", false)]).unwrap();
//! assert_eq!(id, 42);
//! assert!(active);
//!
//! let err = parser.parse::<i32>(&[rule::query("pageSize", true)]).unwrap_err();
//! assert_eq!(err.to_string(), "page_size: NOT_BLANK");
//! ```

use std::borrow::Cow;

use crate::context::RequestSource;
use crate::convert::{convert, Extract, PayloadSource, ScalarKind};
use crate::rule::{ResolvedRule, RuleFragment, SourceKind};
use crate::storage::FileStore;
use crate::{to_snake_case, ErrorCode, ParseError};

/// Extracts typed values from one request.
///
/// The parser borrows its request and file store; it is cheap to create per
/// request and holds no state between calls.
#[derive(Debug)]
pub struct Parser<'a, C: RequestSource> {
    ctx: &'a C,
    store: Cow<'a, FileStore>,
}

impl<'a, C: RequestSource> Parser<'a, C> {
    /// Creates a parser whose uploads go to the default storage directory.
    #[must_use]
    pub fn new(ctx: &'a C) -> Self {
        Self {
            ctx,
            store: Cow::Owned(FileStore::default()),
        }
    }

    /// Creates a parser that persists uploads through `store`.
    #[must_use]
    pub fn with_store(ctx: &'a C, store: &'a FileStore) -> Self {
        Self {
            ctx,
            store: Cow::Borrowed(store),
        }
    }

    /// Returns the file store used for file rules.
    #[must_use]
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Merges `rules` and extracts a `T`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::EmptyRules`] when `rules` is empty
    /// - any error from [`parse_resolved`](Self::parse_resolved)
    pub fn parse<T: Extract>(&self, rules: &[RuleFragment]) -> Result<T, ParseError> {
        let rule = ResolvedRule::merge(rules)?;
        tracing::debug!(
            source = rule.source().map_or("unset", SourceKind::as_str),
            key = rule.key(),
            required = rule.is_required(),
            "resolved parser rule"
        );
        self.parse_resolved(&rule)
    }

    /// Extracts a `T` according to an already merged rule.
    ///
    /// # Errors
    ///
    /// Configuration mistakes:
    /// - [`ParseError::UnsupportedSource`] when the rule has no source
    /// - [`ParseError::MissingKey`] for a keyed source with an empty key
    /// - [`ParseError::UnsupportedTarget`] when `T` is not a scalar but the
    ///   source addresses a single value
    ///
    /// Request problems:
    /// - [`ParseError::Field`] with `NOT_BLANK`, `MUST_NUMBER`, `NOT_VALID`
    ///   or `EXTENSION_NOT_ALLOWED`
    /// - decode and I/O errors from the request or file store, unchanged
    pub fn parse_resolved<T: Extract>(&self, rule: &ResolvedRule) -> Result<T, ParseError> {
        let source = rule.source().ok_or(ParseError::UnsupportedSource)?;

        match source {
            SourceKind::Body => T::decode_payload(self.ctx, PayloadSource::Body),
            SourceKind::Query => T::decode_payload(self.ctx, PayloadSource::Query),
            SourceKind::FormField | SourceKind::QueryField | SourceKind::PathField => {
                let kind = single_field_kind::<T>(source, rule.key())?;
                let raw = match source {
                    SourceKind::FormField => self.ctx.form_value(rule.key()),
                    SourceKind::QueryField => self.ctx.query_value(rule.key()),
                    _ => self.ctx.path_value(rule.key()),
                };
                self.convert_raw(kind, raw.as_deref(), rule)
            }
            SourceKind::FileField => {
                let kind = single_field_kind::<T>(source, rule.key())?;
                let field = to_snake_case(rule.key());
                let stored = self
                    .store
                    .save(self.ctx.file(rule.key()), &field, rule.is_required())?;

                match stored {
                    Some(stored) => finish(convert(kind, stored.generated_name(), &field)?),
                    None => finish(kind.zero()),
                }
            }
        }
    }

    fn convert_raw<T: Extract>(
        &self,
        kind: ScalarKind,
        raw: Option<&str>,
        rule: &ResolvedRule,
    ) -> Result<T, ParseError> {
        match raw {
            Some(raw) if !raw.is_empty() => {
                let field = to_snake_case(rule.key());
                let value = convert(kind, raw, &field).map_err(|err| {
                    reqparse_telemetry::log_field_rejected!(err.field(), err.code());
                    err
                })?;
                finish(value)
            }
            _ if rule.is_required() => {
                let field = to_snake_case(rule.key());
                reqparse_telemetry::log_field_rejected!(field, ErrorCode::NotBlank);
                Err(ParseError::field(field, ErrorCode::NotBlank))
            }
            // An optional empty value is treated like an absent one.
            _ => finish(kind.zero()),
        }
    }
}

/// Checks that a keyed rule has a key and `T` is a scalar.
fn single_field_kind<T: Extract>(source: SourceKind, key: &str) -> Result<ScalarKind, ParseError> {
    if key.is_empty() {
        return Err(ParseError::MissingKey(source.as_str()));
    }
    T::KIND.ok_or(ParseError::UnsupportedTarget(std::any::type_name::<T>()))
}

fn finish<T: Extract>(value: crate::convert::Scalar) -> Result<T, ParseError> {
    T::from_scalar(value).ok_or(ParseError::UnsupportedTarget(std::any::type_name::<T>()))
}
