//! Rule fragments and their merge into a resolved extraction rule.
//!
//! Each constructor in this module describes one facet of what the parser
//! should extract. A call site usually passes a single fragment:
//!
//! ```rust
//! use reqparse_extract::rule::{self, ResolvedRule, SourceKind};
//!
//! let resolved = ResolvedRule::merge(&[rule::query("age", true)]).unwrap();
//! assert_eq!(resolved.source(), Some(SourceKind::QueryField));
//! assert_eq!(resolved.key(), "age");
//! assert!(resolved.is_required());
//! ```
//!
//! Fragments can also be composed. Later fragments override earlier ones
//! facet by facet, so only the facets a fragment sets are replaced:
//!
//! ```rust
//! use reqparse_extract::rule::{self, ResolvedRule};
//!
//! let resolved = ResolvedRule::merge(&[
//!     rule::form("email", false),
//!     rule::required(true),
//! ])
//! .unwrap();
//! assert_eq!(resolved.key(), "email");
//! assert!(resolved.is_required());
//! ```

use crate::ParseError;
use std::fmt;

/// Which part of the request a rule reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The whole request body, decoded into a structure.
    Body,
    /// The whole query string, decoded into a structure.
    Query,
    /// A single form field (URL-encoded or multipart text part).
    FormField,
    /// A single query string parameter.
    QueryField,
    /// A single path parameter.
    PathField,
    /// A single multipart file, persisted by the file store.
    FileField,
}

impl SourceKind {
    /// Returns true for kinds that address one keyed value.
    #[must_use]
    pub fn is_single_field(self) -> bool {
        matches!(
            self,
            Self::FormField | Self::QueryField | Self::PathField | Self::FileField
        )
    }

    /// Short name used in logs and configuration errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::FormField => "form",
            Self::QueryField => "query field",
            Self::PathField => "path",
            Self::FileField => "file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One facet-setting unit of an extraction rule.
///
/// Every facet is optional; merging only overwrites what a fragment sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFragment {
    source: Option<SourceKind>,
    key: Option<String>,
    required: Option<bool>,
}

impl RuleFragment {
    fn keyed(source: SourceKind, key: impl Into<String>, required: bool) -> Self {
        Self {
            source: Some(source),
            key: Some(key.into()),
            required: Some(required),
        }
    }
}

/// Decode the whole request body.
#[must_use]
pub fn body_parser() -> RuleFragment {
    RuleFragment {
        source: Some(SourceKind::Body),
        ..RuleFragment::default()
    }
}

/// Decode the whole query string.
#[must_use]
pub fn query_parser() -> RuleFragment {
    RuleFragment {
        source: Some(SourceKind::Query),
        ..RuleFragment::default()
    }
}

/// Extract a single form field.
#[must_use]
pub fn form(key: impl Into<String>, required: bool) -> RuleFragment {
    RuleFragment::keyed(SourceKind::FormField, key, required)
}

/// Extract a single query parameter.
#[must_use]
pub fn query(key: impl Into<String>, required: bool) -> RuleFragment {
    RuleFragment::keyed(SourceKind::QueryField, key, required)
}

/// Extract a single path parameter.
#[must_use]
pub fn params(key: impl Into<String>, required: bool) -> RuleFragment {
    RuleFragment::keyed(SourceKind::PathField, key, required)
}

/// Validate and store a single uploaded file.
#[must_use]
pub fn file(key: impl Into<String>, required: bool) -> RuleFragment {
    RuleFragment::keyed(SourceKind::FileField, key, required)
}

/// Set only the key facet.
#[must_use]
pub fn key(key: impl Into<String>) -> RuleFragment {
    RuleFragment {
        key: Some(key.into()),
        ..RuleFragment::default()
    }
}

/// Set only the required facet.
#[must_use]
pub fn required(required: bool) -> RuleFragment {
    RuleFragment {
        required: Some(required),
        ..RuleFragment::default()
    }
}

/// The merged, immutable extraction request for one parser call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRule {
    source: Option<SourceKind>,
    key: String,
    required: bool,
}

impl ResolvedRule {
    /// Merges fragments left to right.
    ///
    /// A fragment overwrites the source when it sets one, the key when it
    /// sets a non-empty one, and the required flag when it sets one.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyRules`] when `fragments` is empty.
    pub fn merge(fragments: &[RuleFragment]) -> Result<Self, ParseError> {
        if fragments.is_empty() {
            return Err(ParseError::EmptyRules);
        }

        let mut resolved = Self::default();
        for fragment in fragments {
            if let Some(source) = fragment.source {
                resolved.source = Some(source);
            }
            if let Some(key) = fragment.key.as_deref().filter(|k| !k.is_empty()) {
                resolved.key = key.to_string();
            }
            if let Some(required) = fragment.required {
                resolved.required = required;
            }
        }

        Ok(resolved)
    }

    /// Returns the source kind, if any fragment set one.
    #[must_use]
    pub fn source(&self) -> Option<SourceKind> {
        self.source
    }

    /// Returns the key (empty for whole-payload rules).
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns whether absence is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}
