//! Scalar conversion of raw request strings.
//!
//! The set of supported targets is closed: signed integers of several
//! widths, `bool`, `f64` and `String`. The target is named by a
//! [`ScalarKind`] tag, and conversion is a match on that tag. Types reach the
//! parser through the [`Extract`] trait, whose `KIND` constant reveals the
//! tag before any value has been read.

use crate::context::RequestSource;
use crate::{ErrorCode, FieldError, ParseError};
use serde::de::DeserializeOwned;
use std::fmt;
use std::ops::Deref;

/// Tag naming a supported scalar target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `bool`
    Bool,
    /// `f64`
    F64,
    /// `String`
    Str,
}

impl ScalarKind {
    /// Returns the zero value for this kind.
    #[must_use]
    pub fn zero(self) -> Scalar {
        match self {
            Self::I8 => Scalar::I8(0),
            Self::I16 => Scalar::I16(0),
            Self::I32 => Scalar::I32(0),
            Self::I64 => Scalar::I64(0),
            Self::Isize => Scalar::Isize(0),
            Self::Bool => Scalar::Bool(false),
            Self::F64 => Scalar::F64(0.0),
            Self::Str => Scalar::Str(String::new()),
        }
    }

    /// Rust name of the target type.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::Bool => "bool",
            Self::F64 => "f64",
            Self::Str => "String",
        }
    }
}

/// A converted value, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `i8` value
    I8(i8),
    /// `i16` value
    I16(i16),
    /// `i32` value
    I32(i32),
    /// `i64` value
    I64(i64),
    /// `isize` value
    Isize(isize),
    /// `bool` value
    Bool(bool),
    /// `f64` value
    F64(f64),
    /// `String` value
    Str(String),
}

impl Scalar {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::Isize(_) => ScalarKind::Isize,
            Self::Bool(_) => ScalarKind::Bool,
            Self::F64(_) => ScalarKind::F64,
            Self::Str(_) => ScalarKind::Str,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Converts a raw string into the scalar named by `kind`.
///
/// Integers are parsed as base-10 `i64` and then narrowed with a checked
/// conversion, so out-of-range input fails instead of wrapping.
///
/// # Errors
///
/// - `MUST_NUMBER` for unparsable or out-of-range integers and floats
/// - `NOT_VALID` for anything outside the boolean literal set
///
/// # Example
///
/// ```rust
/// use reqparse_extract::convert::{convert, Scalar, ScalarKind};
///
/// assert_eq!(convert(ScalarKind::I32, "42", "age").unwrap(), Scalar::I32(42));
/// assert_eq!(convert(ScalarKind::Bool, "T", "flag").unwrap(), Scalar::Bool(true));
/// assert!(convert(ScalarKind::I8, "300", "small").is_err());
/// ```
pub fn convert(kind: ScalarKind, raw: &str, field: &str) -> Result<Scalar, FieldError> {
    let must_number = || FieldError::new(field, ErrorCode::MustNumber);

    Ok(match kind {
        ScalarKind::I8 => Scalar::I8(parse_int(raw).ok_or_else(must_number)?),
        ScalarKind::I16 => Scalar::I16(parse_int(raw).ok_or_else(must_number)?),
        ScalarKind::I32 => Scalar::I32(parse_int(raw).ok_or_else(must_number)?),
        ScalarKind::I64 => Scalar::I64(parse_int(raw).ok_or_else(must_number)?),
        ScalarKind::Isize => Scalar::Isize(parse_int(raw).ok_or_else(must_number)?),
        ScalarKind::Bool => Scalar::Bool(
            parse_bool(raw).ok_or_else(|| FieldError::new(field, ErrorCode::NotValid))?,
        ),
        ScalarKind::F64 => Scalar::F64(raw.parse().map_err(|_| must_number())?),
        ScalarKind::Str => Scalar::Str(raw.to_string()),
    })
}

fn parse_int<T: TryFrom<i64>>(raw: &str) -> Option<T> {
    raw.parse::<i64>().ok().and_then(|v| T::try_from(v).ok())
}

/// Accepts the canonical boolean literals: `1 t T TRUE true True` and
/// `0 f F FALSE false False`. Nothing else, not even `yes`/`no`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Which whole payload a rule decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// The request body.
    Body,
    /// The query string.
    Query,
}

impl PayloadSource {
    /// Decodes the payload into `T` through the request collaborator.
    ///
    /// # Errors
    ///
    /// Propagates the collaborator's decode error unchanged.
    pub fn decode<T, C>(self, ctx: &C) -> Result<T, ParseError>
    where
        T: DeserializeOwned,
        C: RequestSource,
    {
        match self {
            Self::Body => ctx.decode_body(),
            Self::Query => ctx.decode_query(),
        }
    }
}

/// A type the parser can produce.
///
/// Scalars carry `KIND = Some(..)` and can be built from a single raw value
/// or from a whole payload. [`Payload<T>`] carries `KIND = None` and can only
/// come from a whole payload; asking for it from a single field is a
/// configuration error.
pub trait Extract: Sized {
    /// The scalar kind of this type, or `None` for structured payloads.
    const KIND: Option<ScalarKind>;

    /// Unwraps a converted scalar of the matching kind.
    fn from_scalar(value: Scalar) -> Option<Self>;

    /// Decodes this type from a whole payload.
    ///
    /// # Errors
    ///
    /// Propagates the collaborator's decode error unchanged.
    fn decode_payload<C: RequestSource>(
        ctx: &C,
        source: PayloadSource,
    ) -> Result<Self, ParseError>;
}

macro_rules! impl_extract_for_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Extract for $ty {
                const KIND: Option<ScalarKind> = Some(ScalarKind::$kind);

                fn from_scalar(value: Scalar) -> Option<Self> {
                    match value {
                        Scalar::$kind(v) => Some(v),
                        _ => None,
                    }
                }

                fn decode_payload<C: RequestSource>(
                    ctx: &C,
                    source: PayloadSource,
                ) -> Result<Self, ParseError> {
                    source.decode(ctx)
                }
            }
        )*
    };
}

impl_extract_for_scalar!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    bool => Bool,
    f64 => F64,
    String => Str,
);

/// A structured value decoded from the whole body or query string.
///
/// # Example
///
/// ```rust
/// use reqparse_extract::{rule, ExtractionContextBuilder, Parser, Payload};
/// use http::{Method, Uri};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// let ctx = ExtractionContextBuilder::new()
///     .method(Method::POST)
///     .uri(Uri::from_static("/users"))
///     .header("content-type", "application/json")
///     .body(r#"{"name": "Alice"}"#)
///     .build();
///
/// let user: Payload<CreateUser> = Parser::new(&ctx).parse(&[rule::body_parser()]).unwrap();
/// assert_eq!(user.name, "Alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<T>(pub T);

impl<T> Payload<T> {
    /// Consumes the Payload and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Payload<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> Extract for Payload<T> {
    const KIND: Option<ScalarKind> = None;

    fn from_scalar(_value: Scalar) -> Option<Self> {
        None
    }

    fn decode_payload<C: RequestSource>(
        ctx: &C,
        source: PayloadSource,
    ) -> Result<Self, ParseError> {
        source.decode(ctx).map(Payload)
    }
}
