//! Key name normalisation for error reporting.

use regex::Regex;
use std::sync::OnceLock;

fn first_cap() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("(.)([A-Z][a-z]+)").expect("valid regex"))
}

fn all_cap() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("([a-z0-9])([A-Z])").expect("valid regex"))
}

/// Converts a request key to its snake_case form.
///
/// Word boundaries are found in two passes: first before every capitalised
/// word (`HTTPCode` -> `HTTP_Code`), then between a lowercase letter or digit
/// and a following capital (`userId` -> `user_Id`). The result is lowercased.
///
/// # Example
///
/// ```rust
/// use reqparse_extract::to_snake_case;
///
/// assert_eq!(to_snake_case("userId"), "user_id");
/// assert_eq!(to_snake_case("HTTPCode"), "http_code");
/// assert_eq!(to_snake_case("email"), "email");
/// ```
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let snake = first_cap().replace_all(key, "${1}_${2}");
    let snake = all_cap().replace_all(&snake, "${1}_${2}");
    snake.to_lowercase()
}
