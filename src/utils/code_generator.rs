//! Short code generation and custom alias validation.

use crate::error::AppError;
use rand::Rng;
use serde_json::json;

/// Alphabet for generated codes: URL-safe without escaping.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default length of a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 7;

pub const ALIAS_MIN_LENGTH: usize = 3;
pub const ALIAS_MAX_LENGTH: usize = 50;

/// Aliases that would shadow a route or a well-known path. Compared
/// case-insensitively.
const RESERVED_ALIASES: &[&str] = &[
    "r",
    "api",
    "shorten",
    "health",
    "admin",
    "dashboard",
    "login",
    "static",
    "stats",
    "settings",
    "app",
    "www",
];

/// Generates a random code of `length` characters from [`CODE_ALPHABET`].
///
/// Each character is drawn uniformly from the thread-local CSPRNG.
pub fn generate_code(length: usize) -> String {
    generate_code_with(&mut rand::rng(), length)
}

/// Same as [`generate_code`] with a caller-supplied generator.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

/// Returns true if `code` could have come from [`generate_code`] with `length`.
pub fn is_generated_shape(code: &str, length: usize) -> bool {
    code.len() == length && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// Validates a user-provided custom alias.
///
/// # Rules
///
/// - Length: 3-50 characters
/// - Allowed characters: ASCII letters, digits, hyphens
/// - Cannot start or end with a hyphen
/// - Cannot be a reserved system path
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_custom_alias("summer-sale").is_ok());
/// assert!(validate_custom_alias("my_link").is_err());  // underscore
/// assert!(validate_custom_alias("Admin").is_err());    // reserved
/// ```
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < ALIAS_MIN_LENGTH || alias.len() > ALIAS_MAX_LENGTH {
        return Err(AppError::bad_request(
            format!("Custom alias must be {ALIAS_MIN_LENGTH}-{ALIAS_MAX_LENGTH} characters"),
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(AppError::bad_request(
            "Custom alias can only contain letters, digits, and hyphens",
            json!({ "alias": alias }),
        ));
    }

    if alias.starts_with('-') || alias.ends_with('-') {
        return Err(AppError::bad_request(
            "Custom alias cannot start or end with a hyphen",
            json!({ "alias": alias }),
        ));
    }

    if RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
    {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "alias": alias }),
        ));
    }

    Ok(())
}
