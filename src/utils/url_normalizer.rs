//! URL normalization for user-supplied destinations.
//!
//! Normalization is deliberately shallow: surrounding whitespace is removed
//! and a missing scheme becomes `https://`. Anything else that is malformed
//! is left for [`crate::utils::ssrf_guard`] to reject.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Upper bound on accepted destination length.
pub const MAX_URL_LENGTH: usize = 2048;

/// `scheme:` prefix per RFC 3986. A digit right after the colon means
/// `host:port`, not a scheme.
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:([^0-9]|$)").expect("valid regex"));

/// Errors that can occur during URL normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Normalizes a raw destination.
///
/// # Normalization Rules
///
/// 1. Leading and trailing whitespace is trimmed
/// 2. `https://` is prepended when no scheme is present
/// 3. A parseable result is re-serialized in canonical form (lowercase
///    host, default port dropped); an unparseable one is returned as is
///
/// Fragments and query strings are preserved.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::Empty`] for blank input and
/// [`UrlNormalizationError::TooLong`] past [`MAX_URL_LENGTH`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize("  example.com/page ").unwrap(), "https://example.com/page");
/// assert_eq!(normalize("HTTP://Example.COM:80/").unwrap(), "http://example.com/");
/// ```
pub fn normalize(raw: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let with_scheme = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    Ok(match Url::parse(&with_scheme) {
        Ok(url) => url.to_string(),
        Err(_) => with_scheme,
    })
}

/// Returns true if `input` starts with an explicit scheme.
pub fn has_scheme(input: &str) -> bool {
    input.contains("://") || SCHEME_RE.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_https_url() {
        assert_eq!(
            normalize("https://example.com/page").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(
            normalize("  \thttps://example.com/page\n ").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_normalize_prepends_https() {
        assert_eq!(normalize("example.com").unwrap(), "https://example.com/");
        assert_eq!(
            normalize("example.com/a?b=1").unwrap(),
            "https://example.com/a?b=1"
        );
    }

    #[test]
    fn test_normalize_host_with_port_is_not_a_scheme() {
        assert_eq!(
            normalize("example.com:8080/path").unwrap(),
            "https://example.com:8080/path"
        );
    }

    #[test]
    fn test_normalize_keeps_foreign_schemes() {
        // Left for the SSRF guard to reject.
        assert_eq!(normalize("javascript:alert(1)").unwrap(), "javascript:alert(1)");
        assert_eq!(normalize("ftp://example.com/").unwrap(), "ftp://example.com/");
        assert!(normalize("mailto:a@example.com").unwrap().starts_with("mailto:"));
    }

    #[test]
    fn test_normalize_canonicalizes_host_and_default_port() {
        assert_eq!(
            normalize("HTTPS://EXAMPLE.COM:443/Path").unwrap(),
            "https://example.com/Path"
        );
    }

    #[test]
    fn test_normalize_preserves_fragment() {
        assert_eq!(
            normalize("https://example.com/page#section").unwrap(),
            "https://example.com/page#section"
        );
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize(""), Err(UrlNormalizationError::Empty));
        assert_eq!(normalize("   "), Err(UrlNormalizationError::Empty));
    }

    #[test]
    fn test_normalize_rejects_too_long() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(normalize(&url), Err(UrlNormalizationError::TooLong));
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://x"));
        assert!(has_scheme("javascript:void(0)"));
        assert!(has_scheme("data:text/plain,hi"));
        assert!(!has_scheme("example.com"));
        assert!(!has_scheme("localhost:3000"));
        assert!(!has_scheme("//example.com"));
    }
}
