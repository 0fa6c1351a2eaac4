//! URL normalization and validation.
//!
//! Inputs without an explicit `http://` or `https://` prefix are treated as
//! plain-HTTP addresses. The normalized string is stored verbatim and is the
//! deduplication key, so normalization deliberately does not re-serialize the
//! parsed URL.

use url::Url;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("URL is empty")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL must include a host")]
    MissingHost,

    #[error("URL contains control characters")]
    ControlCharacter,
}

/// Normalizes and validates a candidate URL.
///
/// 1. Surrounding whitespace is trimmed. Any remaining control character
///    (tab, newline, DEL) rejects the input.
/// 2. `http://` is prepended when neither `http://` nor `https://` is present
///    (compared case-insensitively).
/// 3. The result must parse as an absolute URL with a scheme and a host.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for unparseable input and
/// [`UrlNormalizationError::MissingHost`] when no host is present.
/// Returns [`UrlNormalizationError::ControlCharacter`] for embedded control
/// characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("example.com/page").unwrap(),
///     "http://example.com/page"
/// );
/// assert_eq!(
///     normalize_url("https://example.com").unwrap(),
///     "https://example.com"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::Empty);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(UrlNormalizationError::ControlCharacter);
    }

    let normalized = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed =
        Url::parse(&normalized).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(normalized),
        _ => Err(UrlNormalizationError::MissingHost),
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Extracts the lowercase host of a stored URL, without a leading `www.`.
///
/// Used for reporting; returns `None` for values that no longer parse.
pub fn destination_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
