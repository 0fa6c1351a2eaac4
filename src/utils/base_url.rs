//! Public base URL resolution from configuration or request headers.

use crate::AppError;
use axum::http::{HeaderMap, header};

/// Extracts the authority (host and optional port) from the `Host` header.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if:
/// - The `Host` header is missing or empty
/// - The header value contains invalid UTF-8
pub fn host_from_headers(headers: &HeaderMap) -> Result<String, AppError> {
    let host = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::bad_request("Missing Host header", serde_json::json!({})))?
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid Host header", serde_json::json!({})))?
        .trim();

    if host.is_empty() {
        return Err(AppError::bad_request(
            "Missing Host header",
            serde_json::json!({}),
        ));
    }

    Ok(host.to_string())
}

/// Returns the prefix that short codes are appended to.
///
/// A configured base wins. Otherwise the scheme is `http`, or the first
/// `X-Forwarded-Proto` value when `behind_proxy` is set, and the authority
/// comes from the `Host` header.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::HOST, "sho.rt:8080".parse().unwrap());
///
/// assert_eq!(public_base_url(None, &headers, false).unwrap(), "http://sho.rt:8080");
/// assert_eq!(public_base_url(Some("https://s.io"), &headers, false).unwrap(), "https://s.io");
/// ```
pub fn public_base_url(
    configured: Option<&str>,
    headers: &HeaderMap,
    behind_proxy: bool,
) -> Result<String, AppError> {
    if let Some(base) = configured {
        return Ok(base.trim_end_matches('/').to_string());
    }

    let host = host_from_headers(headers)?;

    let scheme = behind_proxy
        .then(|| headers.get("x-forwarded-proto"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Ok(format!("{}://{}", scheme, host))
}

/// Joins a base URL and a short code.
pub fn short_url(base: &str, code: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), code)
}
