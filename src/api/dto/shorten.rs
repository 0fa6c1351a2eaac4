//! DTOs for link shortening endpoint.

use crate::domain::entities::ShortLink;
use crate::utils::base_url::short_url;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Compiled regex for custom code validation.
static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("valid custom code regex"));

/// Request to shorten a URL.
///
/// The URL may omit its scheme; normalization happens in the service.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Optional custom short code.
    #[validate(length(min = 3, max = 20, message = "Custom code must be 3-20 characters"))]
    #[validate(regex(
        path = "*CUSTOM_CODE_REGEX",
        message = "Custom code may contain letters, digits and hyphens"
    ))]
    pub custom_code: Option<String>,
}

/// A link as returned by the API.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub title: Option<String>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(link: ShortLink, click_count: i64, base_url: &str) -> Self {
        Self {
            short_url: short_url(base_url, &link.short_code),
            id: link.id,
            original_url: link.original_url,
            short_code: link.short_code,
            title: link.title,
            click_count,
            created_at: link.created_at,
        }
    }
}
