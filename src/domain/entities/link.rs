//! Short link entity.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A short code mapped to its original URL.
///
/// Never mutated after creation. Soft-deleted rows are filtered out by the
/// store and never materialize as a `ShortLink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortLink {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Creates a new ShortLink instance.
    pub fn new(
        id: i64,
        original_url: String,
        short_code: String,
        title: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            title,
            created_at,
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub title: Option<String>,
}

/// A link together with the number of clicks recorded against it.
#[derive(Debug, Clone)]
pub struct LinkWithClicks {
    pub link: ShortLink,
    pub click_count: i64,
}
