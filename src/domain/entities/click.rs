//! Click entity representing a single redirect event.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A click recorded when a short link is resolved.
///
/// Append-only. `country` and `city` are reserved for geolocation and are
/// currently always `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input data for recording a new click event.
///
/// The `link_id` must reference an existing link; the timestamp is set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub link_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: Option<String>,
    pub city: Option<String>,
}
