//! DTOs for per-link statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::repositories::{DailyClicks, LabelCount};

/// Analytics for one short link.
#[derive(Debug, Serialize)]
pub struct LinkStatsResponse {
    pub short_code: String,
    pub original_url: String,
    pub short_url: String,
    pub created_at: DateTime<Utc>,
    pub total_clicks: i64,
    /// Last 30 days, newest first. Days without clicks are omitted.
    pub daily_clicks: Vec<DailyClicks>,
    pub top_countries: Vec<LabelCount>,
    pub top_referers: Vec<LabelCount>,
}
