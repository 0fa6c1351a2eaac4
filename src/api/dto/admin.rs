//! DTOs for administrative reporting endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Click, ShortLink};
use crate::domain::repositories::LabelCount;

/// System-wide statistics.
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    pub total_links: i64,
    pub total_clicks: i64,
    pub links_today: i64,
    pub clicks_today: i64,
    /// Most frequent destination hosts over the last 30 days.
    pub top_hosts: Vec<LabelCount>,
    pub uptime_seconds: u64,
    pub database: &'static str,
    pub cache: &'static str,
}

/// Recent writes across the system.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub recent_links: Vec<ShortLink>,
    pub recent_clicks: Vec<ClickItem>,
}

/// A recorded click without internal identifiers.
#[derive(Debug, Serialize)]
pub struct ClickItem {
    pub link_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub created_at: DateTime<Utc>,
}

impl From<Click> for ClickItem {
    fn from(click: Click) -> Self {
        Self {
            link_id: click.link_id,
            ip_address: click.ip_address,
            user_agent: click.user_agent,
            referer: click.referer,
            created_at: click.created_at,
        }
    }
}
