//! Click statistics and reporting service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::entities::{Click, LinkWithClicks, ShortLink};
use crate::domain::repositories::{ClickRepository, DailyClicks, LabelCount, LinkRepository};
use crate::error::AppError;
use serde_json::json;

/// Window for per-link daily clicks and destination host ranking.
pub const STATS_WINDOW_DAYS: i64 = 30;

/// Entries in each "top" list.
pub const TOP_LIMIT: i64 = 10;

/// Analytics for a single link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStats {
    pub link: ShortLink,
    pub total_clicks: i64,
    pub daily_clicks: Vec<DailyClicks>,
    pub top_countries: Vec<LabelCount>,
    pub top_referers: Vec<LabelCount>,
}

/// System-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub total_links: i64,
    pub total_clicks: i64,
    pub links_today: i64,
    pub clicks_today: i64,
    pub top_hosts: Vec<LabelCount>,
}

/// Most recent writes.
#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub links: Vec<ShortLink>,
    pub clicks: Vec<Click>,
}

/// Service for link analytics and administrative reporting.
///
/// Read-only; every figure is computed from the store on request.
pub struct StatsService<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> {
    link_repository: Arc<L>,
    click_repository: Arc<C>,
}

impl<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> StatsService<L, C> {
    /// Creates a new statistics service.
    pub fn new(link_repository: Arc<L>, click_repository: Arc<C>) -> Self {
        Self {
            link_repository,
            click_repository,
        }
    }

    /// Retrieves analytics for a short code.
    ///
    /// Daily clicks cover the last 30 days, newest first. Countries and
    /// referers are limited to the ten most frequent non-empty values.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn link_stats(&self, code: &str) -> Result<LinkStats, AppError> {
        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "code": code })))?;

        let since = Utc::now() - Duration::days(STATS_WINDOW_DAYS);

        let (total_clicks, daily_clicks, top_countries, top_referers) = tokio::try_join!(
            self.click_repository.count_for_link(link.id),
            self.click_repository.daily_clicks(link.id, since),
            self.click_repository.top_countries(link.id, TOP_LIMIT),
            self.click_repository.top_referers(link.id, TOP_LIMIT),
        )?;

        Ok(LinkStats {
            link,
            total_clicks,
            daily_clicks,
            top_countries,
            top_referers,
        })
    }

    /// Lists links newest first with their click counts.
    ///
    /// `page` is 1-based. Returns the page items and the total link count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list_links(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<LinkWithClicks>, i64), AppError> {
        let offset = page.max(1).saturating_sub(1).saturating_mul(limit);

        let (links, total) = tokio::try_join!(
            self.link_repository.list(offset, limit),
            self.link_repository.count(),
        )?;

        let ids: Vec<i64> = links.iter().map(|l| l.id).collect();
        let counts = self.click_repository.count_for_links(&ids).await?;

        let items = links
            .into_iter()
            .map(|link| LinkWithClicks {
                click_count: counts.get(&link.id).copied().unwrap_or(0),
                link,
            })
            .collect();

        Ok((items, total))
    }

    /// Aggregates system totals. "Today" starts at UTC midnight.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn system_stats(&self) -> Result<SystemStats, AppError> {
        let now = Utc::now();
        let today = start_of_day(now);
        let window = now - Duration::days(STATS_WINDOW_DAYS);

        let (total_links, total_clicks, links_today, clicks_today, top_hosts) = tokio::try_join!(
            self.link_repository.count(),
            self.click_repository.count_all(),
            self.link_repository.count_created_since(today),
            self.click_repository.count_since(today),
            self.link_repository.top_destination_hosts(window, TOP_LIMIT),
        )?;

        Ok(SystemStats {
            total_links,
            total_clicks,
            links_today,
            clicks_today,
            top_hosts,
        })
    }

    /// Returns the `limit` most recent links and clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn recent_activity(&self, limit: i64) -> Result<RecentActivity, AppError> {
        let (links, clicks) = tokio::try_join!(
            self.link_repository.list(0, limit),
            self.click_repository.recent(limit),
        )?;

        Ok(RecentActivity { links, clicks })
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
