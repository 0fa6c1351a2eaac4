//! Repository trait for click recording and analytics.

use std::collections::HashMap;

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Clicks per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub count: i64,
}

/// A label (country, referer, host) with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Repository interface for click events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Records a new click event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors, including a
    /// `link_id` that no longer references a link.
    async fn record_click(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Counts clicks recorded for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError>;

    /// Counts clicks for several links at once. Links without clicks are absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_for_links(&self, link_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError>;

    /// Clicks per day for a link since `since`, newest day first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn daily_clicks(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyClicks>, AppError>;

    /// Most frequent non-empty countries for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn top_countries(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError>;

    /// Most frequent non-empty referers for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn top_referers(&self, link_id: i64, limit: i64) -> Result<Vec<LabelCount>, AppError>;

    /// Counts all clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_all(&self) -> Result<i64, AppError>;

    /// Counts clicks recorded at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, AppError>;

    /// Most recent clicks across all links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn recent(&self, limit: i64) -> Result<Vec<Click>, AppError>;
}
