//! Handlers for administrative reporting.

use axum::{Json, extract::State};

use crate::api::dto::admin::{ActivityResponse, SystemStatsResponse};
use crate::api::handlers::health::{check_cache, check_database};
use crate::error::AppError;
use crate::state::AppState;

/// Number of entries returned by the activity feed.
const ACTIVITY_LIMIT: i64 = 50;

/// System-wide totals, top destination hosts and dependency status.
///
/// # Endpoint
///
/// `GET /admin/stats`
pub async fn admin_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, AppError> {
    let stats = state.stats_service.system_stats().await?;
    let (database, cache) = tokio::join!(check_database(&state), check_cache(&state));

    Ok(Json(SystemStatsResponse {
        total_links: stats.total_links,
        total_clicks: stats.total_clicks,
        links_today: stats.links_today,
        clicks_today: stats.clicks_today,
        top_hosts: stats.top_hosts,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: database.status,
        cache: cache.status,
    }))
}

/// The 50 most recent links and clicks.
///
/// # Endpoint
///
/// `GET /admin/activity`
pub async fn admin_activity_handler(
    State(state): State<AppState>,
) -> Result<Json<ActivityResponse>, AppError> {
    let activity = state.stats_service.recent_activity(ACTIVITY_LIMIT).await?;

    Ok(Json(ActivityResponse {
        recent_links: activity.links,
        recent_clicks: activity.clicks.into_iter().map(Into::into).collect(),
    }))
}
