//! Handler for per-link statistics.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use crate::api::dto::stats::LinkStatsResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::base_url::{public_base_url, short_url};

/// Returns click analytics for a short code.
///
/// # Endpoint
///
/// `GET /api/stats/{code}`
///
/// # Errors
///
/// Returns 404 Not Found if the code doesn't exist.
pub async fn stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LinkStatsResponse>, AppError> {
    let base_url = public_base_url(state.base_url.as_deref(), &headers, state.behind_proxy)?;
    let stats = state.stats_service.link_stats(&code).await?;

    Ok(Json(LinkStatsResponse {
        short_url: short_url(&base_url, &stats.link.short_code),
        short_code: stats.link.short_code,
        original_url: stats.link.original_url,
        created_at: stats.link.created_at,
        total_clicks: stats.total_clicks,
        daily_clicks: stats.daily_clicks,
        top_countries: stats.top_countries,
        top_referers: stats.top_referers,
    }))
}
