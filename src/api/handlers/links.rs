//! Handler for the link listing endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};

use crate::api::dto::links::LinkListResponse;
use crate::api::dto::pagination::{PaginationParams, total_pages};
use crate::api::dto::shorten::LinkResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::base_url::public_base_url;

/// Lists links newest first with click counts.
///
/// # Endpoint
///
/// `GET /api/urls?page=1&limit=10`
///
/// `page` below 1 becomes 1; `limit` outside 1-100 becomes 10.
pub async fn list_links_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let (page, limit) = params.normalized();
    let base_url = public_base_url(state.base_url.as_deref(), &headers, state.behind_proxy)?;

    let (items, total) = state.stats_service.list_links(page, limit).await?;

    let urls = items
        .into_iter()
        .map(|item| LinkResponse::new(item.link, item.click_count, &base_url))
        .collect();

    Ok(Json(LinkListResponse {
        urls,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }))
}
