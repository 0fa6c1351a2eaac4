//! Handler for link shortening endpoint.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

use crate::api::dto::shorten::{LinkResponse, ShortenRequest};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::base_url::public_base_url;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "example.com/page",
///   "custom_code": "my-link"
/// }
/// ```
///
/// # Response
///
/// `201 Created` for a new link, `200 OK` when the URL was already shortened.
///
/// ```json
/// {
///   "id": 1,
///   "original_url": "http://example.com/page",
///   "short_code": "my-link",
///   "short_url": "https://sho.rt/my-link",
///   "title": null,
///   "click_count": 0,
///   "created_at": "2026-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for a malformed URL or custom code.
/// Returns 409 Conflict if the custom code is taken.
pub async fn shorten_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let base_url = public_base_url(state.base_url.as_deref(), &headers, state.behind_proxy)?;

    let outcome = state
        .link_service
        .create_short_link(&payload.url, payload.custom_code.as_deref())
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(LinkResponse::new(
            outcome.link,
            outcome.click_count,
            &base_url,
        )),
    ))
}
