//! Handler for the QR payload endpoint.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};

use crate::api::dto::qr::QrResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::base_url::{public_base_url, short_url};

/// Returns the short URL to encode into a QR image.
///
/// # Endpoint
///
/// `GET /api/qr/{code}`
///
/// Image rendering happens on the client.
///
/// # Errors
///
/// Returns 404 Not Found if the code doesn't exist.
pub async fn qr_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QrResponse>, AppError> {
    let base_url = public_base_url(state.base_url.as_deref(), &headers, state.behind_proxy)?;
    let link = state.link_service.get_link_by_code(&code).await?;

    Ok(Json(QrResponse {
        short_url: short_url(&base_url, &link.short_code),
        code: link.short_code,
    }))
}
