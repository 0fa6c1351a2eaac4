//! Handler for short URL redirect.

use axum::{
    Extension,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::middleware::client_ip::ClientIp;
use crate::application::services::ClientInfo;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the code in the cache
/// 2. On a miss, query the database and backfill the cache
/// 3. Hand a click event to the background worker (not awaited)
/// 4. Return 301 Moved Permanently
///
/// Cache failures are treated as misses.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let ip = client_ip
        .as_ref()
        .map(|Extension(ip)| ip.as_str())
        .unwrap_or(ClientIp::UNKNOWN);

    let client = ClientInfo {
        ip_address: ip,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        referer: headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    };

    let original_url = state.link_service.resolve_short_link(&code, client).await?;

    let location = HeaderValue::try_from(original_url).map_err(|_| {
        AppError::internal("Stored URL is not a valid header value", json!({ "code": code }))
    })?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response())
}
