//! API route configuration.
//!
//! Every route here sits behind the general limiter (applied in
//! [`crate::routes::router`]); creation and QR routes add their own limiter.

use crate::api::handlers::{
    admin_activity_handler, admin_stats_handler, list_links_handler, qr_handler, shorten_handler,
    stats_handler,
};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Public JSON API.
///
/// # Endpoints
///
/// - `POST /shorten`       - Create a short link (create limiter)
/// - `GET  /urls`          - Paginated links with click counts
/// - `GET  /stats/{code}`  - Analytics for a link
/// - `GET  /qr/{code}`     - QR payload for a link (qr limiter)
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let create = Router::new()
        .route("/shorten", post(shorten_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::create,
        ));

    let qr = Router::new()
        .route("/qr/{code}", get(qr_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::qr));

    Router::new()
        .route("/urls", get(list_links_handler))
        .route("/stats/{code}", get(stats_handler))
        .merge(create)
        .merge(qr)
}

/// Administrative reporting, not rate limited.
///
/// # Endpoints
///
/// - `GET /stats`     - System totals and dependency status
/// - `GET /activity`  - Most recent links and clicks
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin_stats_handler))
        .route("/activity", get(admin_activity_handler))
}
