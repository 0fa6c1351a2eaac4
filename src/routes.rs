//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`            - Short link redirect (general limiter)
//! - `/api/*`                  - JSON API (general limiter, plus per-route limiters)
//! - `/admin/*`                - Administrative reporting
//! - `GET  /health`            - Liveness
//! - `GET  /health/detailed`   - Database, cache and click queue status
//! - `/static/*`               - Static assets
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Client IP** - Peer address, or forwarding headers behind a proxy
//! - **Rate limiting** - Per-IP token buckets per endpoint class
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_detailed_handler, health_handler, redirect_handler};
use crate::api::middleware::{client_ip, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Builds the router with all routes and middleware.
///
/// Expects `ConnectInfo<SocketAddr>` in request extensions for client IP
/// resolution; see [`app_router`].
pub fn router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/{code}", get(redirect_handler))
        .nest("/api", api::routes::api_routes(&state))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::general,
        ));

    Router::new()
        .merge(limited)
        .nest("/admin", api::routes::admin_routes())
        .route("/health", get(health_handler))
        .route("/health/detailed", get(health_detailed_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            client_ip::layer,
        ))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router with trailing-slash normalization.
///
/// Serve with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
