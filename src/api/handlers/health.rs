//! Handlers for health check endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, DetailedHealthResponse, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Liveness probe. Touches no dependency.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "URL shortener is running",
    })
}

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health/detailed`
///
/// # Response Codes
///
/// - **200 OK**: every enabled component is up
/// - **503 Service Unavailable**: one or more components are down
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1`
/// 2. **Cache**: Redis PING, or `disabled` when running without Redis
/// 3. **Click Queue**: channel open, free capacity
pub async fn health_detailed_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let (database, cache) = tokio::join!(check_database(&state), check_cache(&state));
    let click_queue = check_click_queue(&state);

    let degraded = database.is_down() || cache.is_down() || click_queue.is_down();

    let response = DetailedHealthResponse {
        status: if degraded { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            database,
            cache,
            click_queue,
        },
    };

    let status = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status, Json(response))
}

/// Checks database connectivity.
pub(crate) async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_repository.ping().await {
        Ok(()) => CheckStatus::up("Connected"),
        Err(e) => CheckStatus::down(format!("Database error: {}", e)),
    }
}

/// Checks cache connectivity via PING command.
pub(crate) async fn check_cache(state: &AppState) -> CheckStatus {
    if !state.cache.is_enabled() {
        return CheckStatus::disabled();
    }

    if state.cache.health_check().await {
        CheckStatus::up("Redis connected")
    } else {
        CheckStatus::down("Redis connection failed")
    }
}

/// Checks if the click tracking queue is operational.
fn check_click_queue(state: &AppState) -> CheckStatus {
    if state.click_recorder.is_closed() {
        CheckStatus::down("Click queue is closed")
    } else {
        CheckStatus::up(format!(
            "Free capacity: {}",
            state.click_recorder.capacity()
        ))
    }
}
