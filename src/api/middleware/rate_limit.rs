//! Per-client rate limiting middleware.
//!
//! Each function guards a route group with one limiter class from
//! [`crate::domain::rate_limiter::RateLimiters`]. Limiters for different
//! classes keep independent state, so a request passing through two of them
//! spends one token in each.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::middleware::client_ip::ClientIp;
use crate::domain::rate_limiter::{Admission, LimiterClass};
use crate::error::AppError;
use crate::state::AppState;

/// General traffic limiter: one token per 600 ms, burst 100.
///
/// # Example
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/{code}", get(redirect_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::general));
/// ```
pub async fn general(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&st, LimiterClass::General, req, next).await
}

/// Link creation limiter: one token per 6 s, burst 10.
pub async fn create(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&st, LimiterClass::Create, req, next).await
}

/// QR limiter: one token per 3 s, burst 20.
pub async fn qr(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&st, LimiterClass::Qr, req, next).await
}

/// Admits the request or answers `429 Too Many Requests` with `Retry-After`.
async fn enforce(
    st: &AppState,
    class: LimiterClass,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = req
        .extensions()
        .get::<ClientIp>()
        .map(|ip| ip.as_str().to_owned())
        .unwrap_or_else(|| ClientIp::UNKNOWN.to_string());

    match st.rate_limiters.check(class, &key) {
        Admission::Admitted => Ok(next.run(req).await),
        Admission::Throttled { retry_after_secs } => {
            ::tracing::debug!("Throttled {} on {:?} limiter", key, class);
            Err(AppError::too_many_requests(retry_after_secs))
        }
    }
}
