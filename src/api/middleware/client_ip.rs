//! Client IP resolution.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_governor::key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor};

use crate::state::AppState;

/// Resolved client address, stored as a request extension.
///
/// Used as the rate-limit key and as the IP of recorded clicks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Fallback when no address can be determined.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolves the client IP and inserts [`ClientIp`] into the request extensions.
///
/// # Key Extraction
///
/// - Default: socket peer address (`ConnectInfo<SocketAddr>`)
/// - `behind_proxy`: `X-Forwarded-For`, `X-Real-IP` or `Forwarded`, falling
///   back to the peer address
///
/// Never rejects a request; unresolvable clients share the `unknown` key.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/{code}", get(redirect_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), client_ip::layer));
/// ```
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let extracted = if st.behind_proxy {
        SmartIpKeyExtractor.extract(&req)
    } else {
        PeerIpKeyExtractor.extract(&req)
    };

    let ip = match extracted {
        Ok(ip) => ip.to_string(),
        Err(e) => {
            ::tracing::debug!("Could not determine client IP: {:?}", e);
            ClientIp::UNKNOWN.to_string()
        }
    };

    req.extensions_mut().insert(ClientIp(ip));

    next.run(req).await
}
