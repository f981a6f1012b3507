use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor, GovernorLayer};

/// Token bucket sized as "n requests per minute, all of them burstable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub per_minute: u32,
}

impl RateLimit {
    /// Per client IP, before authentication.
    pub const GLOBAL: RateLimit = RateLimit { per_minute: 1000 };
    pub const CUSTOMER: RateLimit = RateLimit { per_minute: 100 };
    /// Providers poll the pending pool and their active job.
    pub const PROVIDER: RateLimit = RateLimit { per_minute: 500 };

    /// Milliseconds between replenished tokens.
    pub fn replenish_ms(&self) -> u64 {
        60_000 / u64::from(self.per_minute.max(1))
    }

    pub fn burst(&self) -> u32 {
        self.per_minute.max(1)
    }
}

pub type GlobalGovernorLayer = GovernorLayer<
    PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Per-IP limiter. Needs the peer address, so the app must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_global_governor() -> GlobalGovernorLayer {
    let limit = RateLimit::GLOBAL;
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(limit.replenish_ms())
            .burst_size(limit.burst())
            .finish()
            .expect("global rate limit config is valid"),
    );

    GovernorLayer::new(config)
}

/// Debug-level access log; throttled and failed requests are raised to warn.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();
    let client_ip = addr.ip();

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!(%client_ip, %method, %uri, "Rate limited")
        }
        s if s.is_client_error() || s.is_server_error() => {
            tracing::warn!(%client_ip, %method, %uri, %status, "Request failed")
        }
        _ => tracing::debug!(%client_ip, %method, %uri, %status, "Request completed"),
    }

    response
}
