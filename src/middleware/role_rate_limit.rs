use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request as AxumRequest, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use uuid::Uuid;

use super::rate_limit::RateLimit;
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

/// Keys the bucket on the JWT subject; must sit inside `auth_middleware`.
#[derive(Debug, Clone, Copy)]
pub struct UserIdExtractor;

impl KeyExtractor for UserIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        req.extensions()
            .get::<Claims>()
            .map(|claims| claims.sub)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type RoleGovernorLayer = GovernorLayer<
    UserIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Route groups with their own per-user budget. Admin routes only see the
/// global per-IP limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitedRole {
    Customer,
    Provider,
}

impl RateLimitedRole {
    pub fn limit(self) -> RateLimit {
        match self {
            RateLimitedRole::Customer => RateLimit::CUSTOMER,
            RateLimitedRole::Provider => RateLimit::PROVIDER,
        }
    }
}

pub fn create_role_governor(role: RateLimitedRole) -> RoleGovernorLayer {
    let limit = role.limit();
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(limit.replenish_ms())
            .burst_size(limit.burst())
            .key_extractor(UserIdExtractor)
            .finish()
            .expect("role rate limit config is valid"),
    );

    GovernorLayer::new(config)
}

/// Per-user limiter for routes every role shares. Each caller is charged
/// against their own role's budget; admins are not limited here.
pub struct RoleDispatchLimiter {
    customer: DefaultKeyedRateLimiter<Uuid>,
    provider: DefaultKeyedRateLimiter<Uuid>,
}

fn keyed(limit: RateLimit) -> DefaultKeyedRateLimiter<Uuid> {
    let per_minute = NonZeroU32::new(limit.burst()).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

impl RoleDispatchLimiter {
    pub fn new() -> Self {
        Self {
            customer: keyed(RateLimitedRole::Customer.limit()),
            provider: keyed(RateLimitedRole::Provider.limit()),
        }
    }

    pub fn check(&self, claims: &Claims) -> AppResult<()> {
        let limiter = match claims.role {
            UserRole::Customer => &self.customer,
            UserRole::Provider => &self.provider,
            UserRole::Admin => return Ok(()),
        };

        limiter
            .check_key(&claims.sub)
            .map_err(|_| AppError::RateLimited)
    }
}

impl Default for RoleDispatchLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Must sit inside `auth_middleware`.
pub async fn limit_by_role(
    State(limiter): State<Arc<RoleDispatchLimiter>>,
    request: AxumRequest,
    next: Next,
) -> AppResult<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;
    limiter.check(claims)?;
    Ok(next.run(request).await)
}
