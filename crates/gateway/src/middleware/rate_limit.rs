//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use paperboard_common::{config::RateLimitConfig, errors::AppError};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Limiter plus the configured rate, reported back on rejection
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<GlobalRateLimiter>,
    requests_per_second: u32,
}

impl RateLimit {
    /// Build a global limiter; both rate and burst must be non-zero
    pub fn from_config(config: &RateLimitConfig) -> anyhow::Result<Self> {
        let rate = NonZeroU32::new(config.requests_per_second)
            .ok_or_else(|| anyhow::anyhow!("rate_limit.requests_per_second must be greater than 0"))?;
        let burst = NonZeroU32::new(config.burst)
            .ok_or_else(|| anyhow::anyhow!("rate_limit.burst must be greater than 0"))?;

        let quota = Quota::per_second(rate).allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            requests_per_second: config.requests_per_second,
        })
    }

    pub fn check(&self) -> Result<(), AppError> {
        self.limiter.check().map_err(|_| AppError::RateLimited {
            limit: self.requests_per_second,
        })
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limit.check()?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(requests_per_second: u32, burst: u32) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second,
            burst,
            enabled: true,
        }
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limit = RateLimit::from_config(&config(100, 200)).unwrap();
        assert!(limit.check().is_ok());
    }

    #[test]
    fn test_burst_exhaustion() {
        let limit = RateLimit::from_config(&config(1, 2)).unwrap();
        assert!(limit.check().is_ok());
        assert!(limit.check().is_ok());
        assert!(matches!(limit.check(), Err(AppError::RateLimited { limit: 1 })));
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        assert!(RateLimit::from_config(&config(0, 10)).is_err());
        assert!(RateLimit::from_config(&config(10, 0)).is_err());
    }
}
