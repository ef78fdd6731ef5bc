/// Rate limiting for the HTTP surface
use crate::{
    config::RateLimitSettings,
    context::AppContext,
    error::WisperError,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Global rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    global: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(settings.requests_per_minute)
                .unwrap_or(NonZeroU32::new(3000).unwrap()),
        )
        .allow_burst(NonZeroU32::new(settings.burst_size).unwrap_or(NonZeroU32::new(50).unwrap()));

        Self {
            enabled: settings.enabled,
            global: Arc::new(GovernorLimiter::direct(quota)),
        }
    }

    /// Check the global quota; on rejection, report how long to wait
    pub fn check(&self) -> Result<(), std::time::Duration> {
        if !self.enabled {
            return Ok(());
        }

        self.global
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

/// Axum middleware applying the global rate limit
///
/// Health and metrics probes are exempt so monitoring keeps working while
/// the service sheds load.
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Result<Response, WisperError> {
    let path = req.uri().path();
    if path != "/health" && path != "/metrics" {
        if let Err(retry_after) = ctx.rate_limiter.check() {
            return Err(WisperError::RateLimitExceeded { retry_after });
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(&RateLimitSettings {
            enabled: false,
            requests_per_minute: 1,
            burst_size: 1,
        });

        for _ in 0..10 {
            assert!(limiter.check().is_ok());
        }
    }

    #[test]
    fn test_burst_exhaustion_rejects() {
        let limiter = RateLimiter::new(&RateLimitSettings {
            enabled: true,
            requests_per_minute: 1,
            burst_size: 2,
        });

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }
}
