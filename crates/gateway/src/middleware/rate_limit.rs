//! Login rate limiting using a token bucket

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use beans_common::errors::AppError;
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide limiter shared by the credential endpoints
pub type LoginRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Create a limiter. Zero rates fall back to one request.
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> Arc<LoginRateLimiter> {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate);

    Arc::new(RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)))
}

/// Reject the request with 429 once the bucket is empty
pub async fn rate_limit(
    State(limiter): State<Arc<LoginRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Login rate limit exceeded");
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_rate_limiter(100, 200);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_burst_is_enforced() {
        let limiter = create_rate_limiter(1, 2);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_zero_settings_still_admit_a_request() {
        let limiter = create_rate_limiter(0, 0);
        assert!(limiter.check().is_ok());
    }

    #[tokio::test]
    async fn test_login_routes_are_limited() {
        use crate::test_support::*;
        use axum::http::StatusCode;
        use beans_common::AppConfig;

        let mut config = AppConfig::default();
        config.server.debug = true;
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;
        let app = test_app_with(config).await;

        let first = app.post_form("/login", "email=a%40b.c&password=x", None).await;
        let second = app.post_form("/login", "email=a%40b.c&password=x", None).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        // other pages are not limited
        assert_eq!(app.get("/health", None).await.status(), StatusCode::OK);
    }
}
