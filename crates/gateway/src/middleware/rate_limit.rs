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
use scholarhub_common::errors::AppError;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter using governor crate
pub type GlobalRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Shared limiter handed to the middleware as its state
#[derive(Clone)]
pub struct Limiter {
    inner: Arc<GlobalRateLimiter>,
    per_second: u32,
}

/// Create a new rate limiter; zero values are raised to one
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> Limiter {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate);
    let quota = Quota::per_second(rate).allow_burst(burst);

    Limiter {
        inner: Arc::new(RateLimiter::direct(quota)),
        per_second: rate.get(),
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Limiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match limiter.inner.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded");
            Err(AppError::RateLimited {
                limit: limiter.per_second,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_rate_limiter(100, 200);
        assert!(limiter.inner.check().is_ok());
        assert_eq!(limiter.per_second, 100);
    }

    #[test]
    fn test_burst_exhausts() {
        let limiter = create_rate_limiter(1, 2);
        assert!(limiter.inner.check().is_ok());
        assert!(limiter.inner.check().is_ok());
        assert!(limiter.inner.check().is_err());
    }

    #[test]
    fn test_zero_quota_is_raised() {
        let limiter = create_rate_limiter(0, 0);
        assert_eq!(limiter.per_second, 1);
        assert!(limiter.inner.check().is_ok());
    }

    #[tokio::test]
    async fn test_middleware_rejects_over_quota() {
        let limiter = create_rate_limiter(1, 1);
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

        let request = || axum::http::Request::builder().uri("/ping").body(Body::empty()).unwrap();
        let first = assert_ok!(app.clone().oneshot(request()).await);
        assert_eq!(first.status(), StatusCode::OK);

        let second = assert_ok!(app.oneshot(request()).await);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
