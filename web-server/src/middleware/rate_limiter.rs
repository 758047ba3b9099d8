// web-server/src/middleware/rate_limiter.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use common::RateLimitConfig;
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::errors::RelayError;

/// Sliding-window attempt counter for the login and signup endpoints,
/// keyed by client IP.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    paths: Vec<String>,
    max_attempts: usize,
    window: Duration,
    store: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            paths: config.paths.clone(),
            max_attempts: config.max_attempts,
            window: Duration::from_secs(config.window_seconds),
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn applies_to(&self, path: &str) -> bool {
        self.paths.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Record an attempt. Returns the seconds to wait when over the limit.
    fn check(&self, ip: &str, now: Instant) -> Option<u64> {
        let mut store = match self.store.lock() {
            Ok(store) => store,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Drop idle clients so the map does not grow without bound
        let window = self.window;
        store.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < window);
            !attempts.is_empty()
        });

        let attempts = store.entry(ip.to_string()).or_default();
        if attempts.len() >= self.max_attempts {
            let oldest = attempts.first().copied().unwrap_or(now);
            let wait = window.saturating_sub(now.duration_since(oldest));
            return Some(wait.as_secs().max(1));
        }
        attempts.push(now);
        None
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.limiter.applies_to(req.path()) {
            let ip = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            if let Some(retry_after) = self.limiter.check(&ip, Instant::now()) {
                tracing::warn!("Rate limit exceeded for IP: {}", ip);
                let resp = req.error_response(RelayError::RateLimited { retry_after });
                return Box::pin(async move { Ok(resp.map_into_right_body()) });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: usize) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_attempts,
            window_seconds: 60,
            paths: vec!["/api/login".to_string()],
        })
    }

    #[test]
    fn test_limits_after_max_attempts() {
        let limiter = limiter(2);
        let now = Instant::now();
        assert_eq!(limiter.check("1.2.3.4", now), None);
        assert_eq!(limiter.check("1.2.3.4", now), None);
        assert_eq!(limiter.check("1.2.3.4", now), Some(60));
        // other clients are counted separately
        assert_eq!(limiter.check("5.6.7.8", now), None);
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(1);
        let start = Instant::now();
        assert_eq!(limiter.check("ip", start), None);
        assert!(limiter.check("ip", start + Duration::from_secs(30)).is_some());
        assert_eq!(limiter.check("ip", start + Duration::from_secs(61)), None);
    }

    #[test]
    fn test_only_configured_paths() {
        let limiter = limiter(1);
        assert!(limiter.applies_to("/api/login"));
        assert!(!limiter.applies_to("/api/logout"));
    }
}
