// web-server/src/middleware/mod.rs
pub mod rate_limiter;
pub mod route_guard;

pub use rate_limiter::RateLimiter;
pub use route_guard::RouteGuard;
