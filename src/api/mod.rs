pub mod error;
pub mod http_routes;
pub mod idempotency;
pub mod middleware;
pub mod rate_limiter;
pub mod response;
pub mod views;
