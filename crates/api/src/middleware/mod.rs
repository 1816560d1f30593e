//! HTTP middleware stack for the loyalty API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (credentials allowed for `BASE_URL` only)
//! 5. Security headers
//! 6. Rate limiting on `/api` (governor)
//!
//! Authentication is done per handler by the extractors in [`auth`].

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, RequireMember, require_role};
pub use client_ip::ClientIp;
pub use rate_limit::api_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
