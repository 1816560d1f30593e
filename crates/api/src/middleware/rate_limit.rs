//! Per-IP rate limiting for `/api` using governor and `tower_governor`.
//!
//! This is request throttling for the whole API. Login lockout after failed
//! passwords is separate (see `services::login_limiter`).

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use super::client_ip;
use crate::config::RateLimitConfig;

/// Key extractor using the same header precedence as login lockout, falling
/// back to the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        client_ip::resolve(req.headers(), peer).ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Milliseconds between replenished requests for a per-second rate.
const fn replenish_interval_ms(per_second: u64) -> u64 {
    let interval = 1000 / if per_second == 0 { 1 } else { per_second };
    if interval == 0 { 1 } else { interval }
}

/// Create the API rate limiter from configuration.
///
/// Returns `None` if governor rejects the configuration (zero burst).
#[must_use]
pub fn api_rate_limiter(config: &RateLimitConfig) -> Option<RateLimiterLayer> {
    let governor = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(replenish_interval_ms(config.per_second))
        .burst_size(config.burst_size)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(governor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replenish_interval() {
        assert_eq!(replenish_interval_ms(20), 50);
        assert_eq!(replenish_interval_ms(1), 1000);
        assert_eq!(replenish_interval_ms(0), 1000);
        assert_eq!(replenish_interval_ms(5000), 1);
    }

    #[test]
    fn test_limiter_builds_from_defaults() {
        assert!(api_rate_limiter(&RateLimitConfig::default()).is_some());
        let zero_burst = RateLimitConfig {
            per_second: 10,
            burst_size: 0,
        };
        assert!(api_rate_limiter(&zero_burst).is_none());
    }
}
