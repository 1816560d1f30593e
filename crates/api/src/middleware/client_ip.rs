//! Client IP resolution behind proxies.
//!
//! Header precedence: first `X-Forwarded-For` entry, `X-Real-IP`,
//! `CF-Connecting-IP`, `Fly-Client-IP`. The socket peer address is used when
//! no header parses, and `"unknown"` when even that is missing.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};

const UNKNOWN: &str = "unknown";

/// Client IP from proxy headers, if any parses.
#[must_use]
pub fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| {
            ["x-real-ip", "cf-connecting-ip", "fly-client-ip"]
                .into_iter()
                .find_map(|name| header(name).and_then(|v| v.trim().parse().ok()))
        })
}

/// Client IP from headers, then the connection's peer address.
#[must_use]
pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    ip_from_headers(headers).or_else(|| peer.map(|addr| addr.ip()))
}

/// The caller's IP as a string, `"unknown"` when it cannot be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let ip = resolve(&parts.headers, peer).map_or_else(|| UNKNOWN.to_string(), |ip| ip.to_string());
        Ok(Self(ip))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
            ("cf-connecting-ip", "198.51.100.3"),
        ]);
        assert_eq!(ip_from_headers(&map), "203.0.113.9".parse().ok());
    }

    #[test]
    fn test_fallback_order() {
        let map = headers(&[("cf-connecting-ip", "198.51.100.3"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(ip_from_headers(&map), "198.51.100.2".parse().ok());

        let map = headers(&[("fly-client-ip", "2001:db8::1"), ("x-forwarded-for", "garbage")]);
        assert_eq!(ip_from_headers(&map), "2001:db8::1".parse().ok());
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.0.2.4:5555".parse().unwrap();
        assert_eq!(resolve(&HeaderMap::new(), Some(peer)), "192.0.2.4".parse().ok());
        assert_eq!(resolve(&HeaderMap::new(), None), None);
    }
}
