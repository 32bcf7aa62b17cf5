/*
 * Responsibility
 * - Identify the caller for rate limiting
 * - TCP peer address → X-Forwarded-For only when the peer is a trusted proxy → "anonymous"
 * - Never rejects: every request gets some identity
 */
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Proxies whose `X-Forwarded-For` header is believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<[IpAddr]>);

impl TrustedProxies {
    pub fn new(ips: Vec<IpAddr>) -> Self {
        Self(ips.into())
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Walk the chain from the nearest hop outwards, skipping our own proxies.
// The first address not in the trusted set is the client.
fn from_forwarded_for(parts: &Parts, trusted: &TrustedProxies) -> Option<IpAddr> {
    let header = parts.headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let hops = header
        .split(',')
        .map(|h| h.trim().parse::<IpAddr>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    hops.iter()
        .rev()
        .find(|ip| !trusted.contains(ip))
        .or_else(|| hops.first())
        .copied()
}

impl<S> FromRequestParts<S> for ClientId
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let trusted = TrustedProxies::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let id = match peer {
            Some(peer) if trusted.contains(&peer) => {
                from_forwarded_for(parts, &trusted).unwrap_or(peer).to_string()
            }
            Some(peer) => peer.to_string(),
            None => "anonymous".to_string(),
        };

        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const PROXY: [u8; 4] = [10, 0, 0, 2];

    fn trusted() -> TrustedProxies {
        TrustedProxies::new(vec![IpAddr::from(PROXY)])
    }

    fn request(peer: [u8; 4], forwarded: Option<&str>) -> Request<()> {
        let mut builder = Request::builder();
        if let Some(v) = forwarded {
            builder = builder.header(FORWARDED_FOR, v);
        }
        let mut req = builder.body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 5555))));
        req
    }

    async fn extract(req: Request<()>, trusted: TrustedProxies) -> ClientId {
        let (mut parts, _) = req.into_parts();
        ClientId::from_request_parts(&mut parts, &trusted)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn trusted_proxy_forwards_client_address() {
        let req = request(PROXY, Some("203.0.113.7"));
        assert_eq!(extract(req, trusted()).await.as_str(), "203.0.113.7");
    }

    #[tokio::test]
    async fn forwarded_header_from_untrusted_peer_is_ignored() {
        for spoofed in ["203.0.113.7", "198.51.100.1, 203.0.113.7"] {
            let req = request([192, 0, 2, 1], Some(spoofed));
            assert_eq!(extract(req, trusted()).await.as_str(), "192.0.2.1");
        }

        // Nothing is trusted unless configured.
        let req = request(PROXY, Some("203.0.113.7"));
        assert_eq!(
            extract(req, TrustedProxies::default()).await.as_str(),
            "10.0.0.2"
        );
    }

    #[tokio::test]
    async fn client_supplied_hops_before_the_proxy_are_skipped() {
        // The client prepended a fake hop; the proxy appended the real address.
        let req = request(PROXY, Some("198.51.100.99, 203.0.113.7"));
        assert_eq!(extract(req, trusted()).await.as_str(), "203.0.113.7");
    }

    #[tokio::test]
    async fn malformed_forwarded_header_falls_back_to_peer() {
        let req = request(PROXY, Some("not-an-ip"));
        assert_eq!(extract(req, trusted()).await.as_str(), "10.0.0.2");
    }

    #[tokio::test]
    async fn anonymous_without_any_hint() {
        let req = Request::builder()
            .header(FORWARDED_FOR, "203.0.113.7")
            .body(())
            .unwrap();
        assert_eq!(extract(req, trusted()).await.as_str(), "anonymous");
    }
}
