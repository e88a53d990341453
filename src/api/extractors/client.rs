use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use crate::state::AppState;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

pub const FINGERPRINT_HEADER: &str = "x-device-fingerprint";

/// Caller address used as the rate-limit key.
///
/// The socket peer is used unless `TRUST_PROXY_HEADERS` is set. Behind a
/// trusted proxy the rightmost `X-Forwarded-For` hop is the one that proxy
/// appended; anything to its left came from the client.
pub struct ClientIp(pub String);

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = headers.get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()))
            .map(String::from);

        let proxied = forwarded.or_else(|| {
            headers.get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        });
        if let Some(ip) = proxied {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
        Ok(ClientIp(resolve_client_ip(&parts.headers, peer, state.config.trust_proxy_headers)))
    }
}

/// Device fingerprint sent by the invitation page, if any.
pub struct DeviceFingerprint(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for DeviceFingerprint {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let fingerprint = parts.headers.get(FINGERPRINT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(DeviceFingerprint(fingerprint))
    }
}
