//! Request inspection helpers.
//!
//! # Responsibilities
//! - Identify the client for rate limiting
//! - Classify request bodies (declared length, JSON media type)
//!
//! # Design Decisions
//! - The socket peer address is authoritative by default
//! - X-Forwarded-For / X-Real-IP are honoured only when explicitly trusted
//! - Malformed forwarding headers fall back to the peer address
//! - Without connection info every client shares the unspecified address

use axum::{
    extract::{connect_info::MockConnectInfo, ConnectInfo},
    http::{header, Extensions, HeaderMap},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Key used when neither the socket peer nor a trusted header is known.
pub const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Socket peer recorded by `into_make_service_with_connect_info`, if any.
pub fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .or_else(|| {
            extensions
                .get::<MockConnectInfo<SocketAddr>>()
                .map(|MockConnectInfo(addr)| *addr)
        })
}

/// Resolve the client IP used as the rate-limit key.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trust_forwarded_for: bool) -> IpAddr {
    let peer = peer.unwrap_or(UNKNOWN_CLIENT);
    if !trust_forwarded_for {
        return peer;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(peer)
}

/// Declared `Content-Length`, if present and well-formed.
pub fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Whether the body is declared as JSON (`application/json` or `+json`).
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}
