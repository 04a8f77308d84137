//! Forwarding of the chat namespace to the downstream chat service.
//!
//! # Responsibilities
//! - Rewrite `/api/chat/...` requests onto the configured upstream
//! - Strip hop-by-hop headers in both directions
//! - Map connection failures and timeouts onto gateway errors

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{header, HeaderMap, Request, Response, Uri},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;

use crate::chat::CHAT_MOUNT;
use crate::config::ChatConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

const HOP_BY_HOP: [header::HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Upstream client plus target for the chat service.
pub struct ChatForwarder {
    client: Client<HttpConnector, Body>,
    upstream: Option<String>,
    timeout: Duration,
}

impl ChatForwarder {
    pub fn new(config: &ChatConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            upstream: config
                .upstream_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Absolute upstream URI for an incoming request URI.
    pub fn target_uri(&self, original: &Uri) -> Result<Uri, ApiError> {
        let upstream = self.upstream.as_deref().ok_or(ApiError::UpstreamUnavailable)?;
        let path_and_query = original
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(CHAT_MOUNT);
        format!("{upstream}{path_and_query}")
            .parse()
            .map_err(|e| ApiError::Internal(format!("Invalid upstream URI: {e}")))
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Relay a chat request to the upstream service.
pub async fn forward(
    State(forwarder): State<Arc<ChatForwarder>>,
    OriginalUri(original): OriginalUri,
    request: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    let target = forwarder.target_uri(&original)?;
    let (mut parts, body) = request.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let mut upstream_request = Request::builder()
        .method(parts.method.clone())
        .uri(target.clone())
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    *upstream_request.headers_mut() = parts.headers;

    tracing::debug!(method = %parts.method, upstream = %target, "Forwarding chat request");

    match tokio::time::timeout(forwarder.timeout, forwarder.client.request(upstream_request)).await {
        Ok(Ok(response)) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Ok(Err(e)) => {
            tracing::error!(upstream = %target, error = %e, "Chat upstream error");
            metrics::record_upstream_error("connect");
            Err(ApiError::UpstreamFailed(e.to_string()))
        }
        Err(_) => {
            tracing::error!(upstream = %target, timeout = ?forwarder.timeout, "Chat upstream timed out");
            metrics::record_upstream_error("timeout");
            Err(ApiError::UpstreamTimeout)
        }
    }
}
