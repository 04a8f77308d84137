//! Cross-origin negotiation.
//!
//! # Responsibilities
//! - Echo allowed origins in `Access-Control-Allow-Origin`
//! - Advertise methods, request headers and credentials
//! - Answer preflight requests before any later stage runs
//!
//! # Design Decisions
//! - Explicit allow-list only; disallowed origins get no CORS headers (no 403)
//! - Preflight answers are 204 No Content

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer from configuration. Unparseable entries are skipped;
/// config validation reports them before this runs.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(config.allow_credentials);

    match config.max_age_secs {
        Some(secs) => layer.max_age(Duration::from_secs(secs)),
        None => layer,
    }
}

/// Turn the CORS layer's preflight answer into `204 No Content`.
pub async fn preflight_no_content(request: Request<Body>, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
