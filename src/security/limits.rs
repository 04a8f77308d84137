//! Request body admission.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Buffer and parse JSON bodies before they reach handlers
//!
//! # Design Decisions
//! - Declared Content-Length is checked before reading anything
//! - Oversize bodies return 413 Payload Too Large, malformed JSON 400
//! - Both are raised as `ApiError` so the error surface renders them
//! - Non-JSON bodies pass through unparsed

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::sync::Arc;

use crate::http::request::{content_length, is_json};
use crate::http::response::ApiError;

/// Parsed JSON body, available to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Arc<serde_json::Value>);

/// Maximum admitted body size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub async fn json_body_middleware(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if content_length(request.headers()).is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = read_limited(body, limit).await?;

    if !bytes.is_empty() {
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::MalformedJson(e.to_string()))?;
        parts.extensions.insert(JsonBody(Arc::new(value)));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        let over_limit = err
            .source()
            .is_some_and(|source| source.is::<LengthLimitError>());
        if over_limit {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::BodyRead(err.to_string())
        }
    })
}
