//! Error and not-found response surfaces.
//!
//! # Responsibilities
//! - Map gateway errors to HTTP status codes
//! - Render every error through one JSON shape
//! - Hide error detail outside development
//!
//! # Design Decisions
//! - Handlers return `ApiError`; it only tags the response with an `ErrorReport`
//! - `error_surface_middleware` renders the body, since only it knows the environment
//! - Panics in handlers are converted into reports, never dropped connections

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;
use thiserror::Error;

use crate::config::Environment;

pub const GENERIC_ERROR: &str = "Something went wrong";
pub const NOT_FOUND_ERROR: &str = "Not found";

/// Errors raised anywhere below the error surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed JSON body: {0}")]
    MalformedJson(String),

    #[error("request entity too large (limit {limit} bytes)")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Chat service is not configured")]
    UpstreamUnavailable,

    #[error("Chat service request failed: {0}")]
    UpstreamFailed(String),

    #[error("Chat service timed out")]
    UpstreamTimeout,

    #[error("{1}")]
    Status(StatusCode, String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedJson(_) | ApiError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Status(status, _) => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error details carried on a response until the error surface renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorReport {
    /// Render the final JSON error; `message` is present only in development.
    pub fn render(&self, environment: &Environment) -> Response {
        let status = if self.status.is_client_error() || self.status.is_server_error() {
            self.status
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorBody {
            error: GENERIC_ERROR,
            message: environment.is_development().then(|| self.message.clone()),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = ErrorReport {
            status: self.status(),
            message: self.to_string(),
        };
        let mut response = report.status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Final error handler: every response carrying an `ErrorReport` is re-rendered.
pub async fn error_surface_middleware(
    State(environment): State<Environment>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    match response.extensions().get::<ErrorReport>() {
        Some(report) => {
            if report.status.is_server_error() {
                tracing::error!(%method, %path, status = %report.status, error = %report.message, "Request failed");
            } else {
                tracing::warn!(%method, %path, status = %report.status, error = %report.message, "Request rejected");
            }
            report.render(&environment)
        }
        None => response,
    }
}

/// Convert a handler panic into an error report.
pub fn panic_report(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::Internal(message).into_response()
}

/// Fallback for every unmatched route.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": NOT_FOUND_ERROR })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MalformedJson("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::PayloadTooLarge { limit: 1 }.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::Status(StatusCode::CONFLICT, "taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Internal("boom".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_tags_report() {
        let response = ApiError::UpstreamFailed("refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "Chat service request failed: refused");
    }

    #[tokio::test]
    async fn test_render_includes_message_in_development() {
        let report = ErrorReport {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "database exploded".into(),
        };
        let body = json_body(report.render(&Environment::Development)).await;
        assert_eq!(
            body,
            serde_json::json!({ "error": "Something went wrong", "message": "database exploded" })
        );
    }

    #[tokio::test]
    async fn test_render_omits_message_elsewhere() {
        let report = ErrorReport {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "too big".into(),
        };
        for env in [Environment::Unset, Environment::Other("production".into())] {
            let response = report.render(&env);
            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
            let body = json_body(response).await;
            assert_eq!(body, serde_json::json!({ "error": "Something went wrong" }));
            assert!(body.get("message").is_none());
        }
    }

    #[tokio::test]
    async fn test_non_error_status_is_rendered_as_500() {
        let report = ErrorReport {
            status: StatusCode::OK,
            message: "odd".into(),
        };
        let response = report.render(&Environment::Unset);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_payloads_become_internal_reports() {
        let response = panic_report(Box::new("kaboom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.extensions().get::<ErrorReport>().unwrap().message, "kaboom");

        let response = panic_report(Box::new(7_u8));
        assert_eq!(response.extensions().get::<ErrorReport>().unwrap().message, "handler panicked");
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, serde_json::json!({ "error": "Not found" }));
    }
}
