//! Route table.
//!
//! # Responsibilities
//! - Serve the health probe
//! - Mount the chat subtree under its namespace, including `/api/chat/`
//! - Send everything else (including other methods on /health) to the not-found handler
//!
//! # Design Decisions
//! - Route table is built once at startup and never mutated
//! - Chat subtree is any `axum::Router`, so it can be swapped in tests

use axum::{
    extract::Request,
    http::Uri,
    response::Response,
    routing::{any, get},
    Router,
};
use tower::ServiceExt;

use crate::chat::CHAT_MOUNT;
use crate::health::health_check;
use crate::http::response::not_found;

/// Build the route table with `chat` mounted at `/api/chat`.
pub fn routes(chat: Router) -> Router {
    let chat_root = chat.clone();
    Router::new()
        .route("/health", get(health_check).fallback(not_found))
        .route(
            &format!("{CHAT_MOUNT}/"),
            any(move |request: Request| chat_trailing_slash(chat_root.clone(), request)),
        )
        .nest(CHAT_MOUNT, chat)
        .fallback(not_found)
}

/// Dispatch `/api/chat/` to the chat subtree's root route.
///
/// A nested router only matches the bare mount path and non-empty tails.
/// `OriginalUri` was already recorded by the outer router and still holds
/// the path as the client sent it.
async fn chat_trailing_slash(chat: Router, mut request: Request) -> Response {
    let root = match request.uri().query() {
        Some(query) => format!("/?{query}"),
        None => "/".to_string(),
    };
    match root.parse::<Uri>() {
        Ok(uri) => *request.uri_mut() = uri,
        Err(_) => return not_found().await,
    }
    match chat.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
