//! Chat namespace.
//!
//! Everything under `/api/chat` belongs to the downstream chat service. The
//! default subtree relays requests to `chat.upstream_url`; callers embedding
//! the gateway may mount their own `axum::Router` instead.

pub mod forward;

use axum::{routing::any, Router};
use std::sync::Arc;

use crate::config::ChatConfig;

pub use forward::{forward, ChatForwarder};

/// Mount point of the chat subtree.
pub const CHAT_MOUNT: &str = "/api/chat";

/// Chat subtree relaying every method and sub-path upstream.
pub fn router(config: &ChatConfig) -> Router {
    let forwarder = Arc::new(ChatForwarder::new(config));
    Router::new()
        .route("/", any(forward))
        .route("/{*rest}", any(forward))
        .with_state(forwarder)
}
