//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware pipeline)
//!     → request.rs (client identity, body classification)
//!     → security/* (CORS, headers, rate limit, body admission)
//!     → routing (health, chat, 404)
//!     → response.rs (uniform JSON errors)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use response::{ApiError, ErrorReport};
pub use server::HttpServer;
