//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware in the fixed front-door order
//! - Bind server to listener
//! - Run background maintenance (rate-limit sweeping)
//! - Graceful shutdown on the lifecycle broadcast

use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::chat;
use crate::config::GatewayConfig;
use crate::http::response::{error_surface_middleware, panic_report};
use crate::observability::metrics;
use crate::routing;
use crate::security::{
    cors,
    headers::security_headers_middleware,
    limits::json_body_middleware,
    rate_limit::rate_limit_middleware,
    BodyLimit, FixedWindowLimiter, RateLimiterState,
};

/// HTTP front-door for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<FixedWindowLimiter>,
}

impl HttpServer {
    /// Create a server whose chat namespace forwards to `config.chat`.
    pub fn new(config: GatewayConfig) -> Self {
        let chat = chat::router(&config.chat);
        Self::with_chat(config, chat)
    }

    /// Create a server with a caller-supplied chat subtree.
    pub fn with_chat(config: GatewayConfig, chat: Router) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config.rate_limit));
        let router = Self::build_router(&config, chat, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers are listed innermost first; the request path runs them in
    /// reverse: trace → metrics → CORS → security headers → rate limit →
    /// error surface → panic catcher → body admission → routes/404.
    fn build_router(config: &GatewayConfig, chat: Router, limiter: Arc<FixedWindowLimiter>) -> Router {
        let rate_limit_state = Arc::new(RateLimiterState::new(&config.rate_limit, limiter));

        let mut app = routing::routes(chat)
            .layer(from_fn_with_state(
                BodyLimit(config.security.max_body_size),
                json_body_middleware,
            ))
            .layer(CatchPanicLayer::custom(panic_report))
            .layer(from_fn_with_state(
                config.environment.clone(),
                error_surface_middleware,
            ))
            .layer(from_fn_with_state(rate_limit_state, rate_limit_middleware));

        if config.security.enable_headers {
            app = app.layer(from_fn(security_headers_middleware));
        }

        app.layer(cors::cors_layer(&config.cors))
            .layer(from_fn(cors::preflight_no_content))
            .layer(from_fn(metrics::track_requests))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router.
    ///
    /// It can be served without connection info; the rate limiter then keys
    /// clients on trusted forwarding headers or one shared bucket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        if self.config.rate_limit.enabled {
            let every = Duration::from_secs(self.config.rate_limit.sweep_interval_secs.max(1));
            tokio::spawn(self.limiter.clone().run_sweeper(every, shutdown.resubscribe()));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
