//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format outside development, pretty format in development
//! - RUST_LOG takes precedence over the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, ObservabilityConfig};

/// Default filter when RUST_LOG is not set.
pub fn default_filter(level: &str) -> String {
    format!("yamifit_gateway={level},tower_http={level}")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig, environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));
    let development = environment.is_development();

    tracing_subscriber::registry()
        .with(filter)
        .with(development.then(|| fmt::layer().pretty()))
        .with((!development).then(|| fmt::layer().json()))
        .init();
}
