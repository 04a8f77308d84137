//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener (fatal on failure)
//! - Start optional background services (metrics exporter)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last, after configuration has been validated

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ListenerConfig, ObservabilityConfig};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metrics address {address:?}")]
    MetricsAddress { address: String },
}

/// Bind the TCP listener for the configured host and port.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!(address = %local, "Listening for connections");
    }
    Ok(listener)
}

/// Start the Prometheus exporter if enabled.
pub fn start_metrics(config: &ObservabilityConfig) -> Result<(), StartupError> {
    if !config.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = config
        .metrics_address
        .parse()
        .map_err(|_| StartupError::MetricsAddress {
            address: config.metrics_address.clone(),
        })?;
    metrics::init_metrics(addr);
    Ok(())
}
