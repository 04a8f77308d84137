//! YamiFit API gateway
//!
//! HTTP front-door for the YamiFit backend, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ trace ─▶ metrics ─▶ CORS ─▶ security headers ─▶ rate limit
//!                                                                        │
//!                                                                        ▼
//!                          error surface ◀─ panic catcher ◀─ JSON body admission
//!                                │
//!                                ▼
//!                   ┌────────────────────────────┐
//!                   │ routing                    │
//!                   │   GET /health  → probe     │
//!                   │   /api/chat/*  → chat svc  │──────▶ Chat upstream
//!                   │   *            → 404 JSON  │
//!                   └────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use yamifit_gateway::config::load_config;
use yamifit_gateway::lifecycle::{signals, startup};
use yamifit_gateway::observability::logging;
use yamifit_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "yamifit-gateway")]
#[command(about = "HTTP API gateway for YamiFit", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port (takes precedence over PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("yamifit-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability, &config.environment);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.listener.port,
        allowed_origins = ?config.cors.allowed_origins,
        chat_upstream = ?config.chat.upstream_url,
        "yamifit-gateway starting"
    );

    if let Err(e) = startup::start_metrics(&config.observability) {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    let listener = match startup::bind(&config.listener).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        signals::shutdown_on_signal(&shutdown).await;
    });

    if let Err(e) = server.run(listener, receiver).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
