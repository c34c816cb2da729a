//! Leave record service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ request gate ──▶ handlers ──▶ LeaveService
//!                      (request id,    (origin/region,               │  validation
//!                       trace, limits)  rate limit,                  │  captcha | auth
//!                                       slow-down)                   ▼
//!     Client Response                                           RecordStore
//!     ◀────────────── response envelope ◀────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use leave_service::config::load_config;
use leave_service::http::HttpServer;
use leave_service::lifecycle::{build_state, wait_for_signal, Shutdown};
use leave_service::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "leave-service", version, about = "Leave record lookup and append service")]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "LEAVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("leave-service: configuration error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("leave-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        geo_enabled = config.access.geo_enabled,
        captcha_enabled = config.captcha.secret.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let state = build_state(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(state);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
