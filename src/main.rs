//! KF HTTP Redirect Server
//!
//! Serves the compressed `.uz2` packages a Killing Floor dedicated server
//! points its clients at, and bans clients that request too fast.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                 REDIRECT SERVER                  │
//!                  │                                                  │
//!  Client Request  │  ┌────────┐   ┌────────────┐   ┌─────────────┐   │
//!  ────────────────┼─▶│  http  │──▶│  security  │──▶│   handler   │   │
//!                  │  │ server │   │ ban + rate │   │ path policy │   │
//!                  │  └────────┘   └────────────┘   └──────┬──────┘   │
//!                  │                                       │          │
//!  Client Response │                                       ▼          │
//!  ◀───────────────┼──────────────────────────────── ServeFile (root)  │
//!                  │                                                  │
//!                  │  config · observability · lifecycle              │
//!                  └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use kfrs::config::{resolve_config, Args, RedirectConfig};
use kfrs::lifecycle::signals::wait_for_signal;
use kfrs::observability::{init_logging, metrics};
use kfrs::RedirectServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    init_logging(&config.logging)?;
    log_settings(&config);

    if config.metrics.enabled {
        match config.metrics.address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.metrics.address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut server = RedirectServer::new(config.server.clone());
    tracing::info!(address = %server.address(), "Starting the HTTP Redirect Server");
    if let Err(e) = server.start().await {
        tracing::error!(error = %e, "Failed to start the HTTP Redirect Server");
        return Err(e.into());
    }
    tracing::info!(
        root_dir = %server.root_directory().display(),
        address = %server.address(),
        "HTTP Redirect Server started"
    );

    if let Err(e) = wait_for_signal().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signals");
    }

    tracing::info!("Shutting down...");
    if let Err(e) = server.stop().await {
        tracing::error!(error = %e, "Server did not shut down cleanly");
    }
    tracing::info!("The HTTP Redirect Server has been stopped");
    Ok(())
}

fn log_settings(config: &RedirectConfig) {
    let server = &config.server;
    let logging = &config.logging;
    tracing::info!(
        host = %server.host,
        port = server.port,
        serve_dir = %server.serve_dir.display(),
        max_requests_per_minute = server.max_requests,
        ban_time_minutes = server.ban_time,
        "Server settings"
    );
    tracing::info!(
        level = %logging.level,
        to_file = logging.to_file,
        file = %logging.file.display(),
        file_format = %logging.file_format,
        max_size_mb = logging.max_size,
        max_backups = logging.max_backups,
        max_age_days = logging.max_age,
        "Log settings"
    );
}
