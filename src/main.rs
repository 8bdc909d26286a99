//! hub-gate
//!
//! Authenticated forwarding gate in front of a notebook hub.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                   HUB GATE                    │
//!   Front-end request     │  ┌────────┐   ┌───────────┐   ┌────────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│   auth    │──▶│  forward   │  │
//!                         │  │ server │   │   gate    │   │ dispatcher │  │
//!                         │  └────────┘   └───────────┘   └─────┬──────┘  │
//!                         │                                     │         │
//!   GET: redirect signal  │                         GET ◀───────┤         │
//!   ◀─────────────────────┼──                                   │ POST    │
//!                         │                                     ▼         │
//!   POST: relayed reply   │  ┌──────────┐                ┌────────────┐   │
//!   ◀─────────────────────┼──│ response │◀───────────────│   client   │◀──┼── Hub
//!                         │  │  relay   │                │ (timeout)  │   │
//!                         │  └──────────┘                └────────────┘   │
//!                         │                                               │
//!                         │  config (hot reload) · admin API · metrics    │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use hub_gate::admin::setup_admin_router;
use hub_gate::config::{resolve_config, watcher::ConfigWatcher};
use hub_gate::http::{AppState, HttpServer};
use hub_gate::lifecycle::{signals::wait_for_signal, Shutdown};
use hub_gate::observability::{logging, metrics};

const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "hub-gate")]
#[command(about = "Authenticated forwarding gate for a notebook hub", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hub-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        federation = config.federation.metadata_path.is_some(),
        authorization_groups = config.authorization.groups.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let state = AppState::new(config.clone());
    state.prune_sessions(SESSION_PRUNE_INTERVAL, shutdown.subscribe());

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            state.follow_config(updates);
            Some(watcher.run()?)
        }
        None => None,
    };

    let admin = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        let router = setup_admin_router(state.clone());
        let signal = shutdown.subscribe();
        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal.recv())
                .await
        }))
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(state);
    server.run(listener, shutdown.subscribe()).await?;

    shutdown.trigger();
    if let Some(admin) = admin {
        admin.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
