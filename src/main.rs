//! Forward HTTP Proxy
//!
//! A forward proxy with opaque HTTPS tunneling (CONNECT) and
//! domain-based access control, built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                 FORWARD PROXY                  │
//!                    │                                                │
//!   Client ─────────▶│  acceptor ──▶ task queue ──▶ worker pool (N)   │
//!                    │                                   │            │
//!                    │                          connection handler    │
//!                    │                     parse → blocklist → relay  │
//!                    │                                   │            │
//!                    │            forward (HTTP)  /  tunnel (CONNECT) │
//!                    │                                   │            │
//!                    └───────────────────────────────────┼────────────┘
//!                                                        ▼
//!                                                      Origin
//!
//!   Cross-cutting: config, blocklist, access log, metrics, lifecycle
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forward_proxy::blocklist::{load_blocklist, Blocklist};
use forward_proxy::config::loader::load_config;
use forward_proxy::lifecycle::{signals, Shutdown};
use forward_proxy::net::listener::Listener;
use forward_proxy::observability::{AccessLog, ProxyMetrics};
use forward_proxy::server::{ProxyContext, ProxyServer};

/// Forward HTTP proxy with CONNECT tunneling and domain blocking.
#[derive(Debug, Parser)]
#[command(name = "forward-proxy", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/proxy.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("forward_proxy={}", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("forward-proxy v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        port = config.listener.port,
        pool_size = config.workers.pool_size,
        connection_timeout_secs = config.timeouts.connection_secs,
        blocklist_enabled = config.filtering.enable_blocklist,
        tunneling_enabled = config.filtering.enable_https_tunnel,
        "Configuration loaded"
    );

    let blocklist = if config.filtering.enable_blocklist {
        load_blocklist(Path::new(&config.filtering.blocklist_file))?
    } else {
        Blocklist::new()
    };

    let access_log = Arc::new(if config.observability.access_log_enabled {
        AccessLog::open(
            &config.observability.access_log_file,
            config.observability.access_log_max_size_bytes,
        )
    } else {
        AccessLog::disabled()
    });
    let metrics = Arc::new(ProxyMetrics::with_file(&config.observability.metrics_file));

    let listener = Listener::bind(&config.listener).await?;
    access_log.log(&format!(
        "Starting proxy server on {}:{}",
        config.listener.bind_address, config.listener.port
    ));

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::watch_signals(Arc::clone(&shutdown)));

    let server = ProxyServer::new(ProxyContext {
        config,
        blocklist: Arc::new(blocklist),
        access_log: Arc::clone(&access_log),
        metrics,
    });
    server.run(listener, shutdown).await;

    access_log.log("Proxy server stopped cleanly");
    tracing::info!("Shutdown complete");
    Ok(())
}
