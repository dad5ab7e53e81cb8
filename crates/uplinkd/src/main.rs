//! uplinkd — the satellite gateway daemon.
//!
//! Single binary that assembles the pipeline: the bounded script
//! cache, the source fetcher, the script engine, and the HTTP gateway
//! in front of them.
//!
//! # Usage
//!
//! ```text
//! uplinkd [--port 8080] [--local-only] [--cache-capacity 1000]
//!         [--max-satellite-size 131072] [--fetch-timeout 30]
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use uplink_core::GatewayConfig;
use uplink_core::config::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_SATELLITE_SIZE};
use uplink_fetch::SatelliteFetcher;
use uplink_gateway::{Gateway, GatewayServer};
use uplink_runtime::{SatelliteEngine, ScriptCache};

#[derive(Parser)]
#[command(name = "uplinkd", about = "Uplink satellite gateway daemon")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Bind to the loopback interface only. Useful for development:
    /// some desktop firewalls prompt on every (re)start of a wildcard
    /// listener.
    #[arg(long)]
    local_only: bool,

    /// Maximum number of compiled satellites to cache.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Maximum declared satellite source size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_SATELLITE_SIZE)]
    max_satellite_size: usize,

    /// Timeout on the upstream satellite fetch, in seconds.
    #[arg(long, default_value = "30")]
    fetch_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,uplinkd=debug,uplink=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig {
        bind_addr: GatewayConfig::bind(cli.port, cli.local_only),
        cache_capacity: cli.cache_capacity,
        max_satellite_size: cli.max_satellite_size,
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
    };

    info!("uplink daemon starting");

    // The cache is the only process-wide state; failing to build it is
    // fatal before the listener ever opens.
    let cache =
        ScriptCache::new(config.cache_capacity).context("error creating satellite cache")?;
    let fetcher = SatelliteFetcher::new(config.max_satellite_size, config.fetch_timeout)
        .context("error building satellite fetch client")?;
    let gateway = Arc::new(Gateway::new(cache, fetcher, SatelliteEngine::new()));

    let server = GatewayServer::bind(config.bind_addr, gateway).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    server.serve(shutdown_rx).await?;

    info!("uplink daemon stopped");
    Ok(())
}
