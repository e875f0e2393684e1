//! Serve command implementation.

use pagewire_server::{Broker, BrokerConfig, PeerListener};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

/// A `--bridge URL=HOST` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeArg {
    /// Page to mirror.
    pub url: String,
    /// Peer address.
    pub host: String,
}

/// Parses `URL=HOST`. The url is everything before the first `=`.
pub fn parse_bridge(arg: &str) -> Result<BridgeArg, String> {
    let (url, host) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected URL=HOST, got {arg:?}"))?;
    if url.is_empty() || host.is_empty() {
        return Err(format!("expected URL=HOST, got {arg:?}"));
    }
    Ok(BridgeArg {
        url: url.to_string(),
        host: host.to_string(),
    })
}

/// Builds the broker settings from the command line.
pub fn broker_config(aof: Option<PathBuf>, sync_on_write: bool, create: bool) -> BrokerConfig {
    let mut config = BrokerConfig::default()
        .with_sync_on_write(sync_on_write)
        .with_create_if_missing(create);
    if let Some(path) = aof {
        config = config.with_aof(path);
    }
    config
}

/// Runs the serve command until Ctrl-C.
pub async fn run(
    listen: SocketAddr,
    config: BrokerConfig,
    bridges: Vec<BridgeArg>,
) -> Result<(), Box<dyn std::error::Error>> {
    let broker = Broker::open(config)?;
    let pages = broker.store().len();
    let handle = broker.start();

    let listener = PeerListener::bind(listen, handle.clone()).await?;
    info!(addr = %listener.local_addr()?, pages, "pagewire serving");
    let accept = listener.spawn();

    for link in bridges {
        match handle.bridge(&link.url, &link.host).await {
            Ok(()) => info!(url = %link.url, host = %link.host, "bridge connected"),
            Err(e) if e.is_retryable() => {
                warn!(url = %link.url, host = %link.host, error = %e, "bridge down, retrying in background");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await;
    accept.await??;

    Ok(())
}
