use super::session;
use crate::broker::BrokerHandle;
use crate::error::{BrokerError, BrokerResult};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Accepts bridges opened by peer instances.
///
/// Each connection must start with a hello naming the page to mirror. The
/// session then runs with the direction reversed: a peer that pushes is
/// one we pull from. Sessions end when the peer disconnects or the broker
/// shuts down; reconnecting is the initiator's job.
pub struct PeerListener {
    listener: TcpListener,
    broker: BrokerHandle,
}

impl PeerListener {
    /// Binds to `addr`. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr, broker: BrokerHandle) -> BrokerResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, broker })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> BrokerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts peers until the broker shuts down.
    pub async fn run(self) -> BrokerResult<()> {
        let shutdown = self.broker.shutdown_token().clone();
        info!(addr = ?self.listener.local_addr().ok(), "accepting bridges");

        loop {
            let (stream, addr) = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let broker = self.broker.clone();
            let cancel = shutdown.child_token();
            tokio::spawn(async move {
                if let Err(e) = serve_peer(stream, addr, &broker, &cancel).await {
                    debug!(%addr, error = %e, "bridge session ended");
                }
            });
        }
    }

    /// Runs [`PeerListener::run`] on a new task.
    pub fn spawn(self) -> JoinHandle<BrokerResult<()>> {
        tokio::spawn(self.run())
    }
}

async fn serve_peer(
    stream: TcpStream,
    addr: SocketAddr,
    broker: &BrokerHandle,
    cancel: &CancellationToken,
) -> BrokerResult<()> {
    let _ = stream.set_nodelay(true);
    let mut ws = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| BrokerError::ConnectionLost(e.to_string()))?;

    let (url, direction) = session::accept(&mut ws).await?;
    info!(%addr, url = %url, %direction, "peer bridged");

    session::mirror(ws, &url, direction, broker, cancel).await
}
