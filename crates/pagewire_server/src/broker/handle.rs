use super::commands::Command;
use crate::bridge::{BridgeInfo, BridgeState, LinkKey};
use crate::error::{BrokerError, BrokerResult};
use crate::subscription::{InstanceId, SinkId, Subscription};
use bytes::Bytes;
use pagewire_core::{validate_url, Delta, Page, Patch};
use pagewire_protocol::Direction;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Counters reported by [`BrokerHandle::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Pages in the store.
    pub pages: usize,
    /// Registered subscribers across all urls.
    pub subscribers: usize,
    /// Configured bridges.
    pub bridges: usize,
    /// Patches applied since start, excluding replay.
    pub patches_applied: u64,
    /// Subscribers dropped for falling behind.
    pub slow_consumers: u64,
    /// Log lines replayed at startup.
    pub replayed: u64,
}

/// Cloneable handle to a running broker.
#[derive(Clone, Debug)]
pub struct BrokerHandle {
    tx: mpsc::Sender<Command>,
    shutdown: CancellationToken,
    instance: InstanceId,
}

impl BrokerHandle {
    pub(crate) fn new(
        tx: mpsc::Sender<Command>,
        shutdown: CancellationToken,
        instance: InstanceId,
    ) -> Self {
        Self {
            tx,
            shutdown,
            instance,
        }
    }

    /// Random id chosen when the broker was built. Bridged patches carry
    /// the id of the broker they were first applied on.
    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    /// Parses `data` as a patch and applies it to the page at `url`.
    ///
    /// Returns once the patch is in the log and has been queued to every
    /// subscriber.
    ///
    /// # Errors
    ///
    /// `MalformedPatch` and `InvalidUrl` leave the store untouched. A log
    /// write failure is returned as `Io`; the patch is then neither applied
    /// nor published.
    pub async fn patch(&self, url: &str, data: &[u8]) -> BrokerResult<Delta> {
        let patch = Patch::parse(data)?;
        self.apply(url, patch).await
    }

    /// Applies an already validated patch.
    pub async fn apply(&self, url: &str, patch: Patch) -> BrokerResult<Delta> {
        self.apply_from(url, patch, None, None).await
    }

    pub(crate) async fn apply_from(
        &self,
        url: &str,
        patch: Patch,
        origin: Option<SinkId>,
        source: Option<InstanceId>,
    ) -> BrokerResult<Delta> {
        self.request(|reply| Command::Patch {
            url: url.to_string(),
            patch,
            origin,
            source,
            reply,
        })
        .await?
    }

    /// Registers a subscriber for `url`.
    ///
    /// The first event is always a snapshot of the page (or `None` if it
    /// does not exist yet); every later patch follows in order.
    pub async fn subscribe(&self, url: &str) -> BrokerResult<Subscription> {
        validate_url(url)?;
        self.request(|reply| Command::Subscribe {
            url: url.to_string(),
            reply,
        })
        .await?
    }

    /// Returns the marshalled page at `url`, or `None` if it was never written.
    pub async fn snapshot(&self, url: &str) -> BrokerResult<Option<Bytes>> {
        self.request(|reply| Command::Snapshot {
            url: url.to_string(),
            reply,
        })
        .await
    }

    /// Returns a copy of the page at `url`.
    pub async fn page(&self, url: &str) -> BrokerResult<Option<Page>> {
        self.request(|reply| Command::Page {
            url: url.to_string(),
            reply,
        })
        .await
    }

    /// Mirrors `url` with the peer at `host`, both directions.
    pub async fn bridge(&self, url: &str, host: &str) -> BrokerResult<()> {
        self.bridge_with(url, host, Direction::Both).await
    }

    /// Mirrors `url` with the peer at `host`.
    ///
    /// Returns after the first connect attempt. On `ConnectFailed` the
    /// bridge stays configured and keeps retrying with backoff. Starting a
    /// bridge that already exists is a no-op.
    pub async fn bridge_with(&self, url: &str, host: &str, direction: Direction) -> BrokerResult<()> {
        validate_url(url)?;
        self.request(|reply| Command::BridgeStart {
            key: LinkKey::new(url, host),
            direction,
            reply,
        })
        .await?
    }

    /// Stops and removes a bridge.
    ///
    /// # Errors
    ///
    /// Returns `BridgeNotFound` if no bridge exists for `url` and `host`.
    pub async fn unbridge(&self, url: &str, host: &str) -> BrokerResult<()> {
        self.request(|reply| Command::BridgeStop {
            key: LinkKey::new(url, host),
            reply,
        })
        .await?
    }

    /// Lists configured bridges, sorted by url then host.
    pub async fn bridges(&self) -> BrokerResult<Vec<BridgeInfo>> {
        self.request(|reply| Command::Bridges { reply }).await
    }

    /// Returns broker counters.
    pub async fn stats(&self) -> BrokerResult<BrokerStats> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Stops every bridge, syncs the log and closes all subscriptions.
    ///
    /// Calling this on a broker that is already stopped is a no-op.
    pub async fn shutdown(&self) {
        let _ = self.request(|reply| Command::Shutdown { reply }).await;
    }

    /// Token cancelled when the broker shuts down.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Returns true once the broker has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) async fn report_bridge_state(&self, key: &LinkKey, link_id: u64, state: BridgeState) {
        let _ = self
            .tx
            .send(Command::BridgeState {
                key: key.clone(),
                link_id,
                state,
            })
            .await;
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> BrokerResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| BrokerError::Closed)?;
        rx.await.map_err(|_| BrokerError::Closed)
    }
}
