use super::commands::Command;
use super::handle::{BrokerHandle, BrokerStats};
use crate::bridge::{BridgeInfo, BridgeState, Link, LinkKey};
use crate::config::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::subscription::{CloseReason, InstanceId, PageEvent, Sink, SinkId, Subscription};
use bytes::Bytes;
use pagewire_core::{replay, validate_url, Aof, CoreError, Delta, PageStore, Patch};
use pagewire_protocol::Direction;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct LinkEntry {
    id: u64,
    direction: Direction,
    state: BridgeState,
    connects: u64,
    cancel: CancellationToken,
}

/// The broker actor.
///
/// Created with [`Broker::open`], which replays the log, then turned into
/// a running task with [`Broker::start`].
pub struct Broker {
    config: BrokerConfig,
    store: PageStore,
    aof: Option<Aof>,
    sinks: HashMap<String, Vec<Sink>>,
    sink_urls: HashMap<SinkId, String>,
    next_sink: SinkId,
    links: BTreeMap<LinkKey, LinkEntry>,
    next_link: u64,
    stats: BrokerStats,
    shutdown: CancellationToken,
    instance: InstanceId,
}

impl Broker {
    /// Builds a broker, replaying the configured log into a fresh store.
    ///
    /// # Errors
    ///
    /// Returns `LogUnavailable` if the log is missing and
    /// `create_if_missing` is off, or if it cannot be opened for reading
    /// or appending. Read failures part way through are returned as `Io`.
    /// Corrupt lines are skipped.
    pub fn open(config: BrokerConfig) -> BrokerResult<Self> {
        let mut store = PageStore::new();
        let mut replayed = 0;

        let aof = match &config.aof_path {
            Some(path) => {
                match path.try_exists() {
                    Ok(true) => {
                        let stats = replay(path, &mut store)?;
                        replayed = stats.lines_used;
                    }
                    Ok(false) if config.create_if_missing => {
                        warn!(path = %path.display(), "log not found, starting with an empty store");
                    }
                    Ok(false) => {
                        return Err(CoreError::LogUnavailable {
                            path: path.clone(),
                            source: io::Error::new(io::ErrorKind::NotFound, "log file not found"),
                        }
                        .into());
                    }
                    Err(source) => {
                        return Err(CoreError::LogUnavailable {
                            path: path.clone(),
                            source,
                        }
                        .into());
                    }
                }
                Some(Aof::open(path, config.sync_on_write)?)
            }
            None => None,
        };

        Ok(Self {
            config,
            store,
            aof,
            sinks: HashMap::new(),
            sink_urls: HashMap::new(),
            next_sink: 1,
            links: BTreeMap::new(),
            next_link: 1,
            stats: BrokerStats {
                replayed,
                ..BrokerStats::default()
            },
            shutdown: CancellationToken::new(),
            instance: rand::thread_rng().gen(),
        })
    }

    /// Builds an in-memory broker with default settings.
    pub fn in_memory() -> Self {
        Self {
            config: BrokerConfig::default(),
            store: PageStore::new(),
            aof: None,
            sinks: HashMap::new(),
            sink_urls: HashMap::new(),
            next_sink: 1,
            links: BTreeMap::new(),
            next_link: 1,
            stats: BrokerStats::default(),
            shutdown: CancellationToken::new(),
            instance: rand::thread_rng().gen(),
        }
    }

    /// Returns the replayed store, for inspection before starting.
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Spawns the actor on the current tokio runtime.
    pub fn start(self) -> BrokerHandle {
        // The config fields are public, so the builders' clamp may have been bypassed.
        let (tx, rx) = mpsc::channel(self.config.command_capacity.max(1));
        let handle = BrokerHandle::new(tx.clone(), self.shutdown.clone(), self.instance);
        // The actor only keeps a weak sender for spawning links, so it
        // stops once every handle is gone.
        tokio::spawn(self.run(rx, tx.downgrade()));
        handle
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, weak: mpsc::WeakSender<Command>) {
        info!(pages = self.store.len(), "broker started");

        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Patch {
                    url,
                    patch,
                    origin,
                    source,
                    reply,
                } => {
                    let _ = reply.send(self.handle_patch(&url, patch, origin, source));
                }
                Command::Subscribe { url, reply } => {
                    let subscription = weak
                        .upgrade()
                        .map(|tx| self.handle_subscribe(&url, tx))
                        .ok_or(BrokerError::Closed);
                    let _ = reply.send(subscription);
                }
                Command::Unsubscribe { id, reply } => {
                    self.handle_unsubscribe(id);
                    if let Some(reply) = reply {
                        let _ = reply.send(());
                    }
                }
                Command::Snapshot { url, reply } => {
                    let _ = reply.send(self.store.marshal(&url).map(Bytes::from));
                }
                Command::Page { url, reply } => {
                    let _ = reply.send(self.store.at(&url).cloned());
                }
                Command::BridgeStart {
                    key,
                    direction,
                    reply,
                } => match weak.upgrade() {
                    Some(tx) => self.handle_bridge_start(key, direction, tx, reply),
                    None => {
                        let _ = reply.send(Err(BrokerError::Closed));
                    }
                },
                Command::BridgeStop { key, reply } => {
                    let _ = reply.send(self.handle_bridge_stop(&key));
                }
                Command::BridgeState {
                    key,
                    link_id,
                    state,
                } => self.handle_bridge_state(&key, link_id, state),
                Command::Bridges { reply } => {
                    let _ = reply.send(self.bridge_infos());
                }
                Command::Stats { reply } => {
                    self.prune_closed_sinks();
                    let _ = reply.send(self.current_stats());
                }
                Command::Shutdown { reply } => {
                    self.close();
                    let _ = reply.send(());
                    return;
                }
            }
        }

        self.close();
    }

    /// Validates, logs, applies, then publishes.
    fn handle_patch(
        &mut self,
        url: &str,
        patch: Patch,
        origin: Option<SinkId>,
        source: Option<InstanceId>,
    ) -> BrokerResult<Delta> {
        validate_url(url)?;
        let data = Bytes::from(patch.to_bytes());

        if let Some(aof) = self.aof.as_mut() {
            if let Err(e) = aof.append(url, &data) {
                error!(url, error = %e, "log append failed, patch rejected");
                return Err(e.into());
            }
        }

        let delta = self.store.apply(url, &patch)?;
        self.stats.patches_applied += 1;
        debug!(url, ops = patch.len(), rows = delta.changes().count(), "patch applied");

        self.publish(
            url,
            PageEvent::Patch {
                patch: Arc::new(patch),
                data,
                source: source.unwrap_or(self.instance),
            },
            origin,
        );
        Ok(delta)
    }

    fn handle_subscribe(&mut self, url: &str, commands: mpsc::Sender<Command>) -> Subscription {
        let id = self.next_sink;
        self.next_sink += 1;

        let snapshot = self.store.marshal(url).map(Bytes::from);
        let (sink, subscription) =
            Sink::pair(id, url, self.config.sink_capacity.max(1), snapshot, commands);

        self.sinks.entry(url.to_string()).or_default().push(sink);
        self.sink_urls.insert(id, url.to_string());
        debug!(url, id, "subscribed");
        subscription
    }

    fn handle_unsubscribe(&mut self, id: SinkId) {
        let Some(url) = self.sink_urls.remove(&id) else {
            return;
        };
        if let Some(sinks) = self.sinks.get_mut(&url) {
            sinks.retain(|s| s.id != id);
            if sinks.is_empty() {
                self.sinks.remove(&url);
            }
        }
        debug!(url, id, "unsubscribed");
    }

    /// Queues an event to every subscriber of `url` except `origin`.
    ///
    /// Never blocks. A subscriber whose queue is full is disconnected with
    /// `SlowConsumer`.
    fn publish(&mut self, url: &str, event: PageEvent, origin: Option<SinkId>) {
        let Some(sinks) = self.sinks.get_mut(url) else {
            return;
        };

        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(sinks.len());
        for sink in sinks.drain(..) {
            if Some(sink.id) == origin {
                kept.push(sink);
                continue;
            }
            match sink.events.try_send(event.clone()) {
                Ok(()) => kept.push(sink),
                Err(TrySendError::Full(_)) => {
                    warn!(url, id = sink.id, "subscriber too slow, disconnecting");
                    dropped.push(sink.id);
                    sink.close(CloseReason::SlowConsumer);
                    self.stats.slow_consumers += 1;
                }
                Err(TrySendError::Closed(_)) => dropped.push(sink.id),
            }
        }

        if kept.is_empty() {
            self.sinks.remove(url);
        } else {
            *sinks = kept;
        }
        for id in dropped {
            self.sink_urls.remove(&id);
        }
    }

    fn handle_bridge_start(
        &mut self,
        key: LinkKey,
        direction: Direction,
        commands: mpsc::Sender<Command>,
        reply: oneshot::Sender<BrokerResult<()>>,
    ) {
        if self.links.contains_key(&key) {
            let _ = reply.send(Ok(()));
            return;
        }

        let id = self.next_link;
        self.next_link += 1;
        let cancel = self.shutdown.child_token();

        info!(url = %key.url, host = %key.host, %direction, "bridge starting");
        let link = Link {
            key: key.clone(),
            id,
            direction,
            retry: self.config.retry.clone(),
            connect_timeout: self.config.connect_timeout,
            broker: BrokerHandle::new(commands, self.shutdown.clone(), self.instance),
            cancel: cancel.clone(),
            first_attempt: Some(reply),
        };
        tokio::spawn(link.run());

        self.links.insert(
            key,
            LinkEntry {
                id,
                direction,
                state: BridgeState::Connecting,
                connects: 0,
                cancel,
            },
        );
    }

    fn handle_bridge_stop(&mut self, key: &LinkKey) -> BrokerResult<()> {
        let entry = self.links.remove(key).ok_or_else(|| BrokerError::BridgeNotFound {
            url: key.url.clone(),
            host: key.host.clone(),
        })?;
        entry.cancel.cancel();
        info!(url = %key.url, host = %key.host, "bridge stopped");
        Ok(())
    }

    fn handle_bridge_state(&mut self, key: &LinkKey, link_id: u64, state: BridgeState) {
        let Some(entry) = self.links.get_mut(key) else {
            return;
        };
        if entry.id != link_id {
            return;
        }
        if state == BridgeState::Connected {
            entry.connects += 1;
        }
        entry.state = state;
    }

    fn bridge_infos(&self) -> Vec<BridgeInfo> {
        self.links
            .iter()
            .map(|(key, entry)| BridgeInfo {
                url: key.url.clone(),
                host: key.host.clone(),
                direction: entry.direction,
                state: entry.state,
                connects: entry.connects,
            })
            .collect()
    }

    /// Forgets subscribers whose receiving side is gone but whose
    /// unsubscribe never reached the queue.
    fn prune_closed_sinks(&mut self) {
        let mut pruned = Vec::new();
        self.sinks.retain(|_, sinks| {
            sinks.retain(|sink| {
                let open = !sink.events.is_closed();
                if !open {
                    pruned.push(sink.id);
                }
                open
            });
            !sinks.is_empty()
        });
        for id in pruned {
            self.sink_urls.remove(&id);
            debug!(id, "pruned closed subscriber");
        }
    }

    fn current_stats(&self) -> BrokerStats {
        BrokerStats {
            pages: self.store.len(),
            subscribers: self.sink_urls.len(),
            bridges: self.links.len(),
            ..self.stats.clone()
        }
    }

    fn close(&mut self) {
        self.shutdown.cancel();
        self.links.clear();

        if let Some(aof) = self.aof.as_mut() {
            if let Err(e) = aof.sync() {
                warn!(error = %e, "log sync on shutdown failed");
            }
        }

        let subscribers = self.sink_urls.len();
        self.sinks.clear();
        self.sink_urls.clear();
        info!(subscribers, patches = self.stats.patches_applied, "broker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewire_core::{PatchOp, Value};

    const SET_X1: &[u8] = br#"{"op":"set","row":"r1","fields":{"x":1}}"#;
    const SET_X2: &[u8] = br#"{"op":"set","row":"r1","fields":{"x":2}}"#;

    fn patch_data(event: PageEvent) -> Bytes {
        match event {
            PageEvent::Patch { data, .. } => data,
            other => panic!("expected patch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn snapshot_then_patches() {
        let broker = Broker::in_memory().start();
        let mut sub = broker.subscribe("/demo").await.unwrap();

        broker.patch("/demo", SET_X1).await.unwrap();
        broker.patch("/demo", SET_X2).await.unwrap();

        assert_eq!(sub.recv().await.unwrap(), PageEvent::Snapshot(None));
        assert_eq!(
            patch_data(sub.recv().await.unwrap()),
            Patch::parse(SET_X1).unwrap().to_bytes()
        );
        assert_eq!(
            patch_data(sub.recv().await.unwrap()),
            Patch::parse(SET_X2).unwrap().to_bytes()
        );
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn late_subscriber_gets_current_snapshot() {
        let broker = Broker::in_memory().start();
        broker.patch("/demo", SET_X1).await.unwrap();

        let mut sub = broker.subscribe("/demo").await.unwrap();
        let PageEvent::Snapshot(Some(bytes)) = sub.recv().await.unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(&bytes[..], br#"{"r1":{"x":1}}"#);

        broker.patch("/demo", SET_X2).await.unwrap();
        assert!(matches!(sub.recv().await.unwrap(), PageEvent::Patch { .. }));
    }

    #[tokio::test]
    async fn subscribers_see_same_order() {
        let broker = Broker::in_memory().start();
        let mut a = broker.subscribe("/p").await.unwrap();
        let mut b = broker.subscribe("/p").await.unwrap();

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let broker = broker.clone();
                tokio::spawn(async move {
                    let op = PatchOp::set_field("r", "n", i);
                    broker.apply("/p", Patch::new(vec![op]).unwrap()).await.unwrap();
                })
            })
            .collect();
        for w in writers {
            w.await.unwrap();
        }

        let mut seen_a = Vec::new();
        let mut seen_b = Vec::new();
        a.recv().await.unwrap();
        b.recv().await.unwrap();
        for _ in 0..20 {
            seen_a.push(patch_data(a.recv().await.unwrap()));
            seen_b.push(patch_data(b.recv().await.unwrap()));
        }
        assert_eq!(seen_a, seen_b);

        // The final state matches the last patch everyone saw.
        let last = Patch::parse(seen_a.last().unwrap()).unwrap();
        let PatchOp::SetField { value, .. } = &last.ops()[0] else {
            panic!("unexpected op");
        };
        let page = broker.page("/p").await.unwrap().unwrap();
        assert_eq!(page.field("r", "n"), Some(value));
    }

    #[tokio::test]
    async fn malformed_patch_is_rejected_and_not_published() {
        let broker = Broker::in_memory().start();
        let mut sub = broker.subscribe("/p").await.unwrap();
        sub.recv().await.unwrap();

        let err = broker.patch("/p", b"{nope").await.unwrap_err();
        assert!(err.is_client_error());
        assert!(sub.try_recv().is_none());
        assert_eq!(broker.snapshot("/p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let broker = Broker::in_memory().start();
        assert!(broker.patch("/a b", SET_X1).await.is_err());
        assert!(broker.subscribe("").await.is_err());
    }

    #[tokio::test]
    async fn origin_is_not_echoed() {
        let broker = Broker::in_memory().start();
        let mut origin = broker.subscribe("/p").await.unwrap();
        let mut other = broker.subscribe("/p").await.unwrap();
        origin.recv().await.unwrap();
        other.recv().await.unwrap();

        let patch = Patch::parse(SET_X1).unwrap();
        broker
            .apply_from("/p", patch, Some(origin.id()), None)
            .await
            .unwrap();

        assert!(matches!(other.recv().await.unwrap(), PageEvent::Patch { .. }));
        assert!(origin.try_recv().is_none());
    }

    #[tokio::test]
    async fn slow_consumer_is_disconnected() {
        let config = BrokerConfig::default().with_sink_capacity(2);
        let broker = Broker::open(config).unwrap().start();
        let mut slow = broker.subscribe("/p").await.unwrap();
        let mut fast = broker.subscribe("/p").await.unwrap();

        // Snapshot + one patch fill the slow queue; the next overflows it.
        for i in 0..3 {
            let op = PatchOp::set_field("r", "n", i);
            broker.apply("/p", Patch::new(vec![op]).unwrap()).await.unwrap();
            while fast.try_recv().is_some() {}
        }

        assert!(matches!(slow.recv().await.unwrap(), PageEvent::Snapshot(None)));
        assert!(matches!(slow.recv().await.unwrap(), PageEvent::Patch { .. }));
        assert!(matches!(slow.recv().await, Err(BrokerError::SlowConsumer)));

        let stats = broker.stats().await.unwrap();
        assert_eq!(stats.slow_consumers, 1);
        assert_eq!(stats.subscribers, 1);

        // The broker itself is unaffected.
        broker.patch("/p", SET_X1).await.unwrap();
        assert!(matches!(fast.recv().await.unwrap(), PageEvent::Patch { .. }));
    }

    #[tokio::test]
    async fn dropped_subscription_unregisters() {
        let broker = Broker::in_memory().start();
        let sub = broker.subscribe("/p").await.unwrap();
        let other = broker.subscribe("/q").await.unwrap();
        assert_eq!(broker.stats().await.unwrap().subscribers, 2);

        drop(sub);
        other.unsubscribe().await;
        assert_eq!(broker.stats().await.unwrap().subscribers, 0);
    }

    #[tokio::test]
    async fn patches_are_logged_and_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.log");

        let config = BrokerConfig::default()
            .with_aof(&path)
            .with_create_if_missing(true);
        let broker = Broker::open(config).unwrap().start();
        broker.patch("/demo", SET_X1).await.unwrap();
        broker
            .patch("/demo", br#"{"op":"set_field","row":"r2","field":"y","value":"b"}"#)
            .await
            .unwrap();
        broker.patch("/demo", b"garbage").await.unwrap_err();
        broker.shutdown().await;

        let reopened = Broker::open(BrokerConfig::default().with_aof(&path)).unwrap();
        let page = reopened.store().at("/demo").unwrap();
        assert_eq!(page.field("r1", "x"), Some(&Value::from(1)));
        assert_eq!(page.field("r2", "y"), Some(&Value::from("b")));

        let broker = reopened.start();
        assert_eq!(broker.stats().await.unwrap().replayed, 2);
    }

    #[tokio::test]
    async fn subscribe_mid_stream_has_no_gap_or_duplicate() {
        let broker = Broker::in_memory().start();

        let writer = {
            let broker = broker.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let op = PatchOp::set_field(format!("r{i}"), "n", i);
                    broker.apply("/p", Patch::new(vec![op]).unwrap()).await.unwrap();
                }
            })
        };
        let noise = {
            let broker = broker.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    let op = PatchOp::set_field("r", "n", i);
                    broker.apply("/other", Patch::new(vec![op]).unwrap()).await.unwrap();
                }
            })
        };

        while broker.page("/p").await.unwrap().map_or(0, |p| p.len()) < 20 {
            tokio::task::yield_now().await;
        }
        let mut sub = broker.subscribe("/p").await.unwrap();
        writer.await.unwrap();
        noise.await.unwrap();

        let mut rebuilt = PageStore::new();
        let mut next = 0;
        if let PageEvent::Snapshot(Some(bytes)) = sub.recv().await.unwrap() {
            let page = pagewire_core::Page::unmarshal(&bytes).unwrap();
            next = page.len();
            if let Some(patch) = page.to_patch() {
                rebuilt.apply("/p", &patch).unwrap();
            }
        }
        assert!(next >= 20);

        while let Some(event) = sub.try_recv() {
            let PageEvent::Patch { patch, .. } = event else {
                panic!("unexpected {event:?}");
            };
            assert_eq!(patch.ops()[0].row(), format!("r{next}"));
            rebuilt.apply("/p", &patch).unwrap();
            next += 1;
        }
        assert_eq!(next, 200);
        assert_eq!(rebuilt.at("/p"), broker.page("/p").await.unwrap().as_ref());
    }

    #[tokio::test]
    async fn zero_capacities_are_clamped() {
        let config = BrokerConfig {
            command_capacity: 0,
            sink_capacity: 0,
            ..BrokerConfig::default()
        };
        let broker = Broker::open(config).unwrap().start();

        let mut sub = broker.subscribe("/p").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), PageEvent::Snapshot(None));
        broker.patch("/p", SET_X1).await.unwrap();
        assert!(matches!(sub.recv().await.unwrap(), PageEvent::Patch { .. }));
        assert_eq!(broker.stats().await.unwrap().subscribers, 1);
    }

    #[test]
    fn stats_skip_subscribers_whose_unsubscribe_was_lost() {
        let mut broker = Broker::in_memory();
        let (tx, _rx) = mpsc::channel(1);
        let sub = broker.handle_subscribe("/p", tx.clone());
        let kept = broker.handle_subscribe("/q", tx.clone());

        // Fill the queue so the drop cannot enqueue its unsubscribe.
        let (reply, _) = oneshot::channel();
        tx.try_send(Command::Stats { reply }).unwrap();
        drop(sub);
        assert_eq!(broker.sink_urls.len(), 2);

        broker.prune_closed_sinks();
        assert_eq!(broker.current_stats().subscribers, 1);
        assert!(!broker.sinks.contains_key("/p"));
        drop(kept);
    }

    #[tokio::test]
    async fn unsubscribe_after_shutdown_returns() {
        let broker = Broker::in_memory().start();
        let sub = broker.subscribe("/p").await.unwrap();
        broker.shutdown().await;
        sub.unsubscribe().await;
    }

    #[test]
    fn missing_log_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.log");

        let err = Broker::open(BrokerConfig::default().with_aof(&path)).err().unwrap();
        assert!(matches!(err, BrokerError::Core(CoreError::LogUnavailable { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn missing_log_is_created_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.log");
        let config = BrokerConfig::default()
            .with_aof(&path)
            .with_create_if_missing(true);

        let broker = Broker::open(config).unwrap();
        assert!(broker.store().is_empty());
        assert!(path.exists());

        // Once created, the log is reopened without the flag.
        Broker::open(BrokerConfig::default().with_aof(&path)).unwrap();
    }

    #[test]
    fn unreadable_log_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = BrokerConfig::default()
            .with_aof(dir.path())
            .with_create_if_missing(true);

        assert!(Broker::open(config).is_err());
    }

    #[tokio::test]
    async fn shutdown_closes_everything() {
        let broker = Broker::in_memory().start();
        let mut sub = broker.subscribe("/p").await.unwrap();
        sub.recv().await.unwrap();

        broker.shutdown().await;
        assert!(broker.shutdown_token().is_cancelled());
        assert!(matches!(sub.recv().await, Err(BrokerError::Closed)));
        assert!(matches!(
            broker.patch("/p", SET_X1).await,
            Err(BrokerError::Closed)
        ));

        // Idempotent.
        broker.shutdown().await;
    }

    #[tokio::test]
    async fn unbridge_unknown_is_not_found() {
        let broker = Broker::in_memory().start();
        let err = broker.unbridge("/p", "127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, BrokerError::BridgeNotFound { .. }));
        assert!(broker.bridges().await.unwrap().is_empty());
    }
}
