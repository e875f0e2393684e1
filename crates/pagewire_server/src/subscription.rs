//! Live page feeds.

use crate::broker::Command;
use crate::error::{BrokerError, BrokerResult};
use bytes::Bytes;
use pagewire_core::Patch;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Identifies one subscriber within a broker.
pub type SinkId = u64;

/// Identifies one running broker among bridged peers.
pub type InstanceId = u64;

/// An event delivered to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// Always the first event: the marshalled page at subscribe time, or
    /// `None` if the page did not exist yet.
    Snapshot(Option<Bytes>),
    /// A patch applied after the snapshot, in application order.
    Patch {
        /// The applied patch.
        patch: Arc<Patch>,
        /// Its canonical JSON encoding, as written to the log.
        data: Bytes,
        /// Broker the patch was first applied on.
        source: InstanceId,
    },
}

/// Why the broker closed a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    SlowConsumer,
}

/// Broker side of a subscription.
#[derive(Debug)]
pub(crate) struct Sink {
    pub(crate) id: SinkId,
    pub(crate) events: mpsc::Sender<PageEvent>,
    closed: Option<oneshot::Sender<CloseReason>>,
}

impl Sink {
    /// Creates a connected sink/subscription pair.
    ///
    /// The snapshot is queued before the pair is handed out, so it is
    /// always the first event.
    pub(crate) fn pair(
        id: SinkId,
        url: &str,
        capacity: usize,
        snapshot: Option<Bytes>,
        commands: mpsc::Sender<Command>,
    ) -> (Sink, Subscription) {
        let (tx, rx) = mpsc::channel(capacity);
        let (closed_tx, closed_rx) = oneshot::channel();

        // A fresh channel always has room for one event.
        let _ = tx.try_send(PageEvent::Snapshot(snapshot));

        let sink = Sink {
            id,
            events: tx,
            closed: Some(closed_tx),
        };
        let subscription = Subscription {
            id,
            url: url.to_string(),
            events: rx,
            closed: closed_rx,
            commands,
            registered: true,
        };
        (sink, subscription)
    }

    /// Disconnects the subscriber, telling it why.
    pub(crate) fn close(mut self, reason: CloseReason) {
        if let Some(tx) = self.closed.take() {
            let _ = tx.send(reason);
        }
    }
}

/// A live feed of one page: its snapshot, then every later patch.
///
/// Dropping the subscription unregisters it.
#[derive(Debug)]
pub struct Subscription {
    id: SinkId,
    url: String,
    events: mpsc::Receiver<PageEvent>,
    closed: oneshot::Receiver<CloseReason>,
    commands: mpsc::Sender<Command>,
    registered: bool,
}

impl Subscription {
    /// Returns this subscriber's id.
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Returns the subscribed url.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns `SlowConsumer` if the broker dropped this subscriber because
    /// its queue overflowed, and `Closed` if the broker shut down.
    pub async fn recv(&mut self) -> BrokerResult<PageEvent> {
        match self.events.recv().await {
            Some(event) => Ok(event),
            None => Err(self.close_error()),
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<PageEvent> {
        self.events.try_recv().ok()
    }

    /// Unregisters and waits until the broker has processed it.
    ///
    /// Returns immediately if the broker has already stopped.
    pub async fn unsubscribe(mut self) {
        self.registered = false;
        self.events.close();
        let (tx, rx) = oneshot::channel();
        let cmd = Command::Unsubscribe {
            id: self.id,
            reply: Some(tx),
        };
        if self.commands.send(cmd).await.is_ok() {
            let _ = rx.await;
        }
    }

    fn close_error(&mut self) -> BrokerError {
        match self.closed.try_recv() {
            Ok(CloseReason::SlowConsumer) => BrokerError::SlowConsumer,
            Err(_) => BrokerError::Closed,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registered {
            // Best effort. If the queue is full the broker notices the
            // closed channel on the next publish or stats query instead.
            let _ = self.commands.try_send(Command::Unsubscribe {
                id: self.id,
                reply: None,
            });
        }
    }
}
