use crate::bridge::{BridgeInfo, BridgeState, LinkKey};
use crate::broker::handle::BrokerStats;
use crate::error::BrokerResult;
use crate::subscription::{InstanceId, SinkId, Subscription};
use bytes::Bytes;
use pagewire_core::{Delta, Page, Patch};
use pagewire_protocol::Direction;
use tokio::sync::oneshot;

/// Commands processed by the broker actor.
#[derive(Debug)]
pub(crate) enum Command {
    /// Apply a validated patch. `origin` is the subscriber it arrived
    /// through, which is skipped when publishing. `source` is the broker it
    /// was first applied on, `None` for local patches.
    Patch {
        url: String,
        patch: Patch,
        origin: Option<SinkId>,
        source: Option<InstanceId>,
        reply: oneshot::Sender<BrokerResult<Delta>>,
    },
    Subscribe {
        url: String,
        reply: oneshot::Sender<BrokerResult<Subscription>>,
    },
    /// `reply` is `None` when sent from `Drop`, where nobody waits.
    Unsubscribe {
        id: SinkId,
        reply: Option<oneshot::Sender<()>>,
    },
    Snapshot {
        url: String,
        reply: oneshot::Sender<Option<Bytes>>,
    },
    Page {
        url: String,
        reply: oneshot::Sender<Option<Page>>,
    },
    /// Start a bridge. The reply fires after the first connect attempt.
    BridgeStart {
        key: LinkKey,
        direction: Direction,
        reply: oneshot::Sender<BrokerResult<()>>,
    },
    BridgeStop {
        key: LinkKey,
        reply: oneshot::Sender<BrokerResult<()>>,
    },
    /// Reported by a link task. `link_id` guards against a stopped link
    /// overwriting the entry of a newer one for the same key.
    BridgeState {
        key: LinkKey,
        link_id: u64,
        state: BridgeState,
    },
    Bridges {
        reply: oneshot::Sender<Vec<BridgeInfo>>,
    },
    Stats {
        reply: oneshot::Sender<BrokerStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
