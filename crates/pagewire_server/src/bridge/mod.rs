//! Bridges: mirroring one page with a peer instance over WebSocket.
//!
//! The side that calls [`BrokerHandle::bridge`](crate::BrokerHandle::bridge)
//! runs a link task that connects, handshakes and then runs a mirror
//! session. When the connection fails or drops the link backs off and
//! tries again until it is stopped. The other side accepts with a
//! [`PeerListener`] and runs the same session with the direction reversed.
//!
//! Each (re)connect starts by sending the whole local page as `set` ops.
//! Delivery is therefore at-least-once, which is safe because replaying
//! `set`, `set_field` and `remove` is idempotent.
//!
//! Every bridged patch carries the instance id of the broker it was first
//! applied on, and a broker drops patches carrying its own id. Peers may
//! therefore be bridged in cycles: a patch can reach a peer twice, but it
//! never travels around the cycle more than once.

mod link;
mod listener;
mod session;

pub(crate) use link::{Link, LinkKey};
pub use listener::PeerListener;

use pagewire_protocol::Direction;
use std::fmt;

/// Connection state of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Opening the connection or waiting for the handshake.
    Connecting,
    /// Session established, patches flowing.
    Connected,
    /// Waiting before the next reconnect attempt.
    BackingOff,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BridgeState::Connecting => "connecting",
            BridgeState::Connected => "connected",
            BridgeState::BackingOff => "backing-off",
        })
    }
}

/// A configured bridge, as listed by
/// [`BrokerHandle::bridges`](crate::BrokerHandle::bridges).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeInfo {
    /// Mirrored page.
    pub url: String,
    /// Peer address.
    pub host: String,
    /// Flow direction.
    pub direction: Direction,
    /// Current state.
    pub state: BridgeState,
    /// Successful connects so far.
    pub connects: u64,
}
