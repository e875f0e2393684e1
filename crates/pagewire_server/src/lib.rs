//! # pagewire server
//!
//! The broker: a single actor that owns the page store and the durability
//! log, serializes every mutation and subscription change, fans patches out
//! to subscribers and drives bridges to peer instances.
//!
//! This crate provides:
//! - [`Broker`] / [`BrokerHandle`], the actor and its command interface
//! - [`Subscription`], a live snapshot-then-patches feed for one page
//! - Bridge links with reconnect and exponential backoff
//! - [`PeerListener`], the accepting side of bridges
//!
//! # Architecture
//!
//! ```text
//!  write adapter ──┐                       ┌── Subscription (bounded queue)
//!  read adapter  ──┼── mpsc ── Broker ─────┼── Subscription
//!  bridge tasks  ──┘     (one consumer)    └── bridge session ── ws ── peer
//!                           │
//!                   PageStore + Aof
//! ```
//!
//! All state lives inside the actor. Transport adapters and bridge tasks
//! only talk to it through [`BrokerHandle`], which gives every page a single
//! total order of applied patches.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagewire_server::{Broker, BrokerConfig, PageEvent};
//!
//! # async fn demo() -> pagewire_server::BrokerResult<()> {
//! let config = BrokerConfig::default()
//!     .with_aof("pages.log")
//!     .with_create_if_missing(true);
//! let broker = Broker::open(config)?.start();
//!
//! let mut feed = broker.subscribe("/demo").await?;
//! broker
//!     .patch("/demo", br#"{"op":"set","row":"r1","fields":{"x":1}}"#)
//!     .await?;
//!
//! assert!(matches!(feed.recv().await?, PageEvent::Snapshot(None)));
//! assert!(matches!(feed.recv().await?, PageEvent::Patch { .. }));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod bridge;
mod broker;
mod config;
mod error;
mod subscription;

pub use bridge::{BridgeInfo, BridgeState, PeerListener};
pub use broker::{Broker, BrokerHandle, BrokerStats};
pub use config::{BrokerConfig, RetryConfig};
pub use error::{BrokerError, BrokerResult};
pub use pagewire_protocol::Direction;
pub use subscription::{InstanceId, PageEvent, SinkId, Subscription};
