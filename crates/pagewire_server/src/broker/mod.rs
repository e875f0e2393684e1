//! The broker actor.
//!
//! One task owns the [`PageStore`](pagewire_core::PageStore), the log, the
//! subscriber registry and the bridge table. Everything else holds a
//! [`BrokerHandle`] and talks to it over a bounded command queue.
//!
//! # Invariants
//!
//! - Patches are applied, logged and published in the order their commands
//!   are received; every subscriber of a url sees the same order.
//! - A patch is appended to the log before it is published and before the
//!   submitter is answered.
//! - A subscriber receives its snapshot first, then every later patch,
//!   with no gap and no duplicate.
//! - A patch is never published back to the subscriber it came from.

mod commands;
mod handle;
mod service;

pub(crate) use commands::Command;
pub use handle::{BrokerHandle, BrokerStats};
pub use service::Broker;
