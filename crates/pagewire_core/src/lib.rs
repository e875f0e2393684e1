//! # pagewire core
//!
//! Page model, patch application and durability log for pagewire.
//!
//! This crate provides:
//! - [`Page`] documents made of ordered rows of scalar fields
//! - [`Patch`] parsing and validation (JSON, all-or-nothing)
//! - [`PageStore`], the url -> page mapping mutated only by patches
//! - [`Aof`], the append-only log, and [`replay`] to rebuild a store from it
//!
//! This crate performs no networking and holds no locks. Serializing access
//! to a [`PageStore`] is the caller's job (see `pagewire_server::Broker`).
//!
//! ## Example
//!
//! ```rust
//! use pagewire_core::{PageStore, Value};
//!
//! let mut store = PageStore::new();
//! store
//!     .patch("/demo", br#"{"op":"set","row":"r1","fields":{"x":1}}"#)
//!     .unwrap();
//!
//! let page = store.at("/demo").unwrap();
//! assert_eq!(page.field("r1", "x"), Some(&Value::from(1)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod aof;
mod error;
mod page;
mod patch;
mod store;
mod value;

pub use aof::{replay, replay_from, Aof, AofEntry, ReplayStats, MUTATION_MARKER};
pub use error::{CoreError, CoreResult};
pub use page::Page;
pub use patch::{validate_url, Delta, Patch, PatchOp, RowChange};
pub use store::PageStore;
pub use value::{Row, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
