//! # pagewire protocol
//!
//! Messages exchanged between two pagewire instances over a bridge.
//!
//! This crate provides:
//! - [`BridgeMessage`], the JSON text frames of a bridge session
//! - [`Direction`], which way patches flow on a link
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Session
//!
//! ```text
//! initiator                         peer
//!    |  Hello { url, direction }  ->  |
//!    |  <- Welcome { version }        |
//!    |  Patch { ops }            <->  |   (snapshot first, then live patches)
//! ```
//!
//! Either side may send `Error` and close.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{BridgeMessage, Direction, BRIDGE_PATH, PROTOCOL_VERSION};
