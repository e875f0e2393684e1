//! Protocol messages for bridging.

use crate::error::{ProtocolError, ProtocolResult};
use pagewire_core::{Patch, PatchOp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current bridge protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Path peers accept bridge connections on.
pub const BRIDGE_PATH: &str = "/bridge";

/// Which way patches flow on a link, seen from the side that opened it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Local patches go out, nothing comes in.
    Push,
    /// Remote patches come in, nothing goes out.
    Pull,
    /// Both ways.
    #[default]
    Both,
}

impl Direction {
    /// Returns true if local patches are sent to the other side.
    pub fn sends(self) -> bool {
        matches!(self, Direction::Push | Direction::Both)
    }

    /// Returns true if patches from the other side are applied locally.
    pub fn receives(self) -> bool {
        matches!(self, Direction::Pull | Direction::Both)
    }

    /// The same link seen from the other end.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Push => Direction::Pull,
            Direction::Pull => Direction::Push,
            Direction::Both => Direction::Both,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Push => "push",
            Direction::Pull => "pull",
            Direction::Both => "both",
        })
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Direction::Push),
            "pull" => Ok(Direction::Pull),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// A bridge protocol message. Sent as one JSON text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    /// Opens a session for one page.
    Hello {
        /// Page url mirrored by this link.
        url: String,
        /// Flow direction from the initiator's point of view.
        direction: Direction,
        /// Initiator protocol version.
        version: u16,
    },
    /// Accepts a session.
    Welcome {
        /// Peer protocol version.
        version: u16,
    },
    /// A batch of operations for the session's page.
    Patch {
        /// Operations in application order.
        ops: Vec<PatchOp>,
        /// Instance the patch was first applied on. A peer drops patches
        /// carrying its own id, which ends cycles between bridged peers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<u64>,
    },
    /// Fatal session error; the sender closes afterwards.
    Error {
        /// Human readable reason.
        message: String,
    },
}

impl BridgeMessage {
    /// Creates a hello for `url` at the current protocol version.
    pub fn hello(url: impl Into<String>, direction: Direction) -> Self {
        BridgeMessage::Hello {
            url: url.into(),
            direction,
            version: PROTOCOL_VERSION,
        }
    }

    /// Creates a welcome at the current protocol version.
    pub fn welcome() -> Self {
        BridgeMessage::Welcome {
            version: PROTOCOL_VERSION,
        }
    }

    /// Wraps a patch first applied on instance `origin`.
    pub fn patch(patch: &Patch, origin: Option<u64>) -> Self {
        BridgeMessage::Patch {
            ops: patch.ops().to_vec(),
            origin,
        }
    }

    /// Returns the originating instance of a `Patch` message.
    pub fn origin(&self) -> Option<u64> {
        match self {
            BridgeMessage::Patch { origin, .. } => *origin,
            _ => None,
        }
    }

    /// Creates an error message.
    pub fn error(message: impl Into<String>) -> Self {
        BridgeMessage::Error {
            message: message.into(),
        }
    }

    /// Returns the message kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::Hello { .. } => "hello",
            BridgeMessage::Welcome { .. } => "welcome",
            BridgeMessage::Patch { .. } => "patch",
            BridgeMessage::Error { .. } => "error",
        }
    }

    /// Encodes to a JSON text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a JSON text frame.
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Converts a `Patch` message into a validated [`Patch`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` if the ops fail validation and `Unexpected`
    /// for any other message kind.
    pub fn into_patch(self) -> ProtocolResult<Patch> {
        match self {
            BridgeMessage::Patch { ops, .. } => Ok(Patch::new(ops)?),
            other => Err(ProtocolError::Unexpected {
                expected: "patch",
                actual: other.kind(),
            }),
        }
    }
}

/// Checks a remote version against ours.
pub(crate) fn check_version(remote: u16) -> ProtocolResult<()> {
    if remote != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch {
            local: PROTOCOL_VERSION,
            remote,
        });
    }
    Ok(())
}

impl BridgeMessage {
    /// Validates a `Hello`, returning its url and direction.
    pub fn accept_hello(self) -> ProtocolResult<(String, Direction)> {
        match self {
            BridgeMessage::Hello {
                url,
                direction,
                version,
            } => {
                check_version(version)?;
                pagewire_core::validate_url(&url)?;
                Ok((url, direction))
            }
            other => Err(ProtocolError::Unexpected {
                expected: "hello",
                actual: other.kind(),
            }),
        }
    }

    /// Validates a `Welcome`.
    pub fn accept_welcome(self) -> ProtocolResult<()> {
        match self {
            BridgeMessage::Welcome { version } => check_version(version),
            other => Err(ProtocolError::Unexpected {
                expected: "welcome",
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_wire_form() {
        let text = BridgeMessage::hello("/demo", Direction::Push).encode().unwrap();
        assert_eq!(
            text,
            r#"{"type":"hello","url":"/demo","direction":"push","version":1}"#
        );
        let (url, direction) = BridgeMessage::decode(&text).unwrap().accept_hello().unwrap();
        assert_eq!(url, "/demo");
        assert_eq!(direction, Direction::Push);
    }

    #[test]
    fn patch_message_validates() {
        let text = r#"{"type":"patch","ops":[{"op":"set","row":"r1","fields":{"x":1}}]}"#;
        let patch = BridgeMessage::decode(text).unwrap().into_patch().unwrap();
        assert_eq!(patch.ops(), &[PatchOp::set("r1", [("x", 1)])]);

        let empty = r#"{"type":"patch","ops":[]}"#;
        assert!(matches!(
            BridgeMessage::decode(empty).unwrap().into_patch(),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }

    #[test]
    fn patch_origin_is_optional_on_the_wire() {
        let patch = Patch::new(vec![PatchOp::remove("r1")]).unwrap();
        let text = BridgeMessage::patch(&patch, Some(42)).encode().unwrap();
        assert_eq!(
            text,
            r#"{"type":"patch","ops":[{"op":"remove","row":"r1"}],"origin":42}"#
        );
        assert_eq!(BridgeMessage::decode(&text).unwrap().origin(), Some(42));

        let bare = BridgeMessage::patch(&patch, None).encode().unwrap();
        assert!(!bare.contains("origin"));
        let decoded = BridgeMessage::decode(&bare).unwrap();
        assert_eq!(decoded.origin(), None);
        assert_eq!(decoded.into_patch().unwrap(), patch);
    }

    #[test]
    fn version_mismatch() {
        let msg = BridgeMessage::Welcome { version: 9 };
        assert!(matches!(
            msg.accept_welcome(),
            Err(ProtocolError::VersionMismatch { remote: 9, .. })
        ));
    }

    #[test]
    fn unexpected_kind() {
        let err = BridgeMessage::welcome().accept_hello().unwrap_err();
        assert!(err.to_string().contains("expected hello, got welcome"));
    }

    #[test]
    fn hello_rejects_bad_url() {
        let msg = BridgeMessage::hello("has space", Direction::Both);
        assert!(matches!(msg.accept_hello(), Err(ProtocolError::InvalidPayload(_))));
    }

    #[test]
    fn direction_semantics() {
        assert!(Direction::Push.sends() && !Direction::Push.receives());
        assert!(!Direction::Pull.sends() && Direction::Pull.receives());
        assert_eq!(Direction::Push.reversed(), Direction::Pull);
        assert_eq!(Direction::Both.reversed(), Direction::Both);
        assert_eq!("pull".parse::<Direction>().unwrap(), Direction::Pull);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            BridgeMessage::decode("{\"type\":\"nope\"}"),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }
}
