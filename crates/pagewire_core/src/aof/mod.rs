//! Append-only durability log (AOF).
//!
//! Every successfully applied patch is appended as one text line before the
//! mutation is acknowledged. On startup the log is replayed, in file order,
//! into an empty [`PageStore`](crate::PageStore) to rebuild state.
//!
//! ## Line Format
//!
//! ```text
//! <date> <time> <marker> <url> <patch>
//! 2024/05/01 12:00:03.250117 * /demo [{"op":"set","row":"r1","fields":{"x":1}}]
//! ```
//!
//! Tokens are separated by single spaces. The line is first split into at
//! most four tokens (date, time, marker, rest); for the mutation marker `*`
//! the rest is split once more into url and patch. The patch is the last
//! token and may itself contain spaces, never a newline.
//!
//! ## Recovery Policy
//!
//! - A line with fewer than four tokens is **skipped** with a warning
//! - A mutation line with fewer than two tokens after the marker is **skipped**
//! - A mutation whose patch fails to apply is **skipped**
//! - Lines with other markers are read but not applied (reserved)
//! - Failing to open or read the file is **fatal**
//!
//! ## Invariants
//!
//! - The log is **append-only**; entries are never rewritten
//! - Entries are **flushed before the append returns**
//! - Replay is **idempotent**: the same log from the same start yields the same store
//! - Compaction is declared but **unsupported** and fails loudly

mod record;
mod replay;
mod writer;

pub use record::{format_line, parse_line, AofEntry, MUTATION_MARKER};
pub use replay::{replay, replay_from, ReplayStats};
pub use writer::Aof;
