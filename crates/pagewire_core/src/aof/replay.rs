//! Startup replay.

use crate::aof::record::parse_line;
use crate::error::{CoreError, CoreResult};
use crate::store::PageStore;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Lines scanned.
    pub lines_read: u64,
    /// Mutation lines applied to the store.
    pub lines_used: u64,
    /// Corrupt lines and rejected patches.
    pub lines_skipped: u64,
    /// Wall time spent.
    pub elapsed: Duration,
}

/// Replays the log at `path` into `store`.
///
/// Patches are applied directly to the store: nothing is published and
/// nothing is re-appended.
///
/// # Errors
///
/// Returns [`CoreError::LogUnavailable`] if the file cannot be opened and
/// [`CoreError::Io`] if reading fails part way. Corrupt lines are not errors.
pub fn replay(path: &Path, store: &mut PageStore) -> CoreResult<ReplayStats> {
    let file = File::open(path).map_err(|source| CoreError::LogUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let stats = replay_from(BufReader::new(file), store)?;
    info!(
        path = %path.display(),
        lines_read = stats.lines_read,
        lines_used = stats.lines_used,
        lines_skipped = stats.lines_skipped,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "log replayed"
    );
    Ok(stats)
}

/// Replays log lines from any buffered reader.
pub fn replay_from<R: BufRead>(mut reader: R, store: &mut PageStore) -> CoreResult<ReplayStats> {
    let start = Instant::now();
    let mut stats = ReplayStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        stats.lines_read += 1;

        let line = trim_line_end(&buf);
        let entry = match parse_line(stats.lines_read, line) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping log line");
                stats.lines_skipped += 1;
                continue;
            }
        };

        match store.patch(&entry.url, &entry.patch) {
            Ok(_) => stats.lines_used += 1,
            Err(e) => {
                warn!(line = stats.lines_read, url = %entry.url, error = %e, "skipping log entry");
                stats.lines_skipped += 1;
            }
        }
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
