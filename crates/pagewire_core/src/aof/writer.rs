//! Log writer.

use crate::aof::record::format_line;
use crate::error::{CoreError, CoreResult};
use crate::patch::validate_url;
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append handle on the durability log.
///
/// The `Aof` is owned by a single writer; it takes `&mut self` for appends
/// and performs no locking of its own.
///
/// # Durability
///
/// - every append is written with a single `write_all` and flushed
/// - with `sync_on_write`, `File::sync_data` runs before the append returns
#[derive(Debug)]
pub struct Aof {
    path: PathBuf,
    file: File,
    sync_on_write: bool,
    appended: u64,
}

impl Aof {
    /// Opens the log for appending, creating it and its parent directories
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogUnavailable`] if the file cannot be opened.
    pub fn open(path: &Path, sync_on_write: bool) -> CoreResult<Self> {
        let unavailable = |source| CoreError::LogUnavailable {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(unavailable)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_on_write,
            appended: 0,
        })
    }

    /// Appends one mutation entry stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` for urls the line format cannot carry,
    /// `MalformedPatch` if the patch contains a newline, and `Io` if the
    /// write or flush fails.
    pub fn append(&mut self, url: &str, patch: &[u8]) -> CoreResult<()> {
        self.append_at(Utc::now(), url, patch)
    }

    /// Appends one mutation entry with an explicit timestamp.
    pub fn append_at(&mut self, now: DateTime<Utc>, url: &str, patch: &[u8]) -> CoreResult<()> {
        validate_url(url)?;
        if patch.contains(&b'\n') {
            return Err(CoreError::malformed("patch bytes contain a newline"));
        }

        let line = format_line(now, url, patch);
        self.file.write_all(&line)?;
        self.file.flush()?;
        if self.sync_on_write {
            self.file.sync_data()?;
        }
        self.appended += 1;
        debug!(url, bytes = line.len(), "log entry appended");
        Ok(())
    }

    /// Flushes and syncs the log to disk.
    pub fn sync(&mut self) -> CoreResult<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Rewrites the log keeping only what is needed to rebuild current state.
    ///
    /// Not implemented: always returns [`CoreError::CompactionUnsupported`].
    pub fn compact(&mut self) -> CoreResult<()> {
        Err(CoreError::CompactionUnsupported)
    }

    /// Returns the log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of entries appended through this handle.
    pub fn appended(&self) -> u64 {
        self.appended
    }
}
