//! Compact command implementation.

use pagewire_core::Aof;
use std::path::Path;

/// Runs the compact command.
///
/// Log compaction is not implemented; this reports the error instead of
/// silently leaving the log as it is.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("log not found: {}", path.display()).into());
    }

    let mut aof = Aof::open(path, true)?;
    println!("Compacting {}", path.display());
    aof.compact()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_fails_loudly() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = run(file.path()).unwrap_err();
        assert!(err.to_string().contains("compaction"));
    }
}
