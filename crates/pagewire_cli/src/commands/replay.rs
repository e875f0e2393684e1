//! Replay command implementation.

use pagewire_core::{replay, PageStore};
use serde::Serialize;
use std::path::Path;

/// Replay summary for output.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Lines read from the log.
    pub lines_read: u64,
    /// Lines applied.
    pub lines_used: u64,
    /// Corrupt or unapplicable lines.
    pub lines_skipped: u64,
    /// Pages after replay.
    pub pages: usize,
    /// Page urls, sorted.
    pub urls: Vec<String>,
    /// Replay time in milliseconds.
    pub elapsed_ms: u128,
}

/// Runs the replay command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_report(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text_output(path, &report),
    }

    Ok(())
}

fn build_report(path: &Path) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let mut store = PageStore::new();
    let stats = replay(path, &mut store)?;

    Ok(ReplayReport {
        lines_read: stats.lines_read,
        lines_used: stats.lines_used,
        lines_skipped: stats.lines_skipped,
        pages: store.len(),
        urls: store.urls().map(str::to_string).collect(),
        elapsed_ms: stats.elapsed.as_millis(),
    })
}

fn print_text_output(path: &Path, report: &ReplayReport) {
    println!("Replayed {}", path.display());
    println!("  Lines read:    {}", report.lines_read);
    println!("  Lines used:    {}", report.lines_used);
    println!("  Lines skipped: {}", report.lines_skipped);
    println!("  Pages:         {}", report.pages);
    for url in &report.urls {
        println!("    {url}");
    }
    println!("  Time:          {} ms", report.elapsed_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn report_counts_skipped_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"2024/01/01 00:00:00.000000 * /a {{"op":"remove","row":"r"}}"#
        )
        .unwrap();
        writeln!(file, "truncated line").unwrap();
        writeln!(
            file,
            r#"2024/01/01 00:00:01.000000 * /b [{{"op":"set","row":"r","fields":{{}}}}]"#
        )
        .unwrap();

        let report = build_report(file.path()).unwrap();
        assert_eq!(report.lines_read, 3);
        assert_eq!(report.lines_used, 2);
        assert_eq!(report.lines_skipped, 1);
        assert_eq!(report.urls, vec!["/a", "/b"]);
    }

    #[test]
    fn missing_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(build_report(&dir.path().join("absent.log")).is_err());
    }
}
