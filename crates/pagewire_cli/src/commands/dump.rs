//! Dump command implementation.

use pagewire_core::{replay, PageStore};
use std::path::Path;

/// Runs the dump command: prints the marshalled page at `url`.
pub fn run(path: &Path, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = marshal_after_replay(path, url)?;
    println!("{}", String::from_utf8_lossy(&bytes));
    Ok(())
}

fn marshal_after_replay(path: &Path, url: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut store = PageStore::new();
    replay(path, &mut store)?;
    store
        .marshal(url)
        .ok_or_else(|| format!("no page at {url}").into())
}
