//! The url -> page mapping.

use crate::error::CoreResult;
use crate::page::Page;
use crate::patch::{validate_url, Delta, Patch};
use std::collections::BTreeMap;

/// All pages known to the process, keyed by url.
///
/// The store has no interior locking. It is owned by exactly one writer
/// (the broker actor, or replay at startup), which gives every url a total
/// order of applied patches.
///
/// # Invariants
///
/// - At most one page per url
/// - A page exists once a patch to its url has succeeded, and is never
///   removed implicitly
/// - A failed patch leaves the store unchanged
#[derive(Debug, Default)]
pub struct PageStore {
    pages: BTreeMap<String, Page>,
}

impl PageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current page for `url`, or `None` if it was never written.
    pub fn at(&self, url: &str) -> Option<&Page> {
        self.pages.get(url)
    }

    /// Parses `bytes` as a patch and applies it to `url`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPatch` or `InvalidUrl`; the store is untouched.
    pub fn patch(&mut self, url: &str, bytes: &[u8]) -> CoreResult<Delta> {
        let patch = Patch::parse(bytes)?;
        self.apply(url, &patch)
    }

    /// Applies an already validated patch to `url`, creating the page if absent.
    pub fn apply(&mut self, url: &str, patch: &Patch) -> CoreResult<Delta> {
        validate_url(url)?;

        let mut delta = Delta::new(!self.pages.contains_key(url));
        let page = self.pages.entry(url.to_string()).or_default();
        page.apply(patch, &mut delta);
        Ok(delta)
    }

    /// Serializes the page at `url`, or `None` if absent.
    pub fn marshal(&self, url: &str) -> Option<Vec<u8>> {
        self.at(url).map(Page::marshal)
    }

    /// Iterates page urls in sorted order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Returns the number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if no page has been written.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
