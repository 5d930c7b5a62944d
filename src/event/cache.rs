//! Grapheme interning
//!
//! Key events carry the text a key produced. The parser reads into a
//! transient buffer, so that text is copied out through this cache before
//! an event is enqueued; repeated graphemes (every 'e' the user types)
//! share one allocation. The cache is append-only for the life of the
//! reader.

use std::collections::HashSet;
use std::sync::Arc;

/// A small process-lifetime intern table for short grapheme strings
#[derive(Debug, Default)]
pub struct GraphemeCache {
    entries: HashSet<Arc<str>>,
}

impl GraphemeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `grapheme` into the cache (or find it) and return the shared
    /// allocation
    pub fn intern(&mut self, grapheme: &str) -> Arc<str> {
        if let Some(hit) = self.entries.get(grapheme) {
            return hit.clone();
        }
        let entry: Arc<str> = Arc::from(grapheme);
        self.entries.insert(entry.clone());
        entry
    }

    /// Number of distinct graphemes interned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
