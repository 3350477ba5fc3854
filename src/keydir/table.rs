//! KeyDir implementation
//!
//! HashMap-based index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyDirEntry;

/// In-memory key index
///
/// ## Concurrency:
/// - Lookups take the read lock and copy the entry out, so a reader never
///   observes a half-written entry
/// - Upserts take the write lock; ordering between writers is the caller's job
#[derive(Debug, Default)]
pub struct KeyDir {
    entries: RwLock<HashMap<Vec<u8>, KeyDirEntry>>,
}

impl KeyDir {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `entry`, replacing any previous entry
    ///
    /// Returns the entry that was replaced, if any.
    pub fn upsert(&self, key: Vec<u8>, entry: KeyDirEntry) -> Option<KeyDirEntry> {
        self.entries.write().insert(key, entry)
    }

    /// Location of the latest value for `key`, `None` if never written
    pub fn lookup(&self, key: &[u8]) -> Option<KeyDirEntry> {
        self.entries.read().get(key).copied()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
