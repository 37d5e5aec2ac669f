//! In-memory storage accessor
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{is_expired, now_secs, StorageAccessor, StoredEntry, WriteKind};
use crate::error::Result;

/// In-process store holding one entry per primary key
///
/// ## Concurrency:
/// - `entries`: RwLock (many concurrent readers, exclusive writer)
/// - Expired entries are hidden from `fetch` but only dropped when overwritten
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Raw entry for `key`, ignoring expiry
    pub fn raw_entry(&self, key: &str) -> Option<StoredEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Overwrite the raw value for `key` without touching flags or version
    ///
    /// Used to stage corrupt or foreign blobs.
    pub fn put_raw(&self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.write().insert(
            key.into(),
            StoredEntry {
                flags: 0,
                expiry: super::NO_EXPIRY,
                value,
                write_kind: WriteKind::Write,
                version: 0,
            },
        );
    }
}

impl StorageAccessor for MemoryStore {
    fn fetch(&self, key: &str) -> Result<Option<StoredEntry>> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if is_expired(entry.expiry, now_secs()) => {
                tracing::trace!("Entry {} expired at {}", key, entry.expiry);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    fn persist(
        &self,
        key: &str,
        flags: u32,
        expiry: u64,
        value: Vec<u8>,
        write_kind: WriteKind,
    ) -> Result<bool> {
        let mut entries = self.entries.write();
        let version = entries.get(key).map(|e| e.version + 1).unwrap_or(1);

        entries.insert(
            key.to_string(),
            StoredEntry {
                flags,
                expiry,
                value,
                write_kind,
                version,
            },
        );

        Ok(true)
    }
}
