//! Storage Module
//!
//! The narrow contract between the map handlers and the underlying store.
//!
//! ## Responsibilities
//! - Fetch the stored entry for a primary key
//! - Persist a new value together with its write kind
//! - Apply the expiry rule used by `map_set`
//!
//! Replication, consistent hashing and expiry sweeping live behind
//! [`StorageAccessor`]. [`MemoryStore`] is the in-process implementation used
//! by the server binary and the tests.

mod expiry;
mod memory;

use std::fmt;

pub use expiry::{is_expired, now_secs, resolve_expiry, NO_EXPIRY, RELATIVE_EXPIRY_LIMIT};
pub use memory::MemoryStore;

use crate::error::Result;

/// Whether a persisted value is a content update or a logical deletion
///
/// The storage layer uses this for replication and version bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Write,
    Delete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKind::Write => f.write_str("write"),
            WriteKind::Delete => f.write_str("delete"),
        }
    }
}

/// An entry as held by the store for one primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Client flags (always 0 for map values)
    pub flags: u32,

    /// Absolute expiry in epoch seconds, or [`NO_EXPIRY`]
    pub expiry: u64,

    /// The encoded map blob
    pub value: Vec<u8>,

    /// Kind of the write that produced this entry
    pub write_kind: WriteKind,

    /// Bumped on every persist
    pub version: u64,
}

/// Storage accessor consumed by the dispatch engine
///
/// Implementations must be safe to share across worker threads. Serializing
/// writers per primary key is the engine's job, not the accessor's.
pub trait StorageAccessor: Send + Sync {
    /// Fetch the live entry for `key`, if any
    fn fetch(&self, key: &str) -> Result<Option<StoredEntry>>;

    /// Persist a new value for `key`
    ///
    /// Returns `false` if the store declined the write.
    fn persist(
        &self,
        key: &str,
        flags: u32,
        expiry: u64,
        value: Vec<u8>,
        write_kind: WriteKind,
    ) -> Result<bool>;
}
