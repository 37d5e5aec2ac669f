//! Engine Module
//!
//! Dispatches map requests against a storage accessor.
//!
//! ## Responsibilities
//! - Serialize read-modify-write commands per primary key
//! - Fetch the stored entry and hand it to the command's handler
//! - Persist write intents and turn every outcome into a reply

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{MapError, Result};
use crate::handlers::{self, Context, Outcome, WriteIntent};
use crate::protocol::{Reply, Request};
use crate::storage::{now_secs, StorageAccessor};

/// The dispatch engine
///
/// ## Concurrency Model: One Writer per Primary Key
///
/// - **Writes** (map_set/map_delete/map_clear): hold the key's lock stripe
///   across fetch → handler → persist, so no update is lost to a stale read
/// - **Reads**: no engine lock; the accessor returns a consistent entry
///
/// Keys hashing to the same stripe also serialize with each other.
pub struct Engine<S> {
    /// Storage accessor holding the encoded maps
    storage: S,

    /// Write lock stripes, indexed by crc32 of the primary key
    locks: Vec<Mutex<()>>,
}

impl<S: StorageAccessor> Engine<S> {
    /// Create an engine over `storage` with the given config
    pub fn new(storage: S, config: &Config) -> Result<Self> {
        config.validate()?;

        let locks = (0..config.lock_stripes).map(|_| Mutex::new(())).collect();

        Ok(Self { storage, locks })
    }

    /// Execute a request
    ///
    /// Never fails: errors become `SERVER_ERROR` or `CLIENT_ERROR` replies.
    pub fn execute(&self, request: &Request) -> Reply {
        self.execute_at(request, now_secs())
    }

    /// Execute a request as if the current time were `now`
    pub fn execute_at(&self, request: &Request, now: u64) -> Reply {
        tracing::trace!(
            "Executing {} for key {} (forward={})",
            request.command.name(),
            request.key(),
            request.forward
        );

        match self.try_execute(request, now) {
            Ok(reply) => reply,
            Err(MapError::Protocol(msg)) => Reply::ClientError(msg),
            Err(e) => {
                tracing::warn!(
                    "{} failed for key {}: {}",
                    request.command.name(),
                    request.key(),
                    e
                );
                Reply::server_error(e.to_string())
            }
        }
    }

    fn try_execute(&self, request: &Request, now: u64) -> Result<Reply> {
        let command = request.command;

        // Held until the write intent is persisted
        let _write_guard = if command.is_write() {
            Some(self.lock_for(request.key()).lock())
        } else {
            None
        };

        let stored = self.storage.fetch(request.key())?;
        let ctx = Context::new(request, stored.as_ref(), now);

        match handlers::handle(command, &ctx)? {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Write(intent) => {
                let status = intent.status;
                if self.persist(request.key(), intent)? {
                    Ok(Reply::line(status))
                } else {
                    Ok(Reply::line(command.failure_status()))
                }
            }
        }
    }

    fn persist(&self, key: &str, intent: WriteIntent) -> Result<bool> {
        tracing::trace!(
            "Persisting {} bytes for key {} ({})",
            intent.value.len(),
            key,
            intent.write_kind
        );

        self.storage
            .persist(key, intent.flags, intent.expiry, intent.value, intent.write_kind)
    }

    fn lock_for(&self, key: &str) -> &Mutex<()> {
        let index = crc32fast::hash(key.as_bytes()) as usize % self.locks.len();
        &self.locks[index]
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the storage accessor
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get the number of lock stripes
    pub fn lock_stripes(&self) -> usize {
        self.locks.len()
    }
}
