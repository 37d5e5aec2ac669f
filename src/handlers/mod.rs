//! Handlers Module
//!
//! Server-side implementations of the map commands.
//!
//! ## Responsibilities
//! - Decode the stored blob for the request's primary key
//! - Apply the command to the decoded map
//! - Either reply directly or hand a write intent back to the engine
//!
//! Handlers never fetch or persist on their own. They see the entry the
//! engine fetched under the key's write lock, so a read-modify-write observes
//! one consistent snapshot.

mod read;
mod write;

use crate::codec::MapValue;
use crate::error::{MapError, Result};
use crate::protocol::{CommandType, Reply, Request};
use crate::storage::{StoredEntry, WriteKind};

/// Everything a handler may look at for one request
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Primary key
    pub key: &'a str,

    /// Request line tokens, command name first
    pub argv: &'a [String],

    /// Entry fetched for `key` before the handler ran
    pub stored: Option<&'a StoredEntry>,

    /// Data block, for value-bearing commands
    pub params: Option<&'a [u8]>,

    /// Request arrived with the `forward` marker
    pub forward: bool,

    /// Current time in epoch seconds
    pub now: u64,
}

impl<'a> Context<'a> {
    pub fn new(request: &'a Request, stored: Option<&'a StoredEntry>, now: u64) -> Self {
        Self {
            key: request.key(),
            argv: &request.argv,
            stored,
            params: request.value.as_deref(),
            forward: request.forward,
            now,
        }
    }

    /// Argument at `index` or a protocol error naming it
    fn arg(&self, index: usize, name: &str) -> Result<&'a str> {
        self.argv
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| MapError::Protocol(format!("missing argument: {}", name)))
    }

    /// Data block or a protocol error
    fn value(&self) -> Result<&'a [u8]> {
        self.params
            .ok_or_else(|| MapError::Protocol("missing data block".to_string()))
    }

    /// Decode the stored map, `None` if the key has no entry
    fn load(&self) -> Result<Option<MapValue>> {
        self.stored
            .map(|entry| MapValue::decode(&entry.value))
            .transpose()
    }
}

/// A write the engine must persist before replying with `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteIntent {
    pub flags: u32,
    pub expiry: u64,
    pub value: Vec<u8>,
    pub write_kind: WriteKind,
    pub status: &'static str,
}

/// Result of running a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this reply as-is
    Reply(Reply),

    /// Persist, then reply with the intent's status
    Write(WriteIntent),
}

/// Signature shared by all handlers
pub type Handler = fn(&Context<'_>) -> Result<Outcome>;

/// Handler for a command
pub fn handler_for(command: CommandType) -> Handler {
    match command {
        CommandType::MapSet => write::map_set,
        CommandType::MapDelete => write::map_delete,
        CommandType::MapClear => write::map_clear,
        CommandType::MapGet => read::map_get,
        CommandType::MapSize => read::map_size,
        CommandType::MapKey => read::map_key,
        CommandType::MapValue => read::map_value,
        CommandType::MapEmpty => read::map_empty,
        CommandType::MapKeys => read::map_keys,
        CommandType::MapValues => read::map_values,
        CommandType::MapToS => read::map_to_s,
    }
}

/// Run the handler for `command` against `ctx`
pub fn handle(command: CommandType, ctx: &Context<'_>) -> Result<Outcome> {
    handler_for(command)(ctx)
}
