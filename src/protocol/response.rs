//! Response definitions
//!
//! Represents replies sent to clients.

use bytes::Bytes;

/// Terminator of a multi-record reply
pub const END: &str = "END";

/// Prefix of a record header line
pub const VALUE: &str = "VALUE";

pub const STORED: &str = "STORED";
pub const DELETED: &str = "DELETED";
pub const NOT_DELETED: &str = "NOT_DELETED";
pub const CLEARED: &str = "CLEARED";
pub const NOT_FOUND: &str = "NOT_FOUND";

/// A reply to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Single status or value line
    Line(String),

    /// `VALUE <key> 0 <len>` records followed by `END`
    Values { key: String, records: Vec<Bytes> },

    /// `SERVER_ERROR <msg>`
    ServerError(String),

    /// `CLIENT_ERROR <msg>`
    ClientError(String),

    /// `ERROR` (unknown command)
    Error,
}

impl Reply {
    /// Create a single-line reply
    pub fn line(text: impl Into<String>) -> Self {
        Reply::Line(text.into())
    }

    /// Create a NOT_FOUND reply
    pub fn not_found() -> Self {
        Reply::Line(NOT_FOUND.to_string())
    }

    /// Create a boolean reply (`true` / `false`)
    pub fn boolean(value: bool) -> Self {
        Reply::Line(value.to_string())
    }

    /// Multi-record reply for `key`; empty records give a bare `END`
    pub fn values(key: impl Into<String>, records: Vec<Bytes>) -> Self {
        Reply::Values {
            key: key.into(),
            records,
        }
    }

    /// Create a SERVER_ERROR reply
    pub fn server_error(message: impl Into<String>) -> Self {
        Reply::ServerError(message.into())
    }
}
