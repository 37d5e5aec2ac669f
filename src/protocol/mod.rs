//! Protocol Module
//!
//! Defines the text protocol spoken between map clients and the server.
//!
//! ## Commands
//! ```text
//! map_set <key> <mapkey> <flags> <expiry> <bytes> [forward]\r\n<data>\r\n
//! map_get <key> <mapkey> [forward]\r\n
//! map_delete <key> <mapkey> [forward]\r\n
//! map_clear <key> [forward]\r\n
//! map_size <key> [forward]\r\n
//! map_key? <key> <mapkey> [forward]\r\n
//! map_value? <key> <bytes> [forward]\r\n<data>\r\n
//! map_empty? <key> [forward]\r\n
//! map_keys <key> [forward]\r\n
//! map_values <key> [forward]\r\n
//! map_to_s <key> [forward]\r\n
//! ```
//!
//! ### Replies
//! - Single line: `STORED`, `DELETED`, `NOT_FOUND`, `true`, `12`, ...
//! - Multi-record: `VALUE <key> 0 <len>\r\n<data>\r\n` repeated, then `END\r\n`
//! - Failures: `SERVER_ERROR <msg>`, `CLIENT_ERROR <msg>`, `ERROR`

mod codec;
mod command;
mod response;

pub use codec::{
    encode_reply, encode_request, parse_request_line, parse_value_header, read_block, read_line,
    read_request, write_reply, write_request, MAX_DRAIN_SIZE, MAX_LINE_SIZE,
};
pub use command::{CommandType, Request, FORWARD_MARKER};
pub use response::{Reply, CLEARED, DELETED, END, NOT_DELETED, NOT_FOUND, STORED, VALUE};
