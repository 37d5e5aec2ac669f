//! Client Module
//!
//! Driver for the map commands.
//!
//! ## Usage
//! ```no_run
//! use mapkv::client::{Answer, MapClient};
//!
//! let mut client = MapClient::connect("127.0.0.1:11211", None)?;
//! client.map_set("user:1", "name", b"ada", 0)?;
//! assert_eq!(client.map_get("user:1", "name")?, Some(b"ada".to_vec()));
//! assert_eq!(client.map_size("user:1")?, Answer::Value(1));
//! # Ok::<(), mapkv::MapError>(())
//! ```

mod driver;
mod transport;

pub use driver::{
    Answer, ListReply, MapClient, DEFAULT_MAX_RECORD_SIZE, DEFAULT_MAX_VALUE_SIZE, MAX_KEY_LENGTH,
};
pub use transport::{StreamTransport, TcpTransport, Transport};
