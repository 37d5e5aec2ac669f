//! Tests for the client driver
//!
//! Two transports are used:
//! - `LoopbackTransport` feeds requests straight into an in-process Engine
//! - `StreamTransport` over canned bytes, for malformed server replies

use std::io::Cursor;

use bytes::Bytes;
use mapkv::client::{Answer, ListReply, MapClient, StreamTransport, Transport};
use mapkv::protocol::{self, encode_reply, read_request};
use mapkv::storage::MemoryStore;
use mapkv::{Config, Engine, MapError};

// =============================================================================
// Helper Functions
// =============================================================================

/// Transport that executes each request against an in-process engine
struct LoopbackTransport {
    engine: Engine<MemoryStore>,
    replies: Cursor<Vec<u8>>,
    sent: usize,
}

impl LoopbackTransport {
    fn new() -> Self {
        Self {
            engine: Engine::new(MemoryStore::new(), &Config::default()).unwrap(),
            replies: Cursor::new(Vec::new()),
            sent: 0,
        }
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, bytes: &[u8]) -> mapkv::Result<()> {
        self.sent += 1;
        let mut input = Cursor::new(bytes.to_vec());
        let request = read_request(&mut input, usize::MAX)?
            .ok_or_else(|| MapError::Protocol("empty request".to_string()))?;
        let reply = self.engine.execute(&request);
        self.replies = Cursor::new(encode_reply(&reply).to_vec());
        Ok(())
    }

    fn read_line(&mut self) -> mapkv::Result<String> {
        protocol::read_line(&mut self.replies)?
            .ok_or_else(|| MapError::Protocol("no reply".to_string()))
    }

    fn read_block(&mut self, len: usize) -> mapkv::Result<Bytes> {
        protocol::read_block(&mut self.replies, len)
    }
}

fn loopback_client() -> MapClient<LoopbackTransport> {
    MapClient::new(LoopbackTransport::new())
}

type CannedTransport = StreamTransport<Cursor<Vec<u8>>, Vec<u8>>;

/// Client whose server always answers with `reply`
fn canned_client(reply: &[u8]) -> MapClient<CannedTransport> {
    MapClient::new(StreamTransport::new(Cursor::new(reply.to_vec()), Vec::new()))
}

fn sent_bytes(client: MapClient<CannedTransport>) -> Vec<u8> {
    client.into_inner().into_parts().1
}

// =============================================================================
// Round Trip Through the Engine
// =============================================================================

#[test]
fn test_set_get() {
    let mut client = loopback_client();

    assert_eq!(client.map_set("k", "a", b"v1", 0).unwrap(), "STORED");
    assert_eq!(client.map_get("k", "a").unwrap(), Some(b"v1".to_vec()));
    assert_eq!(client.map_get("k", "missing").unwrap(), None);
    assert_eq!(client.map_get("nonexistent", "a").unwrap(), None);
}

#[test]
fn test_binary_value_round_trip() {
    let mut client = loopback_client();
    let value = vec![0x00, b'\r', b'\n', 0xff, b'E', b'N', b'D'];

    client.map_set("k", "bin", &value, 0).unwrap();
    assert_eq!(client.map_get("k", "bin").unwrap(), Some(value.clone()));
    assert_eq!(client.map_value("k", &value).unwrap(), Answer::Value(true));
}

#[test]
fn test_size_keys_values() {
    let mut client = loopback_client();
    client.map_set("k", "a", b"v1", 0).unwrap();
    client.map_set("k", "b", b"v2", 0).unwrap();

    assert_eq!(client.map_size("k").unwrap(), Answer::Value(2));

    let keys = client.map_keys("k").unwrap().unwrap();
    assert_eq!(keys.count, 2);
    let mut items = keys.items.clone();
    items.sort();
    assert_eq!(items, vec!["a".to_string(), "b".to_string()]);

    let values = client.map_values("k").unwrap().unwrap();
    assert_eq!(
        values,
        ListReply {
            count: 2,
            items: vec![b"v1".to_vec(), b"v2".to_vec()],
        }
    );
}

#[test]
fn test_delete_and_membership() {
    let mut client = loopback_client();
    client.map_set("k", "a", b"v1", 0).unwrap();
    client.map_set("k", "b", b"v2", 0).unwrap();

    assert_eq!(client.map_delete("k", "a").unwrap(), "DELETED");
    assert_eq!(client.map_delete("k", "a").unwrap(), "NOT_DELETED");
    assert_eq!(client.map_key("k", "a").unwrap(), Answer::Value(false));
    assert_eq!(client.map_key("k", "b").unwrap(), Answer::Value(true));
    assert_eq!(client.map_value("k", b"v1").unwrap(), Answer::Value(false));
}

#[test]
fn test_clear_and_empty() {
    let mut client = loopback_client();
    client.map_set("k", "a", b"v1", 0).unwrap();

    assert_eq!(client.map_empty("k").unwrap(), Answer::Value(false));
    assert_eq!(client.map_clear("k").unwrap(), "CLEARED");
    assert_eq!(client.map_clear("k").unwrap(), "CLEARED");
    assert_eq!(client.map_empty("k").unwrap(), Answer::Value(true));

    let keys = client.map_keys("k").unwrap().unwrap();
    assert_eq!(keys.count, 0);
    assert!(keys.items.is_empty());
}

#[test]
fn test_not_found_answers() {
    let mut client = loopback_client();

    let empty = client.map_empty("nonexistent").unwrap();
    assert!(empty.is_not_found());
    assert_eq!(empty.value(), None);

    assert_eq!(client.map_clear("nonexistent").unwrap(), "NOT_FOUND");
    assert_eq!(client.map_delete("nonexistent", "a").unwrap(), "NOT_FOUND");
    assert!(client.map_size("nonexistent").unwrap().is_not_found());
    assert!(client.map_key("nonexistent", "a").unwrap().is_not_found());
    assert!(client.map_value("nonexistent", b"x").unwrap().is_not_found());
    assert_eq!(client.map_keys("nonexistent").unwrap(), None);
    assert_eq!(client.map_values("nonexistent").unwrap(), None);
    assert_eq!(client.map_to_s("nonexistent").unwrap(), None);
}

#[test]
fn test_to_s() {
    let mut client = loopback_client();
    client.map_set("k", "a", b"v1", 0).unwrap();

    assert_eq!(client.map_to_s("k").unwrap(), Some(r#"{"a"=>"v1"}"#.to_string()));
}

// =============================================================================
// Argument Validation
// =============================================================================

#[test]
fn test_invalid_arguments_never_sent() {
    let mut client = loopback_client();

    assert!(matches!(client.map_set("", "a", b"v", 0), Err(MapError::InvalidArgument(_))));
    assert!(matches!(client.map_set("k", "a b", b"v", 0), Err(MapError::InvalidArgument(_))));
    assert!(matches!(client.map_get("k\r\n", "a"), Err(MapError::InvalidArgument(_))));
    assert!(matches!(client.map_size("k\t"), Err(MapError::InvalidArgument(_))));

    assert_eq!(client.into_inner().sent, 0);
}

#[test]
fn test_oversized_value_rejected() {
    let mut client = loopback_client().with_max_value_size(4);

    assert!(matches!(client.map_set("k", "a", b"12345", 0), Err(MapError::InvalidArgument(_))));
    assert!(matches!(client.map_value("k", b"12345"), Err(MapError::InvalidArgument(_))));
    assert_eq!(client.map_set("k", "a", b"1234", 0).unwrap(), "STORED");
}

// =============================================================================
// Wire Format / Malformed Replies
// =============================================================================

#[test]
fn test_request_bytes() {
    let mut client = canned_client(b"STORED\r\n");
    client.map_set("k", "a", b"v1", 100).unwrap();
    assert_eq!(sent_bytes(client), b"map_set k a 0 100 2\r\nv1\r\n");

    let mut client = canned_client(b"true\r\n");
    client.map_value("k", b"xyz").unwrap();
    assert_eq!(sent_bytes(client), b"map_value? k 3\r\nxyz\r\n");

    let mut client = canned_client(b"END\r\n");
    client.map_keys("k").unwrap();
    assert_eq!(sent_bytes(client), b"map_keys k\r\n");
}

#[test]
fn test_oneline_passes_unknown_text_through() {
    let mut client = canned_client(b"SERVER_ERROR boom\r\n");
    assert_eq!(
        client.map_size("k").unwrap(),
        Answer::Status("SERVER_ERROR boom".to_string())
    );

    let mut client = canned_client(b"maybe\r\n");
    assert_eq!(client.map_key("k", "a").unwrap(), Answer::Status("maybe".to_string()));
}

#[test]
fn test_value_list_server_error() {
    let mut client = canned_client(b"SERVER_ERROR corrupt map value: bad tag\r\n");

    match client.map_get("k", "a") {
        Err(MapError::ServerError(msg)) => assert_eq!(msg, "corrupt map value: bad tag"),
        other => panic!("Expected ServerError, got {:?}", other),
    }
}

#[test]
fn test_count_mismatch_is_protocol_error() {
    let mut client = canned_client(b"VALUE k 0 1\r\n3\r\nVALUE k 0 1\r\na\r\nEND\r\n");
    assert!(matches!(client.map_keys("k"), Err(MapError::Protocol(_))));
}

#[test]
fn test_non_numeric_count_is_protocol_error() {
    let mut client = canned_client(b"VALUE k 0 1\r\nx\r\nEND\r\n");
    assert!(matches!(client.map_values("k"), Err(MapError::Protocol(_))));
}

#[test]
fn test_truncated_stream_is_error() {
    // Connection closes before END
    let mut client = canned_client(b"VALUE k 0 2\r\nv1\r\n");
    assert!(matches!(client.map_get("k", "a"), Err(MapError::Io(_))));

    // Block shorter than announced
    let mut client = canned_client(b"VALUE k 0 10\r\nv1\r\nEND\r\n");
    assert!(client.map_get("k", "a").is_err());
}

#[test]
fn test_unexpected_line_is_protocol_error() {
    let mut client = canned_client(b"STORED\r\n");
    assert!(matches!(client.map_to_s("k"), Err(MapError::Protocol(_))));
}

#[test]
fn test_oversized_record_header_is_protocol_error() {
    let reply = format!("VALUE k 0 {}\r\nx\r\nEND\r\n", usize::MAX);
    let mut client = canned_client(reply.as_bytes());
    assert!(matches!(client.map_get("k", "a"), Err(MapError::Protocol(_))));

    let mut client = canned_client(b"VALUE k 0 100\r\n").with_max_record_size(10);
    assert!(matches!(client.map_to_s("k"), Err(MapError::Protocol(_))));
}
