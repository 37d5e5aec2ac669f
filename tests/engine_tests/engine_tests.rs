//! Tests for Engine
//!
//! These tests verify:
//! - Request execution end to end against a MemoryStore
//! - Persisting write intents and reporting status
//! - Error surfacing (SERVER_ERROR / CLIENT_ERROR)
//! - No lost updates under concurrent writers to one key

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use mapkv::codec::MapValue;
use mapkv::protocol::{CommandType, Reply, Request};
use mapkv::storage::{MemoryStore, StorageAccessor, StoredEntry, WriteKind, NO_EXPIRY};
use mapkv::{Config, Engine, MapError};

const NOW: u64 = 1_700_000_000;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine<MemoryStore> {
    let config = Config::builder().lock_stripes(8).build();
    Engine::new(MemoryStore::new(), &config).unwrap()
}

fn set(engine: &Engine<MemoryStore>, key: &str, mapkey: &str, value: &str, expiry: u64) -> Reply {
    let request = Request::new(
        CommandType::MapSet,
        [key.to_string(), mapkey.to_string(), "0".to_string(), expiry.to_string()],
    )
    .with_value(Bytes::copy_from_slice(value.as_bytes()));
    engine.execute_at(&request, NOW)
}

fn exec(engine: &Engine<MemoryStore>, command: CommandType, args: &[&str]) -> Reply {
    engine.execute_at(&Request::new(command, args.iter().copied()), NOW)
}

/// Store that refuses every write
struct ReadOnlyStore(MemoryStore);

impl StorageAccessor for ReadOnlyStore {
    fn fetch(&self, key: &str) -> mapkv::Result<Option<StoredEntry>> {
        self.0.fetch(key)
    }

    fn persist(&self, _: &str, _: u32, _: u64, _: Vec<u8>, _: WriteKind) -> mapkv::Result<bool> {
        Ok(false)
    }
}

/// Store whose backend is unavailable
struct BrokenStore;

impl StorageAccessor for BrokenStore {
    fn fetch(&self, _: &str) -> mapkv::Result<Option<StoredEntry>> {
        Err(MapError::Storage("backend unavailable".to_string()))
    }

    fn persist(&self, _: &str, _: u32, _: u64, _: Vec<u8>, _: WriteKind) -> mapkv::Result<bool> {
        Err(MapError::Storage("backend unavailable".to_string()))
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_rejects_invalid_config() {
    let config = Config::builder().lock_stripes(0).build();
    assert!(matches!(
        Engine::new(MemoryStore::new(), &config),
        Err(MapError::Config(_))
    ));
}

#[test]
fn test_set_then_get() {
    let engine = setup_engine();

    assert_eq!(set(&engine, "k", "a", "v1", 0), Reply::line("STORED"));
    assert_eq!(
        exec(&engine, CommandType::MapGet, &["k", "a"]),
        Reply::values("k", vec![Bytes::from("v1")])
    );
    assert_eq!(
        exec(&engine, CommandType::MapGet, &["k", "missing"]),
        Reply::values("k", Vec::new())
    );
}

#[test]
fn test_size_keys_values() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);
    set(&engine, "k", "b", "v2", 0);

    assert_eq!(exec(&engine, CommandType::MapSize, &["k"]), Reply::line("2"));
    assert_eq!(
        exec(&engine, CommandType::MapKeys, &["k"]),
        Reply::values("k", vec![Bytes::from("2"), Bytes::from("a"), Bytes::from("b")])
    );
    assert_eq!(
        exec(&engine, CommandType::MapValues, &["k"]),
        Reply::values("k", vec![Bytes::from("2"), Bytes::from("v1"), Bytes::from("v2")])
    );
}

#[test]
fn test_delete_then_membership() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);
    set(&engine, "k", "b", "v2", 0);

    assert_eq!(exec(&engine, CommandType::MapDelete, &["k", "a"]), Reply::line("DELETED"));
    assert_eq!(exec(&engine, CommandType::MapKey, &["k", "a"]), Reply::line("false"));
    assert_eq!(exec(&engine, CommandType::MapKey, &["k", "b"]), Reply::line("true"));

    // Repeating is not an error
    assert_eq!(exec(&engine, CommandType::MapDelete, &["k", "a"]), Reply::line("NOT_DELETED"));

    let entry = engine.storage().raw_entry("k").unwrap();
    assert_eq!(entry.write_kind, WriteKind::Delete);
    assert_eq!(entry.version, 3);
}

#[test]
fn test_clear_is_idempotent() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);

    assert_eq!(exec(&engine, CommandType::MapClear, &["k"]), Reply::line("CLEARED"));
    assert_eq!(exec(&engine, CommandType::MapClear, &["k"]), Reply::line("CLEARED"));
    assert_eq!(exec(&engine, CommandType::MapEmpty, &["k"]), Reply::line("true"));
    assert_eq!(exec(&engine, CommandType::MapSize, &["k"]), Reply::line("0"));
}

#[test]
fn test_missing_entry_not_found() {
    let engine = setup_engine();

    assert_eq!(exec(&engine, CommandType::MapEmpty, &["nonexistent"]), Reply::not_found());
    assert_eq!(exec(&engine, CommandType::MapClear, &["nonexistent"]), Reply::not_found());
    assert_eq!(exec(&engine, CommandType::MapDelete, &["nonexistent", "a"]), Reply::not_found());
    assert_eq!(
        exec(&engine, CommandType::MapToS, &["nonexistent"]),
        Reply::values("nonexistent", Vec::new())
    );
    // Lookups never create an entry
    assert!(engine.storage().is_empty());
}

#[test]
fn test_value_membership() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);

    let request = Request::new(CommandType::MapValue, ["k"]).with_value(Bytes::from("v1"));
    assert_eq!(engine.execute_at(&request, NOW), Reply::line("true"));

    let request = Request::new(CommandType::MapValue, ["k"]).with_value(Bytes::from("zz"));
    assert_eq!(engine.execute_at(&request, NOW), Reply::line("false"));
}

#[test]
fn test_to_s() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);
    set(&engine, "k", "b", "v2", 0);

    assert_eq!(
        exec(&engine, CommandType::MapToS, &["k"]),
        Reply::values("k", vec![Bytes::from(r#"{"a"=>"v1", "b"=>"v2"}"#)])
    );
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[test]
fn test_expiry_stored_on_entry() {
    let engine = setup_engine();

    set(&engine, "never", "a", "v", 0);
    set(&engine, "relative", "a", "v", 100);
    set(&engine, "absolute", "a", "v", 3_000_000_000);

    assert_eq!(engine.storage().raw_entry("never").unwrap().expiry, NO_EXPIRY);
    assert_eq!(engine.storage().raw_entry("relative").unwrap().expiry, NOW + 100);
    assert_eq!(engine.storage().raw_entry("absolute").unwrap().expiry, 3_000_000_000);
}

#[test]
fn test_delete_keeps_expiry() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v", 0);
    set(&engine, "k", "b", "v", 3_000_000_000);

    assert_eq!(exec(&engine, CommandType::MapDelete, &["k", "b"]), Reply::line("DELETED"));
    assert_eq!(engine.storage().raw_entry("k").unwrap().expiry, 3_000_000_000);

    assert_eq!(exec(&engine, CommandType::MapClear, &["k"]), Reply::line("CLEARED"));
    assert_eq!(engine.storage().raw_entry("k").unwrap().expiry, 3_000_000_000);
}

// =============================================================================
// Error Surfacing Tests
// =============================================================================

#[test]
fn test_corrupt_blob_is_server_error() {
    let engine = setup_engine();
    engine.storage().put_raw("k", b"garbage".to_vec());

    for reply in [
        exec(&engine, CommandType::MapSize, &["k"]),
        exec(&engine, CommandType::MapGet, &["k", "a"]),
        set(&engine, "k", "a", "v", 0),
    ] {
        assert!(matches!(reply, Reply::ServerError(_)), "got {:?}", reply);
    }

    // Blob left untouched
    assert_eq!(engine.storage().raw_entry("k").unwrap().value, b"garbage");
}

#[test]
fn test_bad_expiry_is_client_error() {
    let engine = setup_engine();
    let request = Request::new(CommandType::MapSet, ["k", "a", "0", "-5"]).with_value(Bytes::from("v"));

    assert!(matches!(engine.execute_at(&request, NOW), Reply::ClientError(_)));
}

#[test]
fn test_declined_write_reports_failure_status() {
    let config = Config::default();
    let inner = MemoryStore::new();
    inner.persist("k", 0, NO_EXPIRY, MapValue::new().encode().unwrap(), WriteKind::Write).unwrap();
    let engine = Engine::new(ReadOnlyStore(inner), &config).unwrap();

    let set = Request::new(CommandType::MapSet, ["k", "a", "0", "0"]).with_value(Bytes::from("v"));
    assert_eq!(engine.execute_at(&set, NOW), Reply::line("NOT_STORED"));
    assert_eq!(
        engine.execute_at(&Request::new(CommandType::MapClear, ["k"]), NOW),
        Reply::line("NOT_CLEARED")
    );
}

#[test]
fn test_storage_failure_is_server_error() {
    let engine = Engine::new(BrokenStore, &Config::default()).unwrap();
    let reply = engine.execute_at(&Request::new(CommandType::MapSize, ["k"]), NOW);

    assert_eq!(reply, Reply::server_error("Storage error: backend unavailable"));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_same_key_lose_nothing() {
    let engine = Arc::new(setup_engine());
    let threads = 8;
    let per_thread = 50;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let mapkey = format!("t{}-{}", t, i);
                    let request = Request::new(
                        CommandType::MapSet,
                        ["shared".to_string(), mapkey, "0".to_string(), "0".to_string()],
                    )
                    .with_value(Bytes::from("x"));
                    assert_eq!(engine.execute(&request), Reply::line("STORED"));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        engine.execute(&Request::new(CommandType::MapSize, ["shared"])),
        Reply::line((threads * per_thread).to_string())
    );
}

#[test]
fn test_forwarded_request_executes_normally() {
    let engine = setup_engine();
    set(&engine, "k", "a", "v1", 0);

    let request = Request::new(CommandType::MapSize, ["k"]).forwarded();
    assert_eq!(engine.execute_at(&request, NOW), Reply::line("1"));
}
