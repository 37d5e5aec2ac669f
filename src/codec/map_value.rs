//! MapValue implementation
//!
//! BTreeMap-backed mapping with blob encode/decode.

use std::collections::BTreeMap;

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::{FORMAT_TAG, FORMAT_VERSION, HEADER_SIZE, MAX_PAYLOAD_SIZE};
use crate::error::{MapError, Result};

/// A decoded map: secondary key → opaque bytes
///
/// Materialized from a stored blob at the start of every request and
/// re-encoded in full after a mutation. It has no identity of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapValue {
    entries: BTreeMap<String, Vec<u8>>,
}

/// bincode settings shared by encode and decode
fn blob_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_PAYLOAD_SIZE)
        .reject_trailing_bytes()
}

impl MapValue {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of secondary keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Set `key` to `value`, returning the previous value if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True if any secondary key maps to exactly `value`
    pub fn contains_value(&self, value: &[u8]) -> bool {
        self.entries.values().any(|v| v.as_slice() == value)
    }

    /// Secondary keys in sorted order
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in key order
    pub fn values(&self) -> impl ExactSizeIterator<Item = &[u8]> {
        self.entries.values().map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    // =========================================================================
    // Blob Encoding
    // =========================================================================

    /// Encode to a blob
    ///
    /// Format: tag (1) + version (1) + crc32 (4) + bincode payload
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = blob_options()
            .serialize(self)
            .map_err(|e| MapError::Serialization(e.to_string()))?;

        let crc = crc32fast::hash(&payload);

        let mut blob = Vec::with_capacity(HEADER_SIZE + payload.len());
        blob.push(FORMAT_TAG);
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(&crc.to_be_bytes());
        blob.extend_from_slice(&payload);

        Ok(blob)
    }

    /// Decode a blob produced by [`MapValue::encode`]
    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.len() < HEADER_SIZE {
            return Err(MapError::CorruptValue(format!(
                "blob too short: expected at least {} bytes, got {}",
                HEADER_SIZE,
                blob.len()
            )));
        }

        if blob[0] != FORMAT_TAG {
            return Err(MapError::CorruptValue(format!(
                "unknown format tag: 0x{:02x}",
                blob[0]
            )));
        }

        if blob[1] != FORMAT_VERSION {
            return Err(MapError::CorruptValue(format!(
                "unsupported format version: {}",
                blob[1]
            )));
        }

        let stored_crc = u32::from_be_bytes([blob[2], blob[3], blob[4], blob[5]]);
        let payload = &blob[HEADER_SIZE..];
        let actual_crc = crc32fast::hash(payload);

        if stored_crc != actual_crc {
            return Err(MapError::CorruptValue(format!(
                "checksum mismatch: stored 0x{:08x}, computed 0x{:08x}",
                stored_crc, actual_crc
            )));
        }

        blob_options()
            .deserialize(payload)
            .map_err(|e| MapError::CorruptValue(e.to_string()))
    }

    /// Human-readable dump, e.g. `{"a"=>"v1", "b"=>"v2"}`
    ///
    /// Value bytes outside printable ASCII are escaped.
    pub fn inspect(&self) -> String {
        let mut out = String::from("{");
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("\"{}\"=>\"{}\"", key.escape_debug(), value.escape_ascii()));
        }
        out.push('}');
        out
    }
}

impl FromIterator<(String, Vec<u8>)> for MapValue {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
