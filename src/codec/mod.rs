//! Map Codec Module
//!
//! Turns a mapping of secondary key → bytes into the opaque blob held in a
//! primary key's value slot, and back.
//!
//! ## Blob Format (V1)
//! ```text
//! ┌─────────┬─────────────┬───────────┬─────────────────────────────┐
//! │ Tag (1) │ Version (1) │ CRC32 (4) │ Payload (bincode BTreeMap)  │
//! └─────────┴─────────────┴───────────┴─────────────────────────────┘
//! ```
//!
//! - Tag is always `0x4D` ('M')
//! - CRC32 covers the payload only, big endian
//! - Keys are kept sorted so equal maps encode to equal blobs
//!
//! A blob that fails any of these checks is reported as
//! [`MapError::CorruptValue`](crate::MapError::CorruptValue).

mod map_value;

pub use map_value::MapValue;

/// First byte of every encoded map
pub const FORMAT_TAG: u8 = 0x4D;

/// Current blob format version
pub const FORMAT_VERSION: u8 = 0x01;

/// Header size: tag (1) + version (1) + crc32 (4)
pub const HEADER_SIZE: usize = 6;

/// Upper bound on a decoded payload (64 MB)
pub const MAX_PAYLOAD_SIZE: u64 = 64 * 1024 * 1024;
