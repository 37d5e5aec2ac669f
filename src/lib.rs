//! # MapKV
//!
//! Map-typed values for a text-protocol key-value store:
//! - A deterministic, checksummed blob encoding for secondary key → bytes maps
//! - Server handlers with per-key read-modify-write semantics
//! - A multi-record streaming reply format
//! - A typed client driver for the same protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 MapClient (client driver)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  map_set k a 0 0 2\r\nv1\r\n
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │              TCP Server / Connection                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Engine                                    │
//! │           (per-key write lock stripes)                       │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐           ┌──────────────────┐
//!   │    Handlers     │──────────▶│   Map Codec      │
//!   │ (Context → Out) │           │ (MapValue blob)  │
//!   └─────────────────┘           └──────────────────┘
//!            │
//!            ▼
//!   ┌─────────────────┐
//!   │ StorageAccessor │
//!   │  (MemoryStore)  │
//!   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod codec;
pub mod engine;
pub mod handlers;
pub mod network;
pub mod protocol;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::MapValue;
pub use config::Config;
pub use engine::Engine;
pub use error::{MapError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of MapKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
