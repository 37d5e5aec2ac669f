//! Expiry rule
//!
//! `0` never expires, anything below 30 days is relative to now, anything
//! else is already an absolute epoch time.

use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel stored for entries that never expire
pub const NO_EXPIRY: u64 = u64::MAX;

/// Inputs below this many seconds (30 days) are relative
pub const RELATIVE_EXPIRY_LIMIT: u64 = 2_592_000;

/// Convert a client-supplied expiry into an absolute expiry
pub fn resolve_expiry(input: u64, now: u64) -> u64 {
    if input == 0 {
        NO_EXPIRY
    } else if input < RELATIVE_EXPIRY_LIMIT {
        now.saturating_add(input)
    } else {
        input
    }
}

/// True once `now` has passed an absolute expiry
pub fn is_expired(expiry: u64, now: u64) -> bool {
    expiry != NO_EXPIRY && expiry < now
}

/// Current time in epoch seconds
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
