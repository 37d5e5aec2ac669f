//! Read-modify-write handlers: map_set, map_delete, map_clear

use super::{Context, Outcome, WriteIntent};
use crate::codec::MapValue;
use crate::error::{MapError, Result};
use crate::protocol::{Reply, CLEARED, DELETED, NOT_DELETED, STORED};
use crate::storage::{resolve_expiry, WriteKind};

/// `map_set <key> <mapkey> <flags> <expiry> <bytes>`
///
/// Creates the entry when absent. Flags are ignored and stored as 0.
pub(super) fn map_set(ctx: &Context<'_>) -> Result<Outcome> {
    let mapkey = ctx.arg(2, "mapkey")?;
    let expiry_arg = ctx.arg(4, "expiry")?;
    let value = ctx.value()?;

    let expiry = expiry_arg
        .parse::<u64>()
        .map_err(|_| MapError::Protocol(format!("invalid expiry: {}", expiry_arg)))?;

    let mut map = ctx.load()?.unwrap_or_default();
    map.insert(mapkey, value);

    Ok(Outcome::Write(WriteIntent {
        flags: 0,
        expiry: resolve_expiry(expiry, ctx.now),
        value: map.encode()?,
        write_kind: WriteKind::Write,
        status: STORED,
    }))
}

/// `map_delete <key> <mapkey>`
pub(super) fn map_delete(ctx: &Context<'_>) -> Result<Outcome> {
    let mapkey = ctx.arg(2, "mapkey")?;

    let (stored, mut map) = match (ctx.stored, ctx.load()?) {
        (Some(stored), Some(map)) => (stored, map),
        _ => return Ok(Outcome::Reply(Reply::not_found())),
    };

    if map.remove(mapkey).is_none() {
        return Ok(Outcome::Reply(Reply::line(NOT_DELETED)));
    }

    Ok(Outcome::Write(WriteIntent {
        flags: 0,
        expiry: stored.expiry,
        value: map.encode()?,
        write_kind: WriteKind::Delete,
        status: DELETED,
    }))
}

/// `map_clear <key>`
///
/// Keeps the entry and its expiry, replacing the map with an empty one.
pub(super) fn map_clear(ctx: &Context<'_>) -> Result<Outcome> {
    let stored = match ctx.stored {
        Some(stored) => stored,
        None => return Ok(Outcome::Reply(Reply::not_found())),
    };

    Ok(Outcome::Write(WriteIntent {
        flags: 0,
        expiry: stored.expiry,
        value: MapValue::new().encode()?,
        write_kind: WriteKind::Delete,
        status: CLEARED,
    }))
}
