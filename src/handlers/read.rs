//! Read-only handlers
//!
//! Single-line commands answer `NOT_FOUND` for a missing entry. Multi-record
//! commands answer with a bare `END` instead.

use bytes::Bytes;

use super::{Context, Outcome};
use crate::codec::MapValue;
use crate::error::Result;
use crate::protocol::Reply;

fn reply(reply: Reply) -> Result<Outcome> {
    Ok(Outcome::Reply(reply))
}

/// Apply `f` to the decoded map, or answer `NOT_FOUND`
fn with_map(ctx: &Context<'_>, f: impl FnOnce(&MapValue) -> Reply) -> Result<Outcome> {
    match ctx.load()? {
        Some(map) => reply(f(&map)),
        None => reply(Reply::not_found()),
    }
}

/// Count record followed by one record per item
fn counted_records<'m>(items: impl ExactSizeIterator<Item = &'m [u8]>) -> Vec<Bytes> {
    let mut records = Vec::with_capacity(items.len() + 1);
    records.push(Bytes::from(items.len().to_string()));
    records.extend(items.map(Bytes::copy_from_slice));
    records
}

/// `map_get <key> <mapkey>`
pub(super) fn map_get(ctx: &Context<'_>) -> Result<Outcome> {
    let mapkey = ctx.arg(2, "mapkey")?;

    let records = match ctx.load()? {
        Some(map) => map.get(mapkey).map(Bytes::copy_from_slice).into_iter().collect(),
        None => Vec::new(),
    };

    reply(Reply::values(ctx.key, records))
}

/// `map_size <key>`
pub(super) fn map_size(ctx: &Context<'_>) -> Result<Outcome> {
    with_map(ctx, |map| Reply::line(map.len().to_string()))
}

/// `map_key? <key> <mapkey>`
pub(super) fn map_key(ctx: &Context<'_>) -> Result<Outcome> {
    let mapkey = ctx.arg(2, "mapkey")?;
    with_map(ctx, |map| Reply::boolean(map.contains_key(mapkey)))
}

/// `map_value? <key> <bytes>` + data block
///
/// True if any secondary key holds an equal byte string.
pub(super) fn map_value(ctx: &Context<'_>) -> Result<Outcome> {
    let value = ctx.value()?;
    with_map(ctx, |map| Reply::boolean(map.contains_value(value)))
}

/// `map_empty? <key>`
pub(super) fn map_empty(ctx: &Context<'_>) -> Result<Outcome> {
    with_map(ctx, |map| Reply::boolean(map.is_empty()))
}

/// `map_keys <key>`
pub(super) fn map_keys(ctx: &Context<'_>) -> Result<Outcome> {
    let records = match ctx.load()? {
        Some(map) => counted_records(map.keys().map(str::as_bytes)),
        None => Vec::new(),
    };

    reply(Reply::values(ctx.key, records))
}

/// `map_values <key>`
pub(super) fn map_values(ctx: &Context<'_>) -> Result<Outcome> {
    let records = match ctx.load()? {
        Some(map) => counted_records(map.values()),
        None => Vec::new(),
    };

    reply(Reply::values(ctx.key, records))
}

/// `map_to_s <key>`
pub(super) fn map_to_s(ctx: &Context<'_>) -> Result<Outcome> {
    let records = match ctx.load()? {
        Some(map) => vec![Bytes::from(map.inspect())],
        None => Vec::new(),
    };

    reply(Reply::values(ctx.key, records))
}
