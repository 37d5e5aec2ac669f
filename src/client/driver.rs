//! Client driver
//!
//! Typed map operations over a [`Transport`].

use std::net::ToSocketAddrs;
use std::time::Duration;

use bytes::Bytes;

use super::transport::{TcpTransport, Transport};
use crate::error::{MapError, Result};
use crate::protocol::{encode_request, parse_value_header, CommandType, Request, END, VALUE};

/// Longest key accepted by the driver
pub const MAX_KEY_LENGTH: usize = 250;

/// Default limit on values sent by the driver (1 MB)
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Default limit on a single record in a reply (64 MB)
///
/// Records may be whole-map dumps, so this is larger than the value limit.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

/// Answer to a single-line query
///
/// `Status` carries any reply that is not a value of the expected type,
/// such as `NOT_FOUND` or `SERVER_ERROR <msg>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Value(T),
    Status(String),
}

impl<T> Answer<T> {
    /// The value, if the server returned one
    pub fn value(self) -> Option<T> {
        match self {
            Answer::Value(v) => Some(v),
            Answer::Status(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Answer::Status(s) if s == crate::protocol::NOT_FOUND)
    }
}

/// Reply to `map_keys` / `map_values`: the count record and the items after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListReply<T> {
    pub count: usize,
    pub items: Vec<T>,
}

/// Client for the map commands
pub struct MapClient<T> {
    transport: T,
    max_value_size: usize,
    max_record_size: usize,
}

impl MapClient<TcpTransport> {
    /// Connect over TCP
    pub fn connect(addr: impl ToSocketAddrs, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::new(TcpTransport::connect(addr, timeout)?))
    }
}

impl<T: Transport> MapClient<T> {
    /// Create a client over an established transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }

    /// Set the largest value the client will send
    pub fn with_max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }

    /// Set the largest reply record the client will read
    pub fn with_max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Set `mapkey` to `value` in the map at `key`
    ///
    /// `expiry` follows the server rule: 0 never expires, below 30 days is
    /// relative, anything else absolute. Returns the status text (`STORED`).
    pub fn map_set(&mut self, key: &str, mapkey: &str, value: &[u8], expiry: u64) -> Result<String> {
        validate_key("key", key)?;
        validate_key("mapkey", mapkey)?;
        self.validate_value(value)?;

        let request = Request::new(
            CommandType::MapSet,
            [key.to_string(), mapkey.to_string(), "0".to_string(), expiry.to_string()],
        )
        .with_value(Bytes::copy_from_slice(value));

        self.oneline(&request)
    }

    /// Remove `mapkey`; returns `DELETED`, `NOT_DELETED` or `NOT_FOUND`
    pub fn map_delete(&mut self, key: &str, mapkey: &str) -> Result<String> {
        validate_key("key", key)?;
        validate_key("mapkey", mapkey)?;
        self.oneline(&Request::new(CommandType::MapDelete, [key, mapkey]))
    }

    /// Empty the map; returns `CLEARED` or `NOT_FOUND`
    pub fn map_clear(&mut self, key: &str) -> Result<String> {
        validate_key("key", key)?;
        self.oneline(&Request::new(CommandType::MapClear, [key]))
    }

    // =========================================================================
    // Single-line Queries
    // =========================================================================

    pub fn map_size(&mut self, key: &str) -> Result<Answer<u64>> {
        validate_key("key", key)?;
        let line = self.oneline(&Request::new(CommandType::MapSize, [key]))?;
        Ok(parse_count(line))
    }

    /// Whether `mapkey` is present
    pub fn map_key(&mut self, key: &str, mapkey: &str) -> Result<Answer<bool>> {
        validate_key("key", key)?;
        validate_key("mapkey", mapkey)?;
        let line = self.oneline(&Request::new(CommandType::MapKey, [key, mapkey]))?;
        Ok(parse_bool(line))
    }

    /// Whether any mapkey holds exactly `value`
    pub fn map_value(&mut self, key: &str, value: &[u8]) -> Result<Answer<bool>> {
        validate_key("key", key)?;
        self.validate_value(value)?;
        let request =
            Request::new(CommandType::MapValue, [key]).with_value(Bytes::copy_from_slice(value));
        let line = self.oneline(&request)?;
        Ok(parse_bool(line))
    }

    pub fn map_empty(&mut self, key: &str) -> Result<Answer<bool>> {
        validate_key("key", key)?;
        let line = self.oneline(&Request::new(CommandType::MapEmpty, [key]))?;
        Ok(parse_bool(line))
    }

    // =========================================================================
    // Value-list Queries
    // =========================================================================

    /// Value under `mapkey`, `None` if the key or mapkey is missing
    pub fn map_get(&mut self, key: &str, mapkey: &str) -> Result<Option<Vec<u8>>> {
        validate_key("key", key)?;
        validate_key("mapkey", mapkey)?;
        let records = self.value_list(&Request::new(CommandType::MapGet, [key, mapkey]))?;
        Ok(records.into_iter().next().map(|r| r.to_vec()))
    }

    /// All mapkeys, `None` if the key is missing
    pub fn map_keys(&mut self, key: &str) -> Result<Option<ListReply<String>>> {
        validate_key("key", key)?;
        let records = self.value_list(&Request::new(CommandType::MapKeys, [key]))?;

        counted(records)?
            .map(|list| -> Result<ListReply<String>> {
                let items = list
                    .items
                    .into_iter()
                    .map(|r| {
                        String::from_utf8(r)
                            .map_err(|_| MapError::Protocol("mapkey is not valid UTF-8".to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ListReply {
                    count: list.count,
                    items,
                })
            })
            .transpose()
    }

    /// All values, `None` if the key is missing
    pub fn map_values(&mut self, key: &str) -> Result<Option<ListReply<Vec<u8>>>> {
        validate_key("key", key)?;
        let records = self.value_list(&Request::new(CommandType::MapValues, [key]))?;
        counted(records)
    }

    /// Human-readable dump of the map, `None` if the key is missing
    pub fn map_to_s(&mut self, key: &str) -> Result<Option<String>> {
        validate_key("key", key)?;
        let records = self.value_list(&Request::new(CommandType::MapToS, [key]))?;

        records
            .into_iter()
            .next()
            .map(|r| {
                String::from_utf8(r.to_vec())
                    .map_err(|_| MapError::Protocol("dump is not valid UTF-8".to_string()))
            })
            .transpose()
    }

    // =========================================================================
    // Receivers
    // =========================================================================

    /// Send `request` and return the single reply line
    fn oneline(&mut self, request: &Request) -> Result<String> {
        self.transport.send(&encode_request(request))?;
        self.transport.read_line()
    }

    /// Send `request` and collect `VALUE` records up to `END`
    ///
    /// Either every record up to `END` is returned or an error is.
    fn value_list(&mut self, request: &Request) -> Result<Vec<Bytes>> {
        self.transport.send(&encode_request(request))?;

        let mut records = Vec::new();
        loop {
            let line = self.transport.read_line()?;

            if line == END {
                return Ok(records);
            }

            if line.starts_with(VALUE) {
                let (_, len) = parse_value_header(&line)?;
                if len > self.max_record_size {
                    return Err(MapError::Protocol(format!(
                        "record of {} bytes exceeds limit of {}",
                        len, self.max_record_size
                    )));
                }
                records.push(self.transport.read_block(len)?);
                continue;
            }

            if let Some(message) = line.strip_prefix("SERVER_ERROR ") {
                return Err(MapError::ServerError(message.to_string()));
            }

            return Err(MapError::Protocol(format!("unexpected reply line: {}", line)));
        }
    }

    fn validate_value(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_size {
            return Err(MapError::InvalidArgument(format!(
                "value of {} bytes exceeds limit of {}",
                value.len(),
                self.max_value_size
            )));
        }
        Ok(())
    }
}

/// Keys travel as request-line tokens
fn validate_key(name: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(MapError::InvalidArgument(format!("{} must not be empty", name)));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(MapError::InvalidArgument(format!(
            "{} longer than {} bytes",
            name, MAX_KEY_LENGTH
        )));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(MapError::InvalidArgument(format!(
            "{} must not contain whitespace or control characters",
            name
        )));
    }
    Ok(())
}

fn parse_bool(line: String) -> Answer<bool> {
    match line.as_str() {
        "true" => Answer::Value(true),
        "false" => Answer::Value(false),
        _ => Answer::Status(line),
    }
}

fn parse_count(line: String) -> Answer<u64> {
    if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = line.parse() {
            return Answer::Value(n);
        }
    }
    Answer::Status(line)
}

/// Split a count record off the front and check it against the rest
fn counted(records: Vec<Bytes>) -> Result<Option<ListReply<Vec<u8>>>> {
    let mut records = records.into_iter();

    let count_record = match records.next() {
        Some(record) => record,
        None => return Ok(None),
    };

    let count = std::str::from_utf8(&count_record)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| MapError::Protocol("count record is not a number".to_string()))?;

    let items: Vec<Vec<u8>> = records.map(|r| r.to_vec()).collect();

    if items.len() != count {
        return Err(MapError::Protocol(format!(
            "count record says {} items, got {}",
            count,
            items.len()
        )));
    }

    Ok(Some(ListReply { count, items }))
}
