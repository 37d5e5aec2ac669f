//! Protocol codec
//!
//! Reading and writing the CRLF text protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! <command> <key> [args...] [forward]\r\n
//! [<data block of <bytes> length>\r\n]
//! ```
//!
//! ### Multi-record reply
//! ```text
//! VALUE <key> 0 <len>\r\n
//! <data>\r\n
//! ... (repeated)
//! END\r\n
//! ```

use std::io::{self, BufRead, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::command::FORWARD_MARKER;
use super::{CommandType, Reply, Request, END, VALUE};
use crate::error::{MapError, Result};

/// Longest accepted request or reply line, CRLF included
pub const MAX_LINE_SIZE: usize = 8 * 1024;

/// Largest oversized data block drained to keep a connection in sync
pub const MAX_DRAIN_SIZE: usize = 16 * 1024 * 1024;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Line / Block Reading
// =============================================================================

/// Read one CRLF-terminated line, returned without its terminator
///
/// Returns `Ok(None)` on a clean EOF before any byte was read.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_SIZE as u64)
        .read_until(b'\n', &mut buf)?;

    if read == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') {
        if read >= MAX_LINE_SIZE {
            return Err(MapError::Protocol(format!(
                "line exceeds {} bytes",
                MAX_LINE_SIZE
            )));
        }
        return Err(MapError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed mid-line",
        )));
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| MapError::Protocol("line is not valid UTF-8".to_string()))
}

/// Read a `len`-byte data block and its trailing CRLF
pub fn read_block<R: Read>(reader: &mut R, len: usize) -> Result<Bytes> {
    let framed = len
        .checked_add(CRLF.len())
        .ok_or_else(|| MapError::Protocol(format!("invalid length: {}", len)))?;

    let mut block = vec![0u8; framed];
    reader.read_exact(&mut block)?;

    if &block[len..] != CRLF {
        return Err(MapError::Protocol("bad data chunk".to_string()));
    }

    block.truncate(len);
    Ok(Bytes::from(block))
}

// =============================================================================
// Request Parsing / Encoding
// =============================================================================

/// Read a complete request (line + data block) from a stream
///
/// Returns `Ok(None)` once the peer has closed the stream. Blocks larger than
/// `max_value_size` are drained and refused. Blocks too large to drain yield
/// [`MapError::Framing`] and nothing more can be read from the stream.
pub fn read_request<R: BufRead>(reader: &mut R, max_value_size: usize) -> Result<Option<Request>> {
    let line = match read_line(reader)? {
        Some(line) => line,
        None => return Ok(None),
    };

    let mut request = parse_request_line(&line)?;

    if let Some(index) = request.command.length_index() {
        let len = parse_length(&request.argv[index])?;

        if len > max_value_size {
            let message = format!("data block of {} bytes exceeds limit of {}", len, max_value_size);
            if len > MAX_DRAIN_SIZE {
                return Err(MapError::Framing(message));
            }

            let framed = (len + CRLF.len()) as u64;
            io::copy(&mut reader.by_ref().take(framed), &mut io::sink())?;
            return Err(MapError::Protocol(message));
        }

        request.value = Some(read_block(reader, len)?);
    }

    Ok(Some(request))
}

/// Parse a request line into a request without its data block
pub fn parse_request_line(line: &str) -> Result<Request> {
    let mut argv: Vec<String> = line.split_ascii_whitespace().map(str::to_string).collect();

    let name = argv
        .first()
        .ok_or_else(|| MapError::Protocol("empty request line".to_string()))?;

    let command =
        CommandType::from_name(name).ok_or_else(|| MapError::UnknownCommand(name.clone()))?;

    let arity = command.arity();
    let forward = if argv.len() == arity + 1 && argv[arity] == FORWARD_MARKER {
        argv.pop();
        true
    } else if argv.len() == arity {
        false
    } else {
        return Err(MapError::Protocol(format!(
            "wrong number of arguments for {}: expected {}, got {}",
            command.name(),
            arity - 1,
            argv.len() - 1
        )));
    };

    Ok(Request {
        command,
        argv,
        value: None,
        forward,
    })
}

fn parse_length(token: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .map_err(|_| MapError::Protocol(format!("invalid length: {}", token)))
}

/// Encode a request (line + data block) to bytes
pub fn encode_request(request: &Request) -> Bytes {
    let value_len = request.value.as_ref().map(|v| v.len() + CRLF.len()).unwrap_or(0);
    let mut buf = BytesMut::with_capacity(64 + value_len);

    buf.put_slice(request.argv.join(" ").as_bytes());
    if request.forward {
        buf.put_u8(b' ');
        buf.put_slice(FORWARD_MARKER.as_bytes());
    }
    buf.put_slice(CRLF);

    if let Some(value) = &request.value {
        buf.put_slice(value);
        buf.put_slice(CRLF);
    }

    buf.freeze()
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Reply Encoding
// =============================================================================

/// Encode a reply to bytes
pub fn encode_reply(reply: &Reply) -> Bytes {
    let mut buf = BytesMut::new();

    match reply {
        Reply::Line(text) => {
            buf.put_slice(text.as_bytes());
            buf.put_slice(CRLF);
        }
        Reply::Values { key, records } => {
            for record in records {
                buf.put_slice(format!("{} {} 0 {}\r\n", VALUE, key, record.len()).as_bytes());
                buf.put_slice(record);
                buf.put_slice(CRLF);
            }
            buf.put_slice(END.as_bytes());
            buf.put_slice(CRLF);
        }
        Reply::ServerError(message) => {
            buf.put_slice(format!("SERVER_ERROR {}\r\n", single_line(message)).as_bytes());
        }
        Reply::ClientError(message) => {
            buf.put_slice(format!("CLIENT_ERROR {}\r\n", single_line(message)).as_bytes());
        }
        Reply::Error => buf.put_slice(b"ERROR\r\n"),
    }

    buf.freeze()
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    writer.write_all(&encode_reply(reply))?;
    writer.flush()?;
    Ok(())
}

/// Parse a `VALUE <key> <flags> <len>` header into key and length
pub fn parse_value_header(line: &str) -> Result<(String, usize)> {
    let parts: Vec<&str> = line.split_ascii_whitespace().collect();

    match parts.as_slice() {
        [VALUE, key, _flags, len] => Ok((key.to_string(), parse_length(len)?)),
        _ => Err(MapError::Protocol(format!("malformed record header: {}", line))),
    }
}

/// Error text must not break the line framing
fn single_line(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}
