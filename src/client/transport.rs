//! Client transports
//!
//! Line-oriented byte transport the driver talks through.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{MapError, Result};
use crate::protocol;

/// What the client driver needs from a connection
pub trait Transport {
    /// Send raw request bytes
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one reply line without its CRLF
    fn read_line(&mut self) -> Result<String>;

    /// Read a `len`-byte data block and its trailing CRLF
    fn read_block(&mut self, len: usize) -> Result<Bytes>;
}

/// Transport over any buffered reader / writer pair
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Split back into reader and writer
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Transport for StreamTransport<R, W> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        protocol::read_line(&mut self.reader)?.ok_or_else(|| {
            MapError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ))
        })
    }

    fn read_block(&mut self, len: usize) -> Result<Bytes> {
        protocol::read_block(&mut self.reader, len)
    }
}

/// Buffered TCP transport
pub type TcpTransport = StreamTransport<BufReader<TcpStream>, BufWriter<TcpStream>>;

impl StreamTransport<BufReader<TcpStream>, BufWriter<TcpStream>> {
    /// Connect to a server, applying `timeout` to reads and writes if given
    pub fn connect(addr: impl ToSocketAddrs, timeout: Option<Duration>) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        let read_stream = stream.try_clone()?;
        Ok(Self::new(BufReader::new(read_stream), BufWriter::new(stream)))
    }
}
