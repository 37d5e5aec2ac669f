//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{MapError, Result};
use crate::protocol::{read_request, write_reply, Reply};
use crate::storage::StorageAccessor;

/// How often an idle connection checks for shutdown
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handles a single client connection
pub struct Connection<S> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the dispatch engine
    engine: Arc<Engine<S>>,

    /// Peer address for logging
    peer_addr: String,

    /// Largest accepted data block
    max_value_size: usize,

    /// Close after this long without a request
    idle_timeout: Option<Duration>,

    /// Set when the server is shutting down
    shutdown: Arc<AtomicBool>,
}

impl<S: StorageAccessor> Connection<S> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn new(
        stream: TcpStream,
        engine: Arc<Engine<S>>,
        config: &Config,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Short read timeout so idle connections notice shutdown
        stream.set_read_timeout(Some(POLL_INTERVAL))?;
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let idle_timeout = if config.read_timeout_ms > 0 {
            Some(Duration::from_millis(config.read_timeout_ms))
        } else {
            None
        };

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
            max_value_size: config.max_value_size,
            idle_timeout,
            shutdown,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and sends replies.
    /// Returns when the client disconnects, the server shuts down, or an
    /// error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if !self.wait_for_request()? {
                return Ok(());
            }

            let reply = match read_request(&mut self.reader, self.max_value_size) {
                Ok(Some(request)) => {
                    tracing::trace!("Received request from {}: {:?}", self.peer_addr, request.argv);
                    self.engine.execute(&request)
                }
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(MapError::UnknownCommand(name)) => {
                    tracing::debug!("Unknown command from {}: {}", self.peer_addr, name);
                    Reply::Error
                }
                Err(MapError::Protocol(msg)) => Reply::ClientError(msg),
                Err(MapError::Framing(msg)) => {
                    tracing::debug!("Closing {} after framing error: {}", self.peer_addr, msg);
                    let _ = write_reply(&mut self.writer, &Reply::ClientError(msg));
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            if let Err(e) = write_reply(&mut self.writer, &reply) {
                // Client went away before the reply could be sent
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before reply could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Block until request bytes are buffered
    ///
    /// Returns `false` on EOF, shutdown, or idle timeout. Nothing is consumed
    /// from the stream, so a timeout never splits a request.
    fn wait_for_request(&mut self) -> Result<bool> {
        let idle_since = Instant::now();

        loop {
            match self.reader.fill_buf() {
                Ok(buf) if buf.is_empty() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(false);
                }
                Ok(_) => return Ok(true),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        tracing::debug!("Closing {} for shutdown", self.peer_addr);
                        return Ok(false);
                    }
                    if let Some(timeout) = self.idle_timeout {
                        if idle_since.elapsed() >= timeout {
                            tracing::debug!("Read timeout for client {}", self.peer_addr);
                            return Ok(false);
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    let e = MapError::Io(e);
                    if e.is_disconnect() {
                        tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                        return Ok(false);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
