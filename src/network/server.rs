//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{self, Receiver};

use super::connection::{Connection, POLL_INTERVAL};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::storage::StorageAccessor;

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for MapKV
///
/// ## Threading
/// - The calling thread runs a non-blocking accept loop
/// - `worker_threads` workers take accepted sockets from a crossbeam channel
/// - Sockets beyond `max_connections` are refused with `SERVER_ERROR`
pub struct Server<S> {
    config: Config,
    engine: Arc<Engine<S>>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl<S: StorageAccessor + 'static> Server<S> {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine<S>>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Number of connections accepted and not yet closed
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            self.config.worker_threads
        );

        let (sender, receiver) = channel::unbounded::<TcpStream>();

        let workers: Vec<_> = (0..self.config.worker_threads)
            .map(|id| {
                let receiver = receiver.clone();
                let engine = Arc::clone(&self.engine);
                let config = self.config.clone();
                let shutdown = Arc::clone(&self.shutdown);
                let active = Arc::clone(&self.active);
                thread::Builder::new()
                    .name(format!("mapkv-worker-{}", id))
                    .spawn(move || worker_loop(receiver, engine, config, shutdown, active))
            })
            .collect::<std::io::Result<_>>()?;

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
                        tracing::warn!("Refusing {}: connection limit reached", addr);
                        refuse(stream);
                        continue;
                    }

                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Failed to configure socket for {}: {}", addr, e);
                        continue;
                    }

                    self.active.fetch_add(1, Ordering::Relaxed);
                    if sender.send(stream).is_err() {
                        self.active.fetch_sub(1, Ordering::Relaxed);
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(POLL_INTERVAL / 10);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(sender);
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }
}

fn worker_loop<S: StorageAccessor>(
    receiver: Receiver<TcpStream>,
    engine: Arc<Engine<S>>,
    config: Config,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
) {
    for stream in receiver {
        match Connection::new(stream, Arc::clone(&engine), &config, Arc::clone(&shutdown)) {
            Ok(mut connection) => {
                if let Err(e) = connection.handle() {
                    tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e);
                }
            }
            Err(e) => tracing::warn!("Failed to set up connection: {}", e),
        }
        active.fetch_sub(1, Ordering::Relaxed);
    }
}

fn refuse(mut stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.write_all(b"SERVER_ERROR too many connections\r\n");
}
