use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Connection;

/// Default size of a single blocking read: 8 KiB.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Socket-level settings applied to every connection.
///
/// All timeouts default to `None`: operations block until data arrives or
/// the peer goes away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for establishing the connection.
    pub connect_timeout: Option<Duration>,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
    /// Maximum number of bytes requested per read.
    pub read_chunk_size: usize,
    /// Disable Nagle's algorithm.
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            nodelay: true,
        }
    }
}

/// Connect to `host:port` (blocking) with default settings.
pub fn connect(host: &str, port: u16) -> Result<Connection> {
    connect_with_config(host, port, &TransportConfig::default())
}

/// Connect to `host:port` (blocking) with explicit settings.
///
/// Every resolved address is tried in order; the error of the last attempt is
/// reported if none succeeds.
pub fn connect_with_config(host: &str, port: u16, config: &TransportConfig) -> Result<Connection> {
    let addr = format!("{host}:{port}");
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.clone(),
            source,
        })?
        .collect();

    if candidates.is_empty() {
        return Err(TransportError::Resolve {
            addr,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }

    let mut last_err = None;
    for candidate in &candidates {
        let attempt = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                debug!(%candidate, "connected");
                return Connection::with_config(stream, config);
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "no connect attempt made")
        }),
    })
}

/// A listening TCP socket handing out [`Connection`]s.
pub struct Listener {
    listener: TcpListener,
    addr: SocketAddr,
    config: TransportConfig,
}

impl Listener {
    /// Bind and listen on `addr` with default settings.
    pub fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, TransportConfig::default())
    }

    /// Bind and listen on `addr`; accepted connections get `config` applied.
    pub fn bind_with_config(addr: &str, config: TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local = listener.local_addr().map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        info!(addr = %local, "listening on tcp socket");

        Ok(Self {
            listener,
            addr: local,
            config,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Connection> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Connection::with_config(stream, &self.config)
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("addr", &self.addr).finish()
    }
}
