use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::tcp::{TransportConfig, DEFAULT_READ_CHUNK_SIZE};

/// One result of a blocking chunk read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// At least one byte that arrived from the peer.
    Data(Bytes),
    /// The peer closed its side; no more bytes will ever arrive.
    EndOfStream,
}

/// A blocking source of raw byte chunks.
///
/// `receive_chunk` blocks until at least one byte is available or the peer
/// has closed the stream. It never returns an empty [`Chunk::Data`].
pub trait ChunkSource {
    /// Receive whatever bytes are currently available.
    fn receive_chunk(&mut self) -> Result<Chunk>;

    /// Release the underlying resource. Called once consumption has stopped.
    fn close(&mut self) {}
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn receive_chunk(&mut self) -> Result<Chunk> {
        (**self).receive_chunk()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn receive_chunk(&mut self) -> Result<Chunk> {
        (**self).receive_chunk()
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// A blocking sink for raw bytes.
pub trait ChunkSink {
    /// Write all of `bytes`, blocking until they are handed off.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<S: ChunkSink + ?Sized> ChunkSink for &mut S {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

/// Read up to `size` bytes, retrying interrupted reads.
fn read_chunk<R: Read>(reader: &mut R, size: usize) -> Result<Chunk> {
    let mut chunk = BytesMut::zeroed(size.max(1));
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(Chunk::EndOfStream),
            Ok(n) => {
                chunk.truncate(n);
                return Ok(Chunk::Data(chunk.freeze()));
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}

/// Adapts any blocking [`Read`] into a [`ChunkSource`].
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_READ_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self { inner, chunk_size }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn receive_chunk(&mut self) -> Result<Chunk> {
        read_chunk(&mut self.inner, self.chunk_size)
    }
}

/// An open, bidirectional TCP connection to exactly one peer.
///
/// The socket is closed when the connection is dropped. [`ChunkSource::close`]
/// additionally shuts down both directions so clones made with
/// [`Connection::try_clone`] observe the close too.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    read_chunk_size: usize,
}

impl Connection {
    /// Wrap an already connected stream with default settings.
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        Self::with_config(stream, &TransportConfig::default())
    }

    /// Wrap an already connected stream and apply `config` to it.
    pub fn with_config(stream: TcpStream, config: &TransportConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream,
            peer,
            read_chunk_size: config.read_chunk_size,
        })
    }

    /// Write all of `bytes`, blocking until they are handed to the kernel.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.stream.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed(self.peer)),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    /// Shut down both directions of the connection.
    pub fn shutdown(&self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Address of the remote endpoint.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Address of the local end.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr().map_err(Into::into)
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this connection (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            stream: self.stream.try_clone()?,
            peer: self.peer,
            read_chunk_size: self.read_chunk_size,
        })
    }
}

impl ChunkSource for Connection {
    fn receive_chunk(&mut self) -> Result<Chunk> {
        let chunk = read_chunk(&mut self.stream, self.read_chunk_size)?;
        if chunk == Chunk::EndOfStream {
            debug!(peer = %self.peer, "peer closed the stream");
        }
        Ok(chunk)
    }

    fn close(&mut self) {
        if let Err(err) = self.shutdown() {
            debug!(peer = %self.peer, error = %err, "shutdown on close failed");
        } else {
            debug!(peer = %self.peer, "connection closed");
        }
    }
}

impl ChunkSink for Connection {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        Connection::send(self, bytes)
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("read_chunk_size", &self.read_chunk_size)
            .finish()
    }
}
