//! Blocking TCP byte-stream transport.
//!
//! This is the lowest layer of numstream. It opens exactly one connection to
//! a remote endpoint and hands out whatever bytes the socket has available as
//! a [`Chunk`], with an explicit [`Chunk::EndOfStream`] marker once the peer
//! performs an orderly close.
//!
//! Everything else builds on top of the [`ChunkSource`] trait and the
//! [`Connection`] type provided here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{connect, connect_with_config, Listener, TransportConfig, DEFAULT_READ_CHUNK_SIZE};
pub use traits::{Chunk, ChunkSink, ChunkSource, Connection, ReadSource};
