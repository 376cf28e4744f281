use std::iter::FusedIterator;

use bytes::BytesMut;
use numstream_transport::{Chunk, ChunkSource};
use tracing::{debug, trace};

use crate::codec::{decode_line, LineConfig, Record};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Exhausted,
    Failed,
}

/// Frame a chunk source into a lazy sequence of records.
pub fn frame<S: ChunkSource>(source: S) -> LineReader<S> {
    LineReader::new(source)
}

/// Reads complete newline-delimited records from any [`ChunkSource`].
///
/// Bytes after the first delimiter stay buffered for later calls, and no new
/// chunk is requested while a complete record is still buffered. When the
/// source reports end of stream, leftover bytes become one final record.
///
/// The reader is fused: once the stream is exhausted or an error has been
/// returned, every later call yields nothing.
pub struct LineReader<S> {
    source: S,
    buf: BytesMut,
    scanned: usize,
    config: LineConfig,
    state: State,
}

impl<S: ChunkSource> LineReader<S> {
    /// Create a new line reader with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, LineConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(source: S, config: LineConfig) -> Self {
        Self {
            source,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
            config,
            state: State::Open,
        }
    }

    /// Read the next complete record (blocking).
    ///
    /// Returns `Ok(None)` once the source has ended and nothing is left over.
    pub fn read_line(&mut self) -> Result<Option<Record>> {
        if self.state != State::Open {
            return Ok(None);
        }

        loop {
            if let Some(record) = decode_line(&mut self.buf, &mut self.scanned) {
                self.check_length(record.len())?;
                return Ok(Some(record));
            }
            self.check_length(self.buf.len())?;

            match self.source.receive_chunk() {
                Ok(Chunk::Data(bytes)) => {
                    trace!(len = bytes.len(), "received chunk");
                    self.buf.extend_from_slice(&bytes);
                }
                Ok(Chunk::EndOfStream) => {
                    self.state = State::Exhausted;
                    if self.buf.is_empty() {
                        debug!("stream exhausted");
                        return Ok(None);
                    }
                    debug!(len = self.buf.len(), "flushing unterminated final record");
                    self.scanned = 0;
                    return Ok(Some(Record::new(self.buf.split().freeze())));
                }
                Err(err) => {
                    self.state = State::Failed;
                    return Err(FrameError::Transport(err));
                }
            }
        }
    }

    fn check_length(&mut self, len: usize) -> Result<()> {
        match self.config.max_line_length {
            Some(max) if len > max => {
                self.state = State::Failed;
                Err(FrameError::LineTooLong { len, max })
            }
            _ => Ok(()),
        }
    }

    /// Whether the reader will yield no further records.
    pub fn is_finished(&self) -> bool {
        self.state != State::Open
    }

    /// Bytes received but not yet resolved into a record.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Update maximum record length for subsequent reads.
    pub fn set_max_line_length(&mut self, max_line_length: Option<usize>) {
        self.config.max_line_length = max_line_length;
    }

    /// Current line reader configuration.
    pub fn config(&self) -> &LineConfig {
        &self.config
    }
}

impl<S: ChunkSource> Iterator for LineReader<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

impl<S: ChunkSource> FusedIterator for LineReader<S> {}

impl<S> std::fmt::Debug for LineReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineReader")
            .field("buffered", &self.buf.len())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}
