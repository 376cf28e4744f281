//! Newline-delimited record framing over chunked byte streams.
//!
//! This is the core layer of numstream. Raw chunks from a
//! [`numstream_transport::ChunkSource`] arrive split at arbitrary points; the
//! [`LineReader`] reassembles them into complete [`Record`]s:
//! - records are separated by a single `\n`, which is not part of the record
//! - one chunk may carry zero, one, or many records
//! - a trailing record without a final `\n` is still emitted at end of stream
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_line, encode_line, LineConfig, Record, DEFAULT_MAX_LINE, DELIMITER};
pub use error::{FrameError, Result};
pub use reader::{frame, LineReader};
pub use writer::LineWriter;
