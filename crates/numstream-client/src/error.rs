use std::num::ParseIntError;

use numstream_frame::FrameError;
use numstream_transport::TransportError;

/// A record that could not be decoded as a signed integer.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The record bytes are not UTF-8 text.
    #[error("record {record:?} is not valid UTF-8")]
    NotUtf8 { record: String },

    /// The record text is not a base-10 signed integer.
    #[error("record {record:?} is not a signed integer: {source}")]
    InvalidInteger {
        record: String,
        source: ParseIntError,
    },
}

/// Errors that abort a sequence.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint unreachable, connection reset, or I/O failure on send/receive.
    #[error("connection error: {0}")]
    Connection(#[from] TransportError),

    /// A record could not be decoded; the stream is considered desynchronized.
    #[error("protocol error: {0}")]
    Protocol(#[from] DecodeError),

    /// The framer rejected the stream (e.g. a runaway unterminated line).
    #[error("frame error: {0}")]
    Frame(FrameError),
}

impl From<FrameError> for ClientError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Transport(err) => ClientError::Connection(err),
            FrameError::Io(err) => ClientError::Connection(TransportError::Io(err)),
            other => ClientError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
