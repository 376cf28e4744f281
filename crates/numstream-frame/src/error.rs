use numstream_transport::TransportError;

/// Errors that can occur while framing or writing records.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The underlying transport failed while receiving bytes.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A record grew past the configured maximum without a delimiter.
    #[error("line too long ({len} bytes, max {max})")]
    LineTooLong { len: usize, max: usize },

    /// A payload handed to the encoder contains the delimiter byte.
    #[error("payload contains an embedded newline")]
    EmbeddedDelimiter,

    /// An I/O error occurred while writing records.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
