use std::fmt;
use std::io;

use numstream_client::ClientError;
use numstream_frame::FrameError;
use numstream_generator::GeneratorError;
use numstream_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err.io_error() {
        Some(source) => CliError::new(io_error(context, source).code, format!("{context}: {err}")),
        None => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Io(source) => io_error(context, &source),
        FrameError::LineTooLong { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::EmbeddedDelimiter => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Connection(err) => transport_error(context, err),
        ClientError::Frame(err) => frame_error(context, err),
        ClientError::Protocol(err) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

pub fn generator_error(context: &str, err: GeneratorError) -> CliError {
    match err {
        GeneratorError::Transport(err) => transport_error(context, err),
        GeneratorError::Frame(err) => frame_error(context, err),
        GeneratorError::InvalidConfig(_)
        | GeneratorError::Weights(_)
        | GeneratorError::Load(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}
