//! Seeded, bounded integer sequence client.
//!
//! This is the "just works" layer. Connect to the number-generator service,
//! seed it with one line, and pull decoded integers until a caller-supplied
//! limit is reached or the service closes the stream.

pub mod config;
pub mod connector;
pub mod decode;
pub mod error;
pub mod handshake;
pub mod sequence;

pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use connector::{start_sequence, SequenceClient};
pub use decode::decode_value;
pub use error::{ClientError, DecodeError, Result};
pub use handshake::send_seed;
pub use sequence::Sequence;
