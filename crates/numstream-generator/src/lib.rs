//! Seeded, weighted number-generator service.
//!
//! The counterpart of `numstream-client`: accepts TCP connections, reads one
//! seed line, and streams `<value>\n` lines drawn from a fixed pool of random
//! elements with configurable skew until the client disconnects.

pub mod config;
pub mod error;
pub mod generator;
pub mod reload;
pub mod server;

pub use config::{GeneratorConfig, SeedMode, DEFAULT_SEED, DEFAULT_SIZE};
pub use error::{GeneratorError, Result};
pub use generator::Generator;
pub use reload::{watch, SharedConfig, DEFAULT_RELOAD_INTERVAL};
pub use server::{resolve_seed, serve_connection, GeneratorServer, ServeSummary};
