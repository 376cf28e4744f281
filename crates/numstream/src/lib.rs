//! Seeded integer stream client.
//!
//! numstream connects to a number-generator service, sends a seed, reads a bounded run of
//! newline-delimited integers, and tallies them into a frequency histogram while measuring
//! consumption throughput.
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking TCP connection and chunk source abstraction
//! - [`frame`]: newline record framing over chunk sources
//! - [`client`]: seeded, bounded integer sequences (behind `client` feature)
//! - [`generator`]: the number-generator service (behind `generator` feature)
//! - [`Histogram`] and [`consume`]: the driver-side tally and timing (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use numstream_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use numstream_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use numstream_client::*;
}

/// Re-export generator types (requires `generator` feature).
#[cfg(feature = "generator")]
pub mod generator {
    pub use numstream_generator::*;
}

#[cfg(feature = "client")]
mod histogram;
#[cfg(feature = "client")]
mod measure;

#[cfg(feature = "client")]
pub use histogram::Histogram;
#[cfg(feature = "client")]
pub use measure::{consume, Measurement};
