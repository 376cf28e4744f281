use std::time::{Duration, Instant};

use numstream_client::{ClientError, SequenceClient};
use tracing::debug;

use crate::histogram::Histogram;

/// Values consumed and the wall time it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub items: u64,
    pub elapsed: Duration,
}

impl Measurement {
    /// Values per second; zero when no time elapsed.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.items as f64 / secs
        } else {
            0.0
        }
    }
}

/// Run one seeded sequence to completion, tallying every value into `histogram`.
///
/// Timing covers connecting, the seed handshake, and consumption. On error the values
/// consumed before the failure stay recorded in `histogram`.
pub fn consume(
    client: &SequenceClient,
    seed: i64,
    limit: u64,
    histogram: &mut Histogram,
) -> Result<Measurement, ClientError> {
    let start = Instant::now();
    let mut items = 0u64;

    for value in client.start_sequence(seed, limit)? {
        histogram.record(value?);
        items += 1;
    }

    let measurement = Measurement {
        items,
        elapsed: start.elapsed(),
    };
    debug!(
        items,
        elapsed_ms = measurement.elapsed.as_millis() as u64,
        "sequence consumed"
    );
    Ok(measurement)
}
