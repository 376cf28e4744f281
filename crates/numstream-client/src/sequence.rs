use std::iter::FusedIterator;

use numstream_frame::LineReader;
use numstream_transport::ChunkSource;
use tracing::debug;

use crate::decode::decode_value;
use crate::error::Result;

/// A lazy, bounded sequence of integers decoded from framed records.
///
/// Values come out in wire order. The sequence stops pulling records once
/// `limit` values have been yielded, when the stream ends, or on the first
/// error; at that point the underlying source is closed and dropped. Later
/// calls to `next` return `None`.
pub struct Sequence<S: ChunkSource> {
    lines: Option<LineReader<S>>,
    limit: u64,
    yielded: u64,
}

impl<S: ChunkSource> Sequence<S> {
    /// Bound an already seeded record stream to `limit` values.
    ///
    /// A zero limit closes the source right away without reading from it.
    pub fn new(lines: LineReader<S>, limit: u64) -> Self {
        let mut sequence = Self {
            lines: Some(lines),
            limit,
            yielded: 0,
        };
        if limit == 0 {
            sequence.finish("zero limit");
        }
        sequence
    }

    /// Number of values yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Maximum number of values this sequence will yield.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Whether the underlying source has been released.
    pub fn is_finished(&self) -> bool {
        self.lines.is_none()
    }

    /// Pull and decode the next value (blocking).
    pub fn next_value(&mut self) -> Result<Option<i64>> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let record = match lines.read_line() {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.finish("end of stream");
                return Ok(None);
            }
            Err(err) => {
                self.finish("frame error");
                return Err(err.into());
            }
        };

        match decode_value(&record) {
            Ok(value) => {
                self.yielded += 1;
                if self.yielded >= self.limit {
                    self.finish("limit reached");
                }
                Ok(Some(value))
            }
            Err(err) => {
                self.finish("protocol error");
                Err(err.into())
            }
        }
    }

    fn finish(&mut self, reason: &'static str) {
        if let Some(mut lines) = self.lines.take() {
            debug!(
                yielded = self.yielded,
                limit = self.limit,
                reason,
                "sequence finished"
            );
            lines.get_mut().close();
        }
    }
}

impl<S: ChunkSource> Iterator for Sequence<S> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_value().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.lines.is_none() {
            return (0, Some(0));
        }
        let remaining = self.limit.saturating_sub(self.yielded);
        (0, usize::try_from(remaining).ok())
    }
}

impl<S: ChunkSource> FusedIterator for Sequence<S> {}

impl<S: ChunkSource> Drop for Sequence<S> {
    fn drop(&mut self) {
        self.finish("dropped");
    }
}

impl<S: ChunkSource> std::fmt::Debug for Sequence<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("limit", &self.limit)
            .field("yielded", &self.yielded)
            .field("finished", &self.is_finished())
            .finish()
    }
}
