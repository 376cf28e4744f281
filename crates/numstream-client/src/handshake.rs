use bytes::BytesMut;
use numstream_frame::encode_line;
use numstream_transport::ChunkSink;
use tracing::debug;

use crate::error::Result;

/// Seed the remote generator: send `<seed>\n` in one write.
///
/// No reply is expected; values start flowing right after.
pub fn send_seed<S: ChunkSink + ?Sized>(sink: &mut S, seed: i64) -> Result<()> {
    let mut line = BytesMut::new();
    encode_line(seed.to_string().as_bytes(), &mut line)?;
    sink.send(&line)?;
    debug!(seed, "sent seed");
    Ok(())
}
