use numstream_frame::LineReader;
use numstream_transport::{connect_with_config, Connection};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::handshake::send_seed;
use crate::sequence::Sequence;

/// Start a sequence against the default service endpoint.
pub fn start_sequence(seed: i64, limit: u64) -> Result<Sequence<Connection>> {
    SequenceClient::default().start_sequence(seed, limit)
}

/// Opens seeded sequences against one configured endpoint.
///
/// Every call to [`SequenceClient::start_sequence`] opens its own connection
/// with its own frame buffer; nothing is shared between sequences.
#[derive(Debug, Clone, Default)]
pub struct SequenceClient {
    config: ClientConfig,
}

impl SequenceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect, send the seed, and return a sequence bounded to `limit` values.
    pub fn start_sequence(&self, seed: i64, limit: u64) -> Result<Sequence<Connection>> {
        let mut connection =
            connect_with_config(&self.config.host, self.config.port, &self.config.transport)?;
        send_seed(&mut connection, seed)?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            seed,
            limit,
            "sequence started"
        );

        let lines = LineReader::with_config(connection, self.config.line.clone());
        Ok(Sequence::new(lines, limit))
    }
}
