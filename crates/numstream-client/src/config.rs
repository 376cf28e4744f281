use numstream_frame::LineConfig;
use numstream_transport::TransportConfig;

/// Host of the public number-generator service.
pub const DEFAULT_HOST: &str = "algo.dei.unipd.it";
/// Port of the public number-generator service.
pub const DEFAULT_PORT: u16 = 8888;

/// Where the service lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service host name or address.
    pub host: String,
    /// Service TCP port.
    pub port: u16,
    /// Socket-level settings (timeouts, read size).
    pub transport: TransportConfig,
    /// Framing settings.
    pub line: LineConfig,
}

impl ClientConfig {
    /// Default settings pointed at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            transport: TransportConfig::default(),
            line: LineConfig::default(),
        }
    }
}
