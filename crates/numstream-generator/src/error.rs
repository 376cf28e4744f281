use numstream_frame::FrameError;
use numstream_transport::TransportError;

/// Errors that can occur while configuring or running the generator service.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The generator configuration cannot produce a distribution.
    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read or parsed.
    #[error("failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),
    /// The element weights were rejected by the sampler.
    #[error("invalid weights: {0}")]
    Weights(#[from] rand::distributions::WeightedError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
