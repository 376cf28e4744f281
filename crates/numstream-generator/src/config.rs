use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{GeneratorError, Result};

/// Seed used when none is requested or the requested one is unusable.
pub const DEFAULT_SEED: u64 = 1234;
/// Default number of distinct elements in the pool.
pub const DEFAULT_SIZE: usize = 100_000;

/// Where each connection's generator seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// Read one line from the client and parse it as a signed integer.
    Ask,
    /// Always use the configured default seed.
    Fixed,
    /// Draw a fresh seed per connection.
    Random,
}

/// Shape of the generated stream.
///
/// Loadable from a TOML file; keys left out keep their default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of distinct elements to draw values from.
    pub size: usize,
    /// `(count, weight)` pairs: the next `count` elements each get `weight`.
    /// Elements not covered share the remaining weight `1 - sum` evenly.
    pub proportions: Vec<(usize, f64)>,
    /// Limit the stream to this many values per second.
    pub max_rate: Option<f64>,
    /// Seed source.
    pub seed_mode: SeedMode,
    /// Fallback and `Fixed` seed.
    pub default_seed: u64,
    /// Close the connection after this many values.
    pub max_items: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            proportions: Vec::new(),
            max_rate: None,
            seed_mode: SeedMode::Ask,
            default_seed: DEFAULT_SEED,
            max_items: None,
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a stream.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GeneratorError::InvalidConfig(
                "size must be greater than zero".to_string(),
            ));
        }

        let mut covered = 0usize;
        let mut attributed = 0.0f64;
        for &(count, weight) in &self.proportions {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GeneratorError::InvalidConfig(format!(
                    "weight {weight} must be a finite non-negative number"
                )));
            }
            covered = covered.saturating_add(count);
            attributed += weight * count as f64;
        }

        if covered > self.size {
            return Err(GeneratorError::InvalidConfig(format!(
                "proportions cover {covered} elements but size is {}",
                self.size
            )));
        }
        if covered < self.size && attributed > 1.0 {
            return Err(GeneratorError::InvalidConfig(format!(
                "proportions attribute {attributed} of the total weight, leaving none for the rest"
            )));
        }

        self.rate_interval()?;

        Ok(())
    }

    /// Time between two values under `max_rate`, if one is set.
    pub fn rate_interval(&self) -> Result<Option<Duration>> {
        let Some(rate) = self.max_rate else {
            return Ok(None);
        };
        if !rate.is_finite() || rate <= 0.0 {
            return Err(GeneratorError::InvalidConfig(format!(
                "max rate {rate} must be a positive number"
            )));
        }
        Duration::try_from_secs_f64(1.0 / rate)
            .map(Some)
            .map_err(|_| {
                GeneratorError::InvalidConfig(format!("max rate {rate} is too small"))
            })
    }
}
