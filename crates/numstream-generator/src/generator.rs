use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::config::GeneratorConfig;
use crate::error::Result;

/// Draws values from a seeded pool of random elements with skewed weights.
///
/// The same configuration and seed always produce the same value sequence.
pub struct Generator {
    elements: Vec<u32>,
    distr: WeightedIndex<f64>,
    rng: Xoshiro256StarStar,
}

impl Generator {
    pub fn new(config: &GeneratorConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let elements: Vec<u32> = Uniform::new(0u32, u32::MAX)
            .sample_iter(&mut rng)
            .take(config.size)
            .collect();
        let distr = WeightedIndex::new(element_weights(config))?;

        Ok(Self {
            elements,
            distr,
            rng,
        })
    }

    /// Draw the next value.
    pub fn next_value(&mut self) -> u32 {
        self.elements[self.distr.sample(&mut self.rng)]
    }

    /// The element pool, in weight order.
    pub fn elements(&self) -> &[u32] {
        &self.elements
    }
}

impl Iterator for Generator {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        Some(self.next_value())
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("elements", &self.elements.len())
            .finish()
    }
}

fn element_weights(config: &GeneratorConfig) -> Vec<f64> {
    let mut weights = Vec::with_capacity(config.size);
    let mut attributed = 0.0f64;
    for &(count, weight) in &config.proportions {
        for _ in 0..count {
            weights.push(weight);
            attributed += weight;
        }
    }

    let rest = config.size - weights.len();
    if rest > 0 {
        let share = (1.0 - attributed) / rest as f64;
        weights.resize(config.size, share);
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;

    fn config(size: usize, proportions: Vec<(usize, f64)>) -> GeneratorConfig {
        GeneratorConfig {
            size,
            proportions,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let cfg = config(1000, vec![]);
        let a: Vec<u32> = Generator::new(&cfg, 23).unwrap().take(100).collect();
        let b: Vec<u32> = Generator::new(&cfg, 23).unwrap().take(100).collect();
        let c: Vec<u32> = Generator::new(&cfg, 24).unwrap().take(100).collect();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn values_come_from_the_pool() {
        let mut generator = Generator::new(&config(16, vec![]), 7).unwrap();
        let pool = generator.elements().to_vec();
        assert_eq!(pool.len(), 16);

        for _ in 0..500 {
            assert!(pool.contains(&generator.next_value()));
        }
    }

    #[test]
    fn heavy_element_dominates() {
        let mut generator = Generator::new(&config(10, vec![(1, 0.5)]), 99).unwrap();
        let heavy = generator.elements()[0];

        let draws = 20_000;
        let hits = (0..draws).filter(|_| generator.next_value() == heavy).count();
        let share = hits as f64 / draws as f64;
        assert!((0.45..0.55).contains(&share), "heavy share was {share}");
    }

    #[test]
    fn weights_spread_remainder_evenly() {
        let weights = element_weights(&config(4, vec![(2, 0.3)]));
        assert_eq!(weights.len(), 4);
        assert_eq!(&weights[..2], &[0.3, 0.3]);
        assert!((weights[2] - 0.2).abs() < 1e-12);
        assert!((weights[3] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn all_zero_weights_rejected() {
        let result = Generator::new(&config(2, vec![(2, 0.0)]), 1);
        assert!(matches!(result, Err(GeneratorError::Weights(_))));
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Generator::new(&config(0, vec![]), 1);
        assert!(matches!(result, Err(GeneratorError::InvalidConfig(_))));
    }
}
