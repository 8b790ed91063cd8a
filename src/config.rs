//! Configuration of an evolutionary run.
//!
//! Configurations may be built in code or loaded from TOML. Every field is optional within the
//! TOML source, falling back to its default.
//!
//! ```toml
//! population_size = 200
//! max_generations = 100
//! selection_bias = 0.8
//!
//! [tree]
//! max_depth = 3
//! ```

use crate::error::{Error, Result};
use crate::ga::ELITE_COUNT;
use crate::gp::expr::gen::GenParams;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolveConfig {
    /// The number of individuals within each generation.
    pub population_size: usize,
    /// The maximum number of generations to rank before giving up.
    pub max_generations: usize,
    /// The probability that each node of an offspring is replaced by a random subtree.
    pub mutation_rate: f64,
    /// The probability that each non-root node is swapped for one from the second parent.
    pub crossover_rate: f64,
    /// The base of the rank-biased parent selection. Closer to `0` favours the best ranked.
    pub selection_bias: f64,
    /// The probability that an offspring is an entirely new random tree.
    pub new_random_rate: f64,
    /// Threads used to breed offspring. Defaults to the number of CPUs.
    pub num_threads: Option<u32>,
    /// Seed for reproducible runs. Seeded from entropy if absent.
    pub seed: Option<u64>,
    /// Parameters used when generating random trees.
    pub tree: GenParams,
}

impl Default for EvolveConfig {
    fn default() -> Self {
        Self {
            population_size: 500,
            max_generations: 500,
            mutation_rate: 0.1,
            crossover_rate: 0.4,
            selection_bias: 0.7,
            new_random_rate: 0.05,
            num_threads: None,
            seed: None,
            tree: GenParams::default(),
        }
    }
}

impl EvolveConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < ELITE_COUNT {
            return Err(Error::Configuration(format!(
                "Population size must be at least {}",
                ELITE_COUNT
            )));
        }
        if self.max_generations == 0 {
            return Err(Error::Configuration(
                "Max generations must be at least 1".to_string(),
            ));
        }
        let probabilities = [
            ("Mutation rate", self.mutation_rate),
            ("Crossover rate", self.crossover_rate),
            ("New random rate", self.new_random_rate),
            ("Operator probability", self.tree.operator_prob),
            ("Parameter probability", self.tree.parameter_prob),
        ];
        for &(name, p) in &probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Configuration(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        if !(self.selection_bias > 0.0 && self.selection_bias < 1.0) {
            return Err(Error::Configuration(
                "Selection bias must be strictly between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EvolveConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize: {}", e)))
    }

    /// The number of threads to breed with, never less than one.
    pub fn num_threads(&self) -> u32 {
        match self.num_threads {
            Some(0) => {
                log::warn!("num_threads of 0 requested, using a single thread");
                1
            }
            Some(n) => n,
            None => num_cpus::get() as u32,
        }
    }

    /// A random number generator seeded from `seed`, or from entropy if no seed was given.
    pub fn rng(&self) -> XorShiftRng {
        match self.seed {
            Some(seed) => XorShiftRng::seed_from_u64(seed),
            None => XorShiftRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EvolveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tree.max_depth, 4);
        assert_eq!(config.max_generations, 500);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = EvolveConfig::from_toml_str(
            "population_size = 20\nseed = 7\n\n[tree]\nmax_depth = 2\n",
        )
        .unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tree.max_depth, 2);
        assert_eq!(config.tree.operator_prob, 0.5);
        assert_eq!(config.mutation_rate, 0.1);
    }

    #[test]
    fn toml_round_trip() {
        let config = EvolveConfig { seed: Some(3), num_threads: Some(2), ..Default::default() };
        let s = config.to_toml_string().unwrap();
        assert_eq!(EvolveConfig::from_toml_str(&s).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            "population_size = 1",
            "max_generations = 0",
            "mutation_rate = 1.5",
            "selection_bias = 1.0",
            "selection_bias = 0.0",
            "[tree]\nparameter_prob = -0.1",
        ];
        for case in &cases {
            match EvolveConfig::from_toml_str(case) {
                Err(Error::Configuration(_)) => (),
                other => panic!("{:?} produced {:?}", case, other),
            }
        }
    }

    #[test]
    fn malformed_toml() {
        match EvolveConfig::from_toml_str("population_size = \"many\"") {
            Err(Error::Toml(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn thread_count_is_never_zero() {
        let config = EvolveConfig { num_threads: Some(0), ..Default::default() };
        assert_eq!(config.num_threads(), 1);
    }
}
