//! Demonstrates using genetic programming to rediscover a hidden function from samples.
//!
//! 1. What is the "Terminal Set"?
//!
//! - The two inputs `x` and `y`.
//! - Random constants in the range 0..=10.
//!
//! 2. What is the "Function Set"?
//!
//! - `add` `subtract` `multiply` `if` `isgreater`
//!
//! 3. What is the "Fitness Measure"?
//!
//! - The sum of absolute differences from the hidden function's output over 200 samples.
//!
//! 4. What is the "Termination Criterion"?
//!
//! - A perfect score OR the generation budget is exhausted.
//!
//! An optional path to a TOML `EvolveConfig` may be given as the first argument.

extern crate ecgp;
extern crate env_logger;
extern crate rand;

use ecgp::config::EvolveConfig;
use ecgp::gp::{self, Row, ScoreRank};
use rand::Rng;

const SAMPLES: usize = 200;
const PARAM_COUNT: usize = 2;

fn hidden_function(x: i64, y: i64) -> i64 {
    x * x + 2 * y + 3 * x + 5
}

fn build_hidden_set<R: Rng>(rng: &mut R) -> Vec<Row> {
    (0..SAMPLES)
        .map(|_| {
            let x = rng.gen_range(0..=40);
            let y = rng.gen_range(0..=40);
            Row::new(vec![x, y], hidden_function(x, y))
        })
        .collect()
}

fn main() -> ecgp::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EvolveConfig::load_from_file(path)?,
        None => EvolveConfig::default(),
    };
    let mut rng = config.rng();

    let dataset = build_hidden_set(&mut rng);
    let mut ranker = ScoreRank::with_num_threads(&dataset, config.num_threads());

    let start = std::time::Instant::now();
    let best = gp::evolve(&mut rng, PARAM_COUNT, &mut ranker, &config)?;
    println!("Total duration: {:?}", start.elapsed());
    println!("Best score: {}", best.fitness);
    println!("{}", best.individual);
    Ok(())
}
