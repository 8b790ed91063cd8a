//! Evolving expressions.

use super::expr::gen::{self, GenParams};
use super::expr::Expr;
use super::variation::{crossover, mutate};
use crate::config::EvolveConfig;
use crate::error::{Error, Result};
use crate::ga::{self, select_index, Fitness, GeneticOperation, GeneticOperator, Rank, Ranked};
use log::{debug, info};
use rand::Rng;

/// Breeds the offspring of each new generation of expressions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Breeder {
    /// The length of the input vector expressions are evaluated against.
    pub param_count: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub selection_bias: f64,
    pub new_random_rate: f64,
    /// Parameters for entirely new random trees.
    pub tree: GenParams,
}

impl Breeder {
    pub fn new(param_count: usize, config: &EvolveConfig) -> Self {
        Breeder {
            param_count,
            mutation_rate: config.mutation_rate,
            crossover_rate: config.crossover_rate,
            selection_bias: config.selection_bias,
            new_random_rate: config.new_random_rate,
            tree: config.tree,
        }
    }
}

impl<F> GeneticOperator<Expr, F> for Breeder
where
    F: Fitness,
{
    fn generate_individual<R: Rng>(&self, rng: &mut R, op: GeneticOperation<Expr, F>) -> Expr {
        if rng.gen::<f64>() > self.new_random_rate {
            let len = op.population.len();
            let a = &op.population[select_index(rng, self.selection_bias, len)].individual;
            let b = &op.population[select_index(rng, self.selection_bias, len)].individual;
            let child = crossover(rng, a, b, self.crossover_rate);
            mutate(rng, &child, self.param_count, self.mutation_rate)
        } else {
            gen::random_tree(rng, self.param_count, &self.tree)
        }
    }
}

/// Evolve an expression over inputs of length `param_count`.
///
/// A population of `config.population_size` random trees is ranked by `ranker` once per
/// generation. The search stops as soon as the best fitness is optimal or after
/// `config.max_generations` rankings, returning the best individual of the last ranking.
pub fn evolve<R, K>(
    rng: &mut R,
    param_count: usize,
    ranker: &mut K,
    config: &EvolveConfig,
) -> Result<Ranked<Expr, K::Fitness>>
where
    R: Rng,
    K: Rank<Expr>,
{
    config.validate()?;
    let population = (0..config.population_size)
        .map(|_| gen::random_tree(rng, param_count, &config.tree))
        .collect::<Vec<_>>();
    let mut simulation = ga::Simulation::with_num_threads(population, ranker, config.num_threads())?;
    let breeder = Breeder::new(param_count, config);

    loop {
        let best = simulation.best();
        info!("Generation {}: best fitness {:?}", simulation.generation(), best.fitness);
        if best.fitness.is_optimal() {
            info!("Optimal individual found after {} generations", simulation.generation());
            break;
        }
        if simulation.generation() + 1 >= config.max_generations {
            debug!("Generation budget of {} exhausted", config.max_generations);
            break;
        }
        simulation.step(rng, ranker, &breeder)?;
    }

    simulation
        .into_population()
        .into_iter()
        .next()
        .ok_or(Error::EmptyPopulation)
}
