//! A module for abstracting common processes related to Genetic Algorithms.
//!
//! # Genetic Algorithms
//!
//! The genetic algorithm process can be described as follows:
//!
//! 1. Initialise a *Population* of *Individual*s.
//! 2. *Rank* the population, best first.
//! 3. If the terminal condition is met, we're done.
//! 4. Carry the elite over unchanged and fill the rest of the new generation via some
//!    **GeneticOperator** (e.g. Mutation, Crossover and Selection).
//! 5. GOTO 2.
//!
//! Fitness is treated as a cost throughout: lower is better and the optimum is reached once an
//! individual's fitness is zero.

use crate::error::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use scoped_threadpool::Pool as ThreadPool;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::sync::mpsc;

/// The number of best ranked individuals carried unchanged into each new generation.
pub const ELITE_COUNT: usize = 2;

// Traits.

/// Types representing a measurement of fitness, where lower is better.
pub trait Fitness: Send + Sync + PartialOrd + Copy + fmt::Debug {
    /// Whether this fitness is the best achievable, terminating the search.
    fn is_optimal(&self) -> bool;
}

/// Produces a ranking of a whole population, ordered best first.
///
/// The whole population is ranked at once, allowing individuals to be scored against one
/// another.
pub trait Rank<I> {
    /// The measurement of fitness.
    type Fitness: Fitness;
    /// Rank the given population, returning every individual paired with its fitness in
    /// ascending order of fitness.
    fn rank(&mut self, population: Vec<I>) -> Result<Vec<Ranked<I, Self::Fitness>>>;
}

/// An operator used to guide the algorithm towards a solution.
///
/// Specifically, a genetic operator is responsible for generating individuals for the new
/// generation's population.
pub trait GeneticOperator<I, F>: Sync {
    /// Generate a new individual.
    fn generate_individual<R: Rng>(&self, rng: &mut R, op: GeneticOperation<I, F>) -> I;
}

// Model.

/// An individual paired with its fitness.
#[derive(Clone, Debug, PartialEq)]
pub struct Ranked<I, F> {
    pub fitness: F,
    pub individual: I,
}

/// The simulation in which the genetic algorithm is run.
pub struct Simulation<I, F> {
    thread_pool: ThreadPool,
    // Stores the population alongside their fitness, best first.
    population: Vec<Ranked<I, F>>,
    // The number of generations bred since the initial population.
    generation: usize,
}

/// The context provided for a genetic operator to create a new individual.
#[derive(Debug)]
pub struct GeneticOperation<'a, I, F>
where
    I: 'a,
    F: 'a,
{
    /// The previous population along with the fitness for each individual, best first.
    pub population: &'a [Ranked<I, F>],
    /// The index of the newly generated individual within the `population` being generated.
    pub index: usize,
}

// Impls.

impl<'a, I, F> Clone for GeneticOperation<'a, I, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, I, F> Copy for GeneticOperation<'a, I, F> {}

impl<I, F> Simulation<I, F>
where
    I: Clone + Send + Sync,
    F: Fitness,
{
    /// Initialise the simulation with the initial state of the population.
    pub fn new<Is, K>(individuals: Is, ranker: &mut K) -> Result<Self>
    where
        Is: IntoIterator<Item = I>,
        K: Rank<I, Fitness = F>,
    {
        Self::with_num_threads(individuals, ranker, num_cpus::get() as _)
    }

    /// Initialise the simulation with the initial state of the population.
    ///
    /// Also allows for specifying the number of threads used to generate offspring.
    pub fn with_num_threads<Is, K>(individuals: Is, ranker: &mut K, num_threads: u32) -> Result<Self>
    where
        Is: IntoIterator<Item = I>,
        K: Rank<I, Fitness = F>,
    {
        let thread_pool = ThreadPool::new(num_threads.max(1));
        let population = ranker.rank(individuals.into_iter().collect())?;
        check_population(&population)?;
        Ok(Simulation {
            thread_pool,
            population,
            generation: 0,
        })
    }

    /// Step forward the simulation by a single generation.
    ///
    /// The `ELITE_COUNT` best individuals are carried over unchanged while every other slot is
    /// filled by the `genetic_operator`. Each slot is generated with its own `XorShiftRng`, seeded
    /// in slot order from `rng`, so that results do not depend on the number of threads.
    pub fn step<R, K, G>(&mut self, rng: &mut R, ranker: &mut K, genetic_operator: &G) -> Result<()>
    where
        R: Rng,
        K: Rank<I, Fitness = F>,
        G: GeneticOperator<I, F>,
    {
        let Simulation {
            ref mut thread_pool,
            ref mut population,
            ref mut generation,
        } = *self;
        let size = population.len();

        // 1. Carry over the elite.
        let mut new_population = Vec::with_capacity(size);
        new_population.extend(
            population
                .iter()
                .take(ELITE_COUNT)
                .map(|ranked| ranked.individual.clone()),
        );

        // 2. Generate the rest of the new population.
        let (tx, rx) = mpsc::channel();
        thread_pool.scoped(|scoped| {
            let population = &population[..];
            for index in ELITE_COUNT..size {
                let mut rng = XorShiftRng::from_seed(rng.gen());
                let tx = tx.clone();
                scoped.execute(move || {
                    let op = GeneticOperation { population, index };
                    let new = genetic_operator.generate_individual(&mut rng, op);
                    tx.send((index, new)).unwrap();
                });
            }
        });
        mem::drop(tx);
        let mut offspring = rx.iter().collect::<Vec<_>>();
        offspring.sort_by_key(|&(index, _)| index);
        new_population.extend(offspring.into_iter().map(|(_, indv)| indv));

        // 3. Rank the new population.
        let ranked = ranker.rank(new_population)?;
        check_population(&ranked)?;
        *population = ranked;
        *generation += 1;
        Ok(())
    }

    /// View the current generation's population and their fitness.
    ///
    /// This slice will always be sorted by its fitness, best first.
    pub fn population(&self) -> &[Ranked<I, F>] {
        &self.population
    }

    /// The number of generations bred since the initial population.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The individual with the best fitness.
    pub fn best(&self) -> &Ranked<I, F> {
        self.population()
            .first()
            .expect("must be at least one individual")
    }

    /// Consume the simulation, producing the ranked population.
    pub fn into_population(self) -> Vec<Ranked<I, F>> {
        self.population
    }
}

/// Choose an index into a ranking of `len` individuals, biased towards the best ranked.
///
/// The index is `floor(ln(u) / ln(bias))` for `u` uniform in `[0, 1)`. A `bias` closer to `1`
/// flattens the distribution while one closer to `0` concentrates it on the first entries.
/// Indices beyond the end of the ranking are clamped to the last entry.
pub fn select_index<R>(rng: &mut R, bias: f64, len: usize) -> usize
where
    R: Rng,
{
    let u: f64 = rng.gen();
    // Float to int casts saturate, so `u == 0.0` yields `usize::MAX` before clamping.
    let index = (u.ln() / bias.ln()).floor() as usize;
    index.min(len.saturating_sub(1))
}

/// Sort the ranking in ascending order of fitness, keeping the existing order among ties.
pub fn sort_ranked<I, F>(ranked: &mut [Ranked<I, F>])
where
    F: Fitness,
{
    ranked.sort_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal));
}

fn check_population<I, F>(population: &[Ranked<I, F>]) -> Result<()> {
    match population.len() {
        0 => Err(Error::EmptyPopulation),
        size if size < ELITE_COUNT => Err(Error::PopulationTooSmall {
            size,
            required: ELITE_COUNT,
        }),
        _ => Ok(()),
    }
}

// Rank

impl<I, F, Fit> Rank<I> for F
where
    F: FnMut(Vec<I>) -> Result<Vec<Ranked<I, Fit>>>,
    Fit: Fitness,
{
    type Fitness = Fit;
    fn rank(&mut self, population: Vec<I>) -> Result<Vec<Ranked<I, Fit>>> {
        (*self)(population)
    }
}

// Fitness

macro_rules! impl_fitness_for_numbers {
    ($($t:ty),*) => {
        $(
            impl Fitness for $t {
                fn is_optimal(&self) -> bool {
                    *self == 0 as $t
                }
            }
        )*
    };
}

impl_fitness_for_numbers!(f32, f64, u8, u16, u32, u64, usize, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    // An individual is a number, its fitness the distance from zero.
    fn rank_abs(population: Vec<i64>) -> Result<Vec<Ranked<i64, u64>>> {
        let mut ranked = population
            .into_iter()
            .map(|individual| Ranked { fitness: individual.unsigned_abs(), individual })
            .collect::<Vec<_>>();
        sort_ranked(&mut ranked);
        Ok(ranked)
    }

    struct Nudge;

    impl GeneticOperator<i64, u64> for Nudge {
        fn generate_individual<R: Rng>(&self, rng: &mut R, op: GeneticOperation<i64, u64>) -> i64 {
            let parent = op.population[select_index(rng, 0.7, op.population.len())].individual;
            parent + rng.gen_range(-3..=3)
        }
    }

    #[test]
    fn elite_survive_and_best_never_regresses() {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let initial = (0..20).map(|_| rng.gen_range(-1000..1000)).collect::<Vec<i64>>();
        let mut ranker = rank_abs;
        let mut sim = Simulation::with_num_threads(initial, &mut ranker, 2).unwrap();
        for _ in 0..30 {
            let best = sim.best().fitness;
            let elite = sim.population()[..ELITE_COUNT]
                .iter()
                .map(|r| r.individual)
                .collect::<Vec<_>>();
            sim.step(&mut rng, &mut ranker, &Nudge).unwrap();
            assert!(sim.best().fitness <= best);
            assert_eq!(sim.population().len(), 20);
            for e in elite {
                assert!(sim.population().iter().any(|r| r.individual == e));
            }
        }
        assert_eq!(sim.generation(), 30);
    }

    #[test]
    fn results_do_not_depend_on_thread_count() {
        let run = |num_threads| {
            let mut rng = XorShiftRng::seed_from_u64(42);
            let initial = (0..16).map(|i| i * 37 - 200).collect::<Vec<i64>>();
            let mut ranker = rank_abs;
            let mut sim = Simulation::with_num_threads(initial, &mut ranker, num_threads).unwrap();
            for _ in 0..10 {
                sim.step(&mut rng, &mut ranker, &Nudge).unwrap();
            }
            sim.into_population()
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn degenerate_populations_are_rejected() {
        let mut ranker = rank_abs;
        match Simulation::with_num_threads(Vec::<i64>::new(), &mut ranker, 1) {
            Err(Error::EmptyPopulation) => (),
            other => panic!("unexpected result: {:?}", other.map(|s| s.into_population())),
        }
        match Simulation::with_num_threads(vec![5i64], &mut ranker, 1) {
            Err(Error::PopulationTooSmall { size: 1, required: 2 }) => (),
            other => panic!("unexpected result: {:?}", other.map(|s| s.into_population())),
        }
    }

    #[test]
    fn selection_is_clamped_and_biased() {
        let mut rng = XorShiftRng::seed_from_u64(9);
        let mut counts = [0usize; 5];
        for _ in 0..10_000 {
            let index = select_index(&mut rng, 0.7, 5);
            counts[index] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[2]);
        // Everything beyond the end lands on the last entry.
        assert!(counts[4] > counts[3]);
    }

    #[test]
    fn selection_of_a_single_entry() {
        let mut rng = XorShiftRng::seed_from_u64(10);
        for _ in 0..100 {
            assert_eq!(select_index(&mut rng, 0.01, 1), 0);
        }
    }

    #[test]
    fn sorting_is_stable() {
        let mut ranked = vec![
            Ranked { fitness: 2.0, individual: 'a' },
            Ranked { fitness: 1.0, individual: 'b' },
            Ranked { fitness: 2.0, individual: 'c' },
        ];
        sort_ranked(&mut ranked);
        let order = ranked.iter().map(|r| r.individual).collect::<String>();
        assert_eq!(order, "bac");
    }
}
