//! Direct fitness: scoring expressions against a labeled dataset.

use super::expr::Expr;
use crate::error::{Error, Result};
use crate::ga::{sort_ranked, Rank, Ranked};
use scoped_threadpool::Pool as ThreadPool;
use std::mem;
use std::sync::mpsc;

/// A single labeled sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub inputs: Vec<i64>,
    pub expected: i64,
}

impl Row {
    pub fn new(inputs: Vec<i64>, expected: i64) -> Self {
        Row { inputs, expected }
    }
}

/// The sum of absolute differences between the expression's output and the expected output of
/// each row.
///
/// `0.0` is a perfect score.
pub fn score(expr: &Expr, dataset: &[Row]) -> Result<f64> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let mut diff = 0.0;
    for row in dataset {
        let v = expr.evaluate(&row.inputs)?;
        diff += (v as i128 - row.expected as i128).abs() as f64;
    }
    Ok(diff)
}

/// Ranks a population of expressions by their `score` against a dataset.
pub struct ScoreRank<'a> {
    dataset: &'a [Row],
    thread_pool: ThreadPool,
}

impl<'a> ScoreRank<'a> {
    /// Score on as many threads as there are CPUs.
    pub fn new(dataset: &'a [Row]) -> Self {
        Self::with_num_threads(dataset, num_cpus::get() as _)
    }

    pub fn with_num_threads(dataset: &'a [Row], num_threads: u32) -> Self {
        ScoreRank {
            dataset,
            thread_pool: ThreadPool::new(num_threads.max(1)),
        }
    }
}

impl<'a> Rank<Expr> for ScoreRank<'a> {
    type Fitness = f64;

    fn rank(&mut self, population: Vec<Expr>) -> Result<Vec<Ranked<Expr, f64>>> {
        if population.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        if self.dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }

        // Score each expression in parallel.
        let dataset = self.dataset;
        let (tx, rx) = mpsc::channel();
        self.thread_pool.scoped(|scoped| {
            for (index, expr) in population.into_iter().enumerate() {
                let tx = tx.clone();
                scoped.execute(move || {
                    let fitness = score(&expr, dataset);
                    tx.send((index, expr, fitness)).unwrap();
                });
            }
        });
        mem::drop(tx);
        let mut scored = rx.iter().collect::<Vec<_>>();
        scored.sort_by_key(|&(index, _, _)| index);

        let mut ranked = scored
            .into_iter()
            .map(|(_, individual, fitness)| Ok(Ranked { fitness: fitness?, individual }))
            .collect::<Result<Vec<_>>>()?;
        sort_ranked(&mut ranked);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::func::OperatorId;

    fn hidden_function(x: i64, y: i64) -> i64 {
        x * x + 2 * y + 3 * x + 5
    }

    #[test]
    fn hidden_function_scenario() {
        assert_eq!(hidden_function(4, 3), 39);
        let dataset = vec![Row::new(vec![4, 3], hidden_function(4, 3))];
        let tree = Expr::operator(OperatorId::Add, vec![Expr::parameter(0), Expr::parameter(1)])
            .unwrap();
        assert_eq!(score(&tree, &dataset).unwrap(), (7i64 - 39).abs() as f64);
        assert_eq!(score(&Expr::constant(39), &dataset).unwrap(), 0.0);
    }

    #[test]
    fn empty_inputs_are_errors() {
        match score(&Expr::constant(1), &[]) {
            Err(Error::EmptyDataset) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        let dataset = vec![Row::new(vec![1], 1)];
        let mut ranker = ScoreRank::with_num_threads(&dataset, 1);
        match ranker.rank(vec![]) {
            Err(Error::EmptyPopulation) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn ranking_is_ascending_and_stable() {
        let dataset = vec![Row::new(vec![2], 10), Row::new(vec![3], 11)];
        let population = vec![
            Expr::constant(0),
            Expr::constant(10),
            Expr::parameter(0),
            Expr::constant(11),
        ];
        let mut ranker = ScoreRank::with_num_threads(&dataset, 3);
        let ranked = ranker.rank(population).unwrap();
        let fitness = ranked.iter().map(|r| r.fitness).collect::<Vec<_>>();
        assert_eq!(fitness, vec![1.0, 1.0, 16.0, 21.0]);
        assert_eq!(ranked[0].individual, Expr::constant(10));
        assert_eq!(ranked[1].individual, Expr::constant(11));
    }

    #[test]
    fn evaluation_errors_are_reported() {
        let dataset = vec![Row::new(vec![2], 10)];
        let mut ranker = ScoreRank::with_num_threads(&dataset, 2);
        match ranker.rank(vec![Expr::constant(1), Expr::parameter(4)]) {
            Err(Error::ParameterIndex { index: 4, len: 1 }) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
