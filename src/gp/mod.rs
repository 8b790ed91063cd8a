//! Common items related to Genetic Programming.
//!
//! Expressions are trees of nodes with some level of arity - aka the number of inputs. Operator
//! nodes apply one of the functions in `func` to their children while parameter and constant
//! nodes form the leaves.
//!
//! - `expr`: the expression tree, its evaluation and random generation.
//! - `func`: the function set.
//! - `variation`: mutation and crossover.
//! - `score`: ranking expressions against a labeled dataset.
//! - `evolve`: the evolutionary search over expressions.

pub mod evolve;
pub mod expr;
pub mod func;
pub mod score;
pub mod variation;

pub use self::evolve::{evolve, Breeder};
pub use self::expr::gen::{random_tree, GenParams};
pub use self::expr::{Expr, Node};
pub use self::func::OperatorId;
pub use self::score::{score, Row, ScoreRank};
pub use self::variation::{crossover, mutate};
