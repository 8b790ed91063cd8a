//! Evolutionary computation over executable expression trees.
//!
//! - `gp`: expression trees, their variation and the evolutionary search over them.
//! - `ga`: the generic generational loop shared by any kind of individual.
//! - `game`: a competitive grid game and tournament, usable as an adversarial fitness source.

pub mod config;
pub mod error;
pub mod ga;
pub mod game;
pub mod gp;

pub use crate::error::{Error, Result};
