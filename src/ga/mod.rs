//! Genetic algorithm over assignment-count grids.
//!
//! - [`AssignmentGrid`]: Genome: dispatch counts over `(source, dest, type, period)`
//! - [`Chromosome`]: Grid plus cost fitness and population rank
//! - [`CrossoverKind`]: One-point, two-point, uniform and roulette recombination
//! - [`GeneticOptimizer`]: Rank selection, elitism and preliminary runs

mod chromosome;
mod config;
mod grid;
mod operators;
mod optimizer;

pub use chromosome::{Chromosome, INFEASIBLE_FITNESS};
pub use config::GaConfig;
pub use grid::AssignmentGrid;
pub use operators::{mutate, one_point_crossover, two_point_crossover, uniform_crossover, CrossoverKind};
pub use optimizer::{GaOutcome, GenerationStats, GeneticOptimizer};
