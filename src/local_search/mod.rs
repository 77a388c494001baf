//! Neighbourhood search for improving dispatch solutions.
//!
//! - [`Move`] / [`Neighborhood`]: Single-customer swaps between cells and releases to the pool
//! - [`simulated_annealing`]: Annealing driver with a stepped geometric cooling schedule
//! - [`multi_start_annealing`]: Best of several annealing runs from random-greedy seeds

mod annealing;
mod moves;

pub use annealing::{
    multi_start_annealing, simulated_annealing, AnnealingConfig, AnnealingOutcome, StopReason,
};
pub use moves::{Move, Neighborhood};
