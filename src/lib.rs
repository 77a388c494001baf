//! # u-dispatch
//!
//! Mobile-workforce dispatch optimization: decide how many customers of each
//! (source cell, type, period) group to send to each cell so that every
//! cell's task demand is covered at minimum total cost.
//!
//! ## Modules
//!
//! - [`models`]: instance data, index shapes, and the mutable [`Solution`](models::Solution)
//! - [`cost`]: dense per-customer dispatch cost tensor
//! - [`error`]: error types of every fallible operation
//! - [`constructive`]: greedy, random greedy, altruistic and random construction
//! - [`local_search`]: swap/release neighbourhood and simulated annealing
//! - [`ga`]: genetic algorithm over assignment grids
//! - [`io`]: instance text format and optimality gaps
//! - [`solver`]: one-call facade with seeded strategies

pub mod constructive;
pub mod cost;
pub mod error;
pub mod ga;
pub mod io;
pub mod local_search;
pub mod models;
pub mod solver;
