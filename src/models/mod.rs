//! Domain model types for time-indexed customer dispatch.
//!
//! Provides the core abstractions: customer groups identified by home cell,
//! type and period, the validated problem instance, and the mutable
//! solution whose counters every heuristic in the crate drives.

mod group;
mod instance;
mod shape;
mod solution;

pub use group::{CustomerGroup, GroupKey};
pub use instance::ProblemInstance;
pub use shape::Shape;
pub use solution::{Assignment, Feasibility, Solution};
