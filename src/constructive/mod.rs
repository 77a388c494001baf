//! Constructive heuristics for building initial dispatch solutions.
//!
//! - [`greedy`]: Cells in index order, cheapest unit cost first, O(D·g)
//! - [`random_greedy`]: Same rule over a shuffled cell order
//! - [`altruistic_greedy`]: One customer per deficient cell per round, most deficient first
//! - [`random_construction`]: Random groups and amounts, a diversity baseline
//!
//! D = dispatch decisions, g = customer groups. All builders start from
//! [`Solution::new`](crate::models::Solution::new) and mutate it only
//! through `dispatch`, so every result satisfies the conservation and cost
//! invariants; feasibility must still be checked by the caller.

mod altruistic;
mod greedy;
mod random;

pub use altruistic::altruistic_greedy;
pub use greedy::{cheapest_group, greedy, greedy_with_order, random_greedy};
pub use random::random_construction;
