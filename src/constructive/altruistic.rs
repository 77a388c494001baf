//! Round-robin ("altruistic") greedy construction.
//!
//! Instead of fully satisfying one cell before the next, every round hands
//! a single customer to each deficient cell, most deficient first. Coverage
//! therefore grows evenly across destinations while the pool drains, which
//! trades some cost for fairness when the pool is short.
//!
//! Rounds repeat until no cell is deficient, the pool is empty, or a round
//! dispatches nothing (every deficient cell has only its own customers
//! left).
//!
//! # Complexity
//!
//! O(D · g) overall, where D = customers dispatched and g = groups.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument, trace};

use crate::error::DispatchError;
use crate::models::{ProblemInstance, Solution};

use super::greedy::cheapest_group;

/// Builds a solution by dispatching one cheapest customer per deficient
/// cell per round.
///
/// Within a round, cells are served by decreasing deficit; equal deficits
/// keep a random order drawn once per call.
///
/// # Errors
///
/// Returns [`DispatchError`] only if an internal dispatch is rejected,
/// which indicates a bug.
#[instrument(skip_all, fields(n_cells = instance.n_cells()))]
pub fn altruistic_greedy<'a, R: Rng>(
    instance: &'a ProblemInstance,
    rng: &mut R,
) -> Result<Solution<'a>, DispatchError> {
    let mut solution = Solution::new(instance);
    let mut cells: Vec<usize> = (0..instance.n_cells()).collect();
    cells.shuffle(rng);

    let mut rounds = 0usize;
    loop {
        let mut deficient: Vec<usize> = cells
            .iter()
            .copied()
            .filter(|&cell| solution.deficit(cell) > 0)
            .collect();
        if deficient.is_empty() || solution.remaining_customers() == 0 {
            break;
        }
        // Stable sort keeps the shuffled order among equal deficits.
        deficient.sort_by_key(|&cell| std::cmp::Reverse(solution.deficit(cell)));

        let mut progressed = false;
        for cell in deficient {
            if solution.remaining_customers() == 0 {
                break;
            }
            let Some((key, _)) = cheapest_group(&solution, cell) else {
                continue;
            };
            trace!(group = %key, dest = cell, amount = 1, "dispatch");
            solution.dispatch(key, cell, 1)?;
            progressed = true;
        }
        rounds += 1;
        if !progressed {
            break;
        }
    }

    debug!(
        rounds,
        cost = solution.total_cost(),
        remaining = solution.remaining_customers(),
        unmet_cells = solution.unmet_cells(),
        feasibility = %solution.feasibility(),
        "altruistic greedy finished"
    );
    Ok(solution)
}
