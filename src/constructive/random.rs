//! Random construction baseline.
//!
//! Cells are visited in shuffled order; each deficient cell repeatedly
//! draws a uniformly random eligible group and takes a random share of what
//! it would need from it. Cost plays no role, so the result is a cheap,
//! diverse (and usually poor) reference point for the other heuristics.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use tracing::{debug, instrument, trace};

use crate::error::DispatchError;
use crate::models::{GroupKey, ProblemInstance, Solution};

use super::greedy::required_units;

/// Builds a solution from random dispatch decisions.
///
/// For each cell, with `dispatchable = min(ceil(deficit / type_tasks),
/// pool)`, one customer is sent when `dispatchable == 1`, otherwise a
/// uniform amount in `1..dispatchable`. A cell is abandoned when no group
/// outside it has customers left.
///
/// # Errors
///
/// Returns [`DispatchError`] only if an internal dispatch is rejected,
/// which indicates a bug.
#[instrument(skip_all, fields(n_cells = instance.n_cells()))]
pub fn random_construction<'a, R: Rng>(
    instance: &'a ProblemInstance,
    rng: &mut R,
) -> Result<Solution<'a>, DispatchError> {
    let mut solution = Solution::new(instance);
    let mut cells: Vec<usize> = (0..instance.n_cells()).collect();
    cells.shuffle(rng);

    for cell in cells {
        while solution.deficit(cell) > 0 && solution.remaining_customers() > 0 {
            let eligible: Vec<GroupKey> = solution
                .pool()
                .map(|(key, _)| key)
                .filter(|key| key.source != cell)
                .collect();
            let Some(&key) = eligible.choose(rng) else {
                break;
            };
            let required = required_units(instance, key.customer_type, solution.deficit(cell));
            let dispatchable = required.min(u64::from(solution.unassigned(key))) as u32;
            let amount = if dispatchable == 1 {
                1
            } else {
                rng.random_range(1..dispatchable)
            };
            trace!(group = %key, dest = cell, amount, "dispatch");
            solution.dispatch(key, cell, amount)?;
        }
    }

    debug!(
        cost = solution.total_cost(),
        remaining = solution.remaining_customers(),
        feasibility = %solution.feasibility(),
        "random construction finished"
    );
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, Feasibility, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_instance() -> ProblemInstance {
        let shape = Shape::new(4, 2, 2);
        let costs = CostTensor::from_fn(shape, |i, j, m, t| {
            if i == j {
                0.0
            } else {
                (i * 7 + j * 3 + m + t) as f64
            }
        });
        ProblemInstance::new(
            vec![1, 3],
            vec![5, 0, 9, 4],
            costs,
            vec![
                CustomerGroup::new(0, 1, 0, 4),
                CustomerGroup::new(1, 0, 1, 6),
                CustomerGroup::new(1, 1, 0, 3),
                CustomerGroup::new(3, 0, 0, 5),
            ],
        )
        .expect("valid")
    }

    #[test]
    fn test_random_construction_is_consistent() {
        let inst = grid_instance();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let sol = random_construction(&inst, &mut rng).expect("valid");
            for key in inst.shape().group_keys() {
                assert_eq!(
                    sol.assigned_total(key) + u64::from(sol.unassigned(key)),
                    u64::from(inst.availability(key))
                );
            }
            assert!((sol.total_cost() - sol.recomputed_cost()).abs() < 1e-9);
            assert_ne!(sol.feasibility(), Feasibility::UnfCustomers);
        }
    }

    #[test]
    fn test_random_construction_single_source() {
        let mut costs = CostTensor::new(Shape::new(2, 1, 1));
        costs.set(0, 1, 0, 0, 5.0);
        let inst = ProblemInstance::new(vec![1], vec![0, 3], costs, vec![CustomerGroup::new(0, 0, 0, 10)])
            .expect("valid");
        let mut rng = StdRng::seed_from_u64(5);
        let sol = random_construction(&inst, &mut rng).expect("valid");
        // Never overshoots: each draw takes less than the remaining deficit or exactly one.
        assert_eq!(sol.fulfilled(1), 3);
        assert!(sol.is_feasible());
    }

    #[test]
    fn test_random_construction_reproducible() {
        let inst = grid_instance();
        let a = random_construction(&inst, &mut StdRng::seed_from_u64(42)).expect("valid");
        let b = random_construction(&inst, &mut StdRng::seed_from_u64(42)).expect("valid");
        assert_eq!(a.counts(), b.counts());
    }
}
