//! Cell-by-cell greedy construction.
//!
//! Visits destination cells in a fixed (or shuffled) order and fully
//! satisfies each one before moving on. For the current cell, the cheapest
//! group by *unit cost* (dispatch cost divided by the type's task
//! throughput) is chosen and just enough of its customers are sent to cover
//! the remaining deficit, or the whole pool if it is too small.
//!
//! # Tie-breaking
//!
//! Groups are scanned in `(source, type, period)` lexicographic order and a
//! group replaces the incumbent only if its unit cost is strictly lower, so
//! ties go to the first group encountered.
//!
//! # Complexity
//!
//! O(n · g) per dispatch, where n = cells and g = groups.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument, trace};

use crate::error::DispatchError;
use crate::models::{GroupKey, ProblemInstance, Solution};

/// Finds the pooled group with the lowest unit cost for `cell`.
///
/// Only groups with customers left in the pool and a home cell other than
/// `cell` are eligible. Returns the group and its unit cost, or `None` if no
/// group is eligible.
pub fn cheapest_group(solution: &Solution<'_>, cell: usize) -> Option<(GroupKey, f64)> {
    let instance = solution.instance();
    let mut best: Option<(GroupKey, f64)> = None;
    for (key, _) in solution.pool() {
        if key.source == cell {
            continue;
        }
        let unit_cost = instance.unit_cost(key, cell);
        match best {
            Some((_, incumbent)) if unit_cost >= incumbent => {}
            _ => best = Some((key, unit_cost)),
        }
    }
    best
}

/// Customers of type `customer_type` needed to cover `deficit` tasks.
pub(crate) fn required_units(instance: &ProblemInstance, customer_type: usize, deficit: u64) -> u64 {
    deficit.div_ceil(u64::from(instance.type_tasks(customer_type)))
}

/// Satisfies one cell as far as the pool allows.
pub(crate) fn fill_cell(solution: &mut Solution<'_>, cell: usize) -> Result<(), DispatchError> {
    let instance = solution.instance();
    while solution.deficit(cell) > 0 && solution.remaining_customers() > 0 {
        let Some((key, _)) = cheapest_group(solution, cell) else {
            break;
        };
        let required = required_units(instance, key.customer_type, solution.deficit(cell));
        let dispatchable = required.min(u64::from(solution.unassigned(key))) as u32;
        trace!(group = %key, dest = cell, amount = dispatchable, "dispatch");
        solution.dispatch(key, cell, dispatchable)?;
    }
    Ok(())
}

/// Builds a solution by satisfying cells in index order.
///
/// Deterministic: repeated calls on the same instance produce identical
/// solutions. The result may be infeasible if the pool cannot cover the
/// demand.
///
/// # Errors
///
/// Returns [`DispatchError`] only if an internal dispatch is rejected,
/// which indicates a bug.
///
/// # Examples
///
/// ```
/// use u_dispatch::constructive::greedy;
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::models::{CustomerGroup, Feasibility, GroupKey, ProblemInstance, Shape};
///
/// let mut costs = CostTensor::new(Shape::new(2, 1, 1));
/// costs.set(0, 1, 0, 0, 5.0);
/// let instance = ProblemInstance::new(vec![2], vec![0, 4], costs, vec![CustomerGroup::new(0, 0, 0, 3)])
///     .unwrap();
///
/// let sol = greedy(&instance).unwrap();
/// assert_eq!(sol.assigned(GroupKey::new(0, 0, 0), 1), 2);
/// assert_eq!(sol.remaining_customers(), 1);
/// assert_eq!(sol.feasibility(), Feasibility::Feasible);
/// ```
pub fn greedy(instance: &ProblemInstance) -> Result<Solution<'_>, DispatchError> {
    let order: Vec<usize> = (0..instance.n_cells()).collect();
    greedy_with_order(instance, &order)
}

/// Builds a solution by satisfying cells in the given order.
///
/// Cells missing from `order` are left untouched.
///
/// # Panics
///
/// Panics if `order` contains a cell index out of range.
#[instrument(skip_all, fields(n_cells = instance.n_cells()))]
pub fn greedy_with_order<'a>(
    instance: &'a ProblemInstance,
    order: &[usize],
) -> Result<Solution<'a>, DispatchError> {
    let mut solution = Solution::new(instance);
    for &cell in order {
        if solution.remaining_customers() == 0 {
            break;
        }
        fill_cell(&mut solution, cell)?;
    }
    debug!(
        cost = solution.total_cost(),
        remaining = solution.remaining_customers(),
        feasibility = %solution.feasibility(),
        "greedy finished"
    );
    Ok(solution)
}

/// Greedy construction over a uniformly shuffled cell order.
///
/// Produces different, still greedy, solutions on each call; used to seed
/// the genetic population and multi-start annealing.
///
/// # Errors
///
/// See [`greedy`].
pub fn random_greedy<'a, R: Rng>(
    instance: &'a ProblemInstance,
    rng: &mut R,
) -> Result<Solution<'a>, DispatchError> {
    let mut order: Vec<usize> = (0..instance.n_cells()).collect();
    order.shuffle(rng);
    greedy_with_order(instance, &order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, Feasibility, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario(pool: u32) -> ProblemInstance {
        let mut costs = CostTensor::new(Shape::new(2, 1, 1));
        costs.set(0, 1, 0, 0, 5.0);
        ProblemInstance::new(vec![2], vec![0, 4], costs, vec![CustomerGroup::new(0, 0, 0, pool)])
            .expect("valid")
    }

    fn competing_types() -> ProblemInstance {
        // Type 1 costs more per customer but is cheaper per task.
        let shape = Shape::new(3, 1, 2);
        let costs = CostTensor::from_fn(shape, |i, j, m, _| {
            if i == j {
                0.0
            } else if m == 0 {
                3.0 + i as f64
            } else {
                8.0 + i as f64
            }
        });
        ProblemInstance::new(
            vec![1, 4],
            vec![0, 0, 6],
            costs,
            vec![
                CustomerGroup::new(0, 0, 0, 10),
                CustomerGroup::new(0, 1, 0, 1),
                CustomerGroup::new(1, 1, 0, 5),
            ],
        )
        .expect("valid")
    }

    #[test]
    fn test_greedy_meets_demand() {
        let inst = scenario(3);
        let sol = greedy(&inst).expect("valid");
        assert_eq!(sol.fulfilled(1), 4);
        assert!((sol.total_cost() - 10.0).abs() < 1e-10);
        assert_eq!(sol.remaining_customers(), 1);
        assert_eq!(sol.feasibility(), Feasibility::Feasible);
    }

    #[test]
    fn test_greedy_exhausts_small_pool() {
        let inst = scenario(1);
        let sol = greedy(&inst).expect("valid");
        assert_eq!(sol.fulfilled(1), 2);
        assert_eq!(sol.remaining_customers(), 0);
        assert_eq!(sol.feasibility(), Feasibility::UnfDemand);
    }

    #[test]
    fn test_greedy_prefers_unit_cost() {
        let inst = competing_types();
        let sol = greedy(&inst).expect("valid");
        // (0,1,0) has unit cost 8/4 = 2, cheaper than (0,0,0) at 3/1.
        assert_eq!(sol.assigned(GroupKey::new(0, 1, 0), 2), 1);
        // Then (1,1,0) at 9/4 for the remaining 2 tasks.
        assert_eq!(sol.assigned(GroupKey::new(1, 1, 0), 2), 1);
        assert_eq!(sol.assigned(GroupKey::new(0, 0, 0), 2), 0);
        assert!((sol.total_cost() - 17.0).abs() < 1e-10);
        assert!(sol.is_feasible());
    }

    #[test]
    fn test_cheapest_group_tie_goes_to_first() {
        let shape = Shape::new(3, 1, 1);
        let costs = CostTensor::from_fn(shape, |i, j, _, _| if i == j { 0.0 } else { 2.0 });
        let inst = ProblemInstance::new(
            vec![1],
            vec![0, 0, 1],
            costs,
            vec![CustomerGroup::new(1, 0, 0, 1), CustomerGroup::new(0, 0, 0, 1)],
        )
        .expect("valid");
        let sol = Solution::new(&inst);
        let (key, unit) = cheapest_group(&sol, 2).expect("eligible group");
        assert_eq!(key, GroupKey::new(0, 0, 0));
        assert!((unit - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_cheapest_group_skips_own_cell() {
        let inst = scenario(3);
        let sol = Solution::new(&inst);
        assert!(cheapest_group(&sol, 0).is_none());
    }

    #[test]
    fn test_greedy_is_deterministic() {
        let inst = competing_types();
        let a = greedy(&inst).expect("valid");
        let b = greedy(&inst).expect("valid");
        assert_eq!(a.counts(), b.counts());
        assert_eq!(a.total_cost().to_bits(), b.total_cost().to_bits());
    }

    #[test]
    fn test_random_greedy_conserves_customers() {
        let inst = competing_types();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let sol = random_greedy(&inst, &mut rng).expect("valid");
            for key in inst.shape().group_keys() {
                assert_eq!(
                    sol.assigned_total(key) + u64::from(sol.unassigned(key)),
                    u64::from(inst.availability(key))
                );
            }
            assert!(sol.is_feasible());
        }
    }

    #[test]
    fn test_greedy_with_partial_order() {
        let shape = Shape::new(3, 1, 1);
        let costs = CostTensor::from_fn(shape, |i, j, _, _| if i == j { 0.0 } else { 1.0 });
        let inst = ProblemInstance::new(
            vec![1],
            vec![0, 2, 2],
            costs,
            vec![CustomerGroup::new(0, 0, 0, 4)],
        )
        .expect("valid");
        let sol = greedy_with_order(&inst, &[2]).expect("valid");
        assert_eq!(sol.fulfilled(2), 2);
        assert_eq!(sol.fulfilled(1), 0);
    }
}
