//! Mutable assignment state and its feasibility status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, InstanceError};

use super::{GroupKey, ProblemInstance};

/// Feasibility status of a [`Solution`].
///
/// Infeasibility is a status, not an error: every heuristic may legitimately
/// return an infeasible solution when the customer pool cannot cover the
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feasibility {
    /// Every cell's demand is met and no group is over-assigned.
    Feasible,
    /// At least one cell completes fewer tasks than it demands.
    UnfDemand,
    /// At least one group has more customers assigned than it holds.
    UnfCustomers,
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feasibility::Feasible => "FEASIBLE",
            Feasibility::UnfDemand => "UNF_DEMAND",
            Feasibility::UnfCustomers => "UNF_CUSTOMERS",
        };
        f.write_str(s)
    }
}

/// A non-zero entry of a solution: `count` customers of a group sent to
/// `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Home cell.
    pub source: usize,
    /// Destination cell.
    pub dest: usize,
    /// Customer type.
    pub customer_type: usize,
    /// Period.
    pub period: usize,
    /// Number of customers dispatched.
    pub count: u32,
}

impl Assignment {
    /// Group the dispatched customers belong to.
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.source, self.customer_type, self.period)
    }
}

/// A (possibly partial) dispatch plan for a [`ProblemInstance`].
///
/// Tracks, incrementally:
///
/// - how many customers of each group are assigned to each destination;
/// - the unassigned pool of each group, initially the full availability;
/// - the tasks completed at each cell;
/// - the total dispatch cost and the number of customers still unassigned.
///
/// The counters only change through [`dispatch`](Self::dispatch) and
/// [`recall`](Self::recall), which keep them mutually consistent: for every
/// group, assigned plus unassigned equals the original availability, and
/// the completed tasks and cost match the assignments.
///
/// # Examples
///
/// ```
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::models::{CustomerGroup, Feasibility, GroupKey, ProblemInstance, Shape, Solution};
///
/// let mut costs = CostTensor::new(Shape::new(2, 1, 1));
/// costs.set(0, 1, 0, 0, 5.0);
/// let instance = ProblemInstance::new(vec![2], vec![0, 4], costs, vec![CustomerGroup::new(0, 0, 0, 3)])
///     .unwrap();
///
/// let mut sol = Solution::new(&instance);
/// assert_eq!(sol.feasibility(), Feasibility::UnfDemand);
///
/// sol.dispatch(GroupKey::new(0, 0, 0), 1, 2).unwrap();
/// assert_eq!(sol.fulfilled(1), 4);
/// assert!((sol.total_cost() - 10.0).abs() < 1e-10);
/// assert_eq!(sol.feasibility(), Feasibility::Feasible);
/// ```
#[derive(Debug, Clone)]
pub struct Solution<'a> {
    instance: &'a ProblemInstance,
    assigned: Vec<u32>,
    unassigned: Vec<u32>,
    fulfilled: Vec<u64>,
    total_cost: f64,
    remaining_customers: u64,
}

impl<'a> Solution<'a> {
    /// Creates an empty solution: nothing dispatched, every pool full.
    pub fn new(instance: &'a ProblemInstance) -> Self {
        let shape = instance.shape();
        Self {
            instance,
            assigned: vec![0; shape.num_assignments()],
            unassigned: instance.availability_slice().to_vec(),
            fulfilled: vec![0; shape.n_cells()],
            total_cost: 0.0,
            remaining_customers: instance.total_customers(),
        }
    }

    /// Builds a solution from raw assignment counts laid out as
    /// [`Shape::assignment_index`](super::Shape::assignment_index).
    ///
    /// Unlike [`dispatch`](Self::dispatch), the counts are not checked
    /// against availability: an over-assigned group yields an empty pool and
    /// a [`Feasibility::UnfCustomers`] status.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::LengthMismatch`] if the length does not
    /// match the instance.
    pub fn from_counts(instance: &'a ProblemInstance, counts: Vec<u32>) -> Result<Self, InstanceError> {
        let shape = instance.shape();
        if counts.len() != shape.num_assignments() {
            return Err(InstanceError::LengthMismatch {
                what: "assignment counts",
                expected: shape.num_assignments(),
                actual: counts.len(),
            });
        }

        let mut assigned_totals = vec![0u64; shape.num_groups()];
        let mut fulfilled = vec![0u64; shape.n_cells()];
        let mut total_cost = 0.0;
        for (index, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let (key, dest) = shape.assignment_key(index);
            assigned_totals[shape.group_index(key)] += u64::from(count);
            fulfilled[dest] += u64::from(instance.type_tasks(key.customer_type)) * u64::from(count);
            total_cost += instance.cost(key, dest) * f64::from(count);
        }

        let unassigned: Vec<u32> = instance
            .availability_slice()
            .iter()
            .zip(&assigned_totals)
            .map(|(&avail, &used)| u64::from(avail).saturating_sub(used) as u32)
            .collect();
        let remaining_customers = unassigned.iter().map(|&c| u64::from(c)).sum();

        Ok(Self {
            instance,
            assigned: counts,
            unassigned,
            fulfilled,
            total_cost,
            remaining_customers,
        })
    }

    /// The instance this solution belongs to.
    pub fn instance(&self) -> &'a ProblemInstance {
        self.instance
    }

    /// Moves `amount` customers of group `key` from the unassigned pool to
    /// `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the indices are out of range, `amount`
    /// is zero, `dest` is the group's own cell, or the pool holds fewer than
    /// `amount` customers. The solution is left untouched on error.
    pub fn dispatch(&mut self, key: GroupKey, dest: usize, amount: u32) -> Result<(), DispatchError> {
        let shape = self.instance.shape();
        if !shape.contains(key) || dest >= shape.n_cells() {
            return Err(DispatchError::OutOfRange { key, dest });
        }
        if amount == 0 {
            return Err(DispatchError::ZeroAmount { key, dest });
        }
        if key.source == dest {
            return Err(DispatchError::SelfDispatch { key });
        }
        let group = shape.group_index(key);
        let available = self.unassigned[group];
        if amount > available {
            return Err(DispatchError::InsufficientPool {
                key,
                requested: amount,
                available,
            });
        }

        self.unassigned[group] -= amount;
        self.assigned[shape.assignment_index(key, dest)] += amount;
        self.fulfilled[dest] += u64::from(self.instance.type_tasks(key.customer_type)) * u64::from(amount);
        self.total_cost += self.instance.cost(key, dest) * f64::from(amount);
        self.remaining_customers -= u64::from(amount);
        Ok(())
    }

    /// Returns `amount` customers of group `key` from `dest` to the
    /// unassigned pool. Inverse of [`dispatch`](Self::dispatch).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the indices are out of range, `amount`
    /// is zero, or fewer than `amount` customers of the group serve `dest`.
    pub fn recall(&mut self, key: GroupKey, dest: usize, amount: u32) -> Result<(), DispatchError> {
        let shape = self.instance.shape();
        if !shape.contains(key) || dest >= shape.n_cells() {
            return Err(DispatchError::OutOfRange { key, dest });
        }
        if amount == 0 {
            return Err(DispatchError::ZeroAmount { key, dest });
        }
        let slot = shape.assignment_index(key, dest);
        let assigned = self.assigned[slot];
        if amount > assigned {
            return Err(DispatchError::InsufficientAssigned {
                key,
                dest,
                requested: amount,
                assigned,
            });
        }

        self.assigned[slot] -= amount;
        self.unassigned[shape.group_index(key)] += amount;
        self.fulfilled[dest] -= u64::from(self.instance.type_tasks(key.customer_type)) * u64::from(amount);
        self.total_cost -= self.instance.cost(key, dest) * f64::from(amount);
        self.remaining_customers += u64::from(amount);
        Ok(())
    }

    /// Checks the demand of every cell first, then the availability of
    /// every group.
    pub fn feasibility(&self) -> Feasibility {
        let demand_met = self
            .fulfilled
            .iter()
            .zip(self.instance.demands())
            .all(|(&done, &todo)| done >= u64::from(todo));
        if !demand_met {
            return Feasibility::UnfDemand;
        }

        let over_assigned = self
            .instance
            .shape()
            .group_keys()
            .any(|key| self.assigned_total(key) > u64::from(self.instance.availability(key)));
        if over_assigned {
            return Feasibility::UnfCustomers;
        }

        Feasibility::Feasible
    }

    /// Shorthand for `feasibility() == Feasibility::Feasible`.
    pub fn is_feasible(&self) -> bool {
        self.feasibility() == Feasibility::Feasible
    }

    /// Incrementally maintained total dispatch cost.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Total dispatch cost recomputed from the assignment counts.
    pub fn recomputed_cost(&self) -> f64 {
        let shape = self.instance.shape();
        self.assigned
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(index, &count)| {
                let (key, dest) = shape.assignment_key(index);
                self.instance.cost(key, dest) * f64::from(count)
            })
            .sum()
    }

    /// Number of customers still in the unassigned pools.
    pub fn remaining_customers(&self) -> u64 {
        self.remaining_customers
    }

    /// Tasks completed at `cell`.
    pub fn fulfilled(&self, cell: usize) -> u64 {
        self.fulfilled[cell]
    }

    /// Tasks still missing at `cell` (zero when satisfied).
    pub fn deficit(&self, cell: usize) -> u64 {
        u64::from(self.instance.tasks_to_do(cell)).saturating_sub(self.fulfilled[cell])
    }

    /// Number of cells whose demand is not yet met.
    pub fn unmet_cells(&self) -> usize {
        (0..self.instance.n_cells())
            .filter(|&cell| self.deficit(cell) > 0)
            .count()
    }

    /// Customers of group `key` currently serving `dest`.
    pub fn assigned(&self, key: GroupKey, dest: usize) -> u32 {
        self.assigned[self.instance.shape().assignment_index(key, dest)]
    }

    /// Customers of group `key` serving any destination.
    pub fn assigned_total(&self, key: GroupKey) -> u64 {
        (0..self.instance.n_cells())
            .map(|dest| u64::from(self.assigned(key, dest)))
            .sum()
    }

    /// Customers of group `key` still unassigned.
    pub fn unassigned(&self, key: GroupKey) -> u32 {
        self.unassigned[self.instance.shape().group_index(key)]
    }

    /// Raw assignment counts, laid out as
    /// [`Shape::assignment_index`](super::Shape::assignment_index).
    pub fn counts(&self) -> &[u32] {
        &self.assigned
    }

    /// Groups currently serving `dest`, with their counts.
    pub fn serving(&self, dest: usize) -> impl Iterator<Item = (GroupKey, u32)> + '_ {
        let shape = self.instance.shape();
        shape
            .group_keys()
            .map(move |key| (key, self.assigned[shape.assignment_index(key, dest)]))
            .filter(|(_, count)| *count > 0)
    }

    /// Groups with customers left in the unassigned pool, with pool sizes.
    pub fn pool(&self) -> impl Iterator<Item = (GroupKey, u32)> + '_ {
        let shape = self.instance.shape();
        self.unassigned
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(move |(index, &count)| (shape.group_key(index), count))
    }

    /// Non-zero assignments ordered by destination, then source, type and
    /// period.
    pub fn assignments(&self) -> Vec<Assignment> {
        let shape = self.instance.shape();
        let mut out = Vec::new();
        for dest in 0..shape.n_cells() {
            for key in shape.group_keys() {
                let count = self.assigned[shape.assignment_index(key, dest)];
                if count > 0 {
                    out.push(Assignment {
                        source: key.source,
                        dest,
                        customer_type: key.customer_type,
                        period: key.period,
                        count,
                    });
                }
            }
        }
        out
    }
}

impl fmt::Display for Solution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in self.assignments() {
            writeln!(
                f,
                "({}, {}, {}, {}) : {}",
                a.source, a.dest, a.customer_type, a.period, a.count
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, Shape};

    fn three_cell_instance() -> ProblemInstance {
        let shape = Shape::new(3, 1, 2);
        let costs = CostTensor::from_fn(shape, |i, j, m, _| {
            if i == j {
                0.0
            } else {
                (i + j) as f64 + m as f64 * 0.5
            }
        });
        ProblemInstance::new(
            vec![1, 3],
            vec![2, 3, 0],
            costs,
            vec![
                CustomerGroup::new(0, 0, 0, 4),
                CustomerGroup::new(1, 1, 0, 2),
                CustomerGroup::new(2, 0, 0, 3),
            ],
        )
        .expect("valid")
    }

    fn assert_consistent(sol: &Solution<'_>) {
        let inst = sol.instance();
        for key in inst.shape().group_keys() {
            assert_eq!(
                sol.assigned_total(key) + u64::from(sol.unassigned(key)),
                u64::from(inst.availability(key))
            );
        }
        for cell in 0..inst.n_cells() {
            let expected: u64 = inst
                .shape()
                .group_keys()
                .map(|k| u64::from(inst.type_tasks(k.customer_type)) * u64::from(sol.assigned(k, cell)))
                .sum();
            assert_eq!(sol.fulfilled(cell), expected);
        }
        assert!((sol.total_cost() - sol.recomputed_cost()).abs() < 1e-9);
    }

    #[test]
    fn test_new_solution_is_empty() {
        let inst = three_cell_instance();
        let sol = Solution::new(&inst);
        assert_eq!(sol.total_cost(), 0.0);
        assert_eq!(sol.remaining_customers(), 9);
        assert_eq!(sol.unassigned(GroupKey::new(0, 0, 0)), 4);
        assert_eq!(sol.unmet_cells(), 2);
        assert_eq!(sol.feasibility(), Feasibility::UnfDemand);
        assert!(sol.assignments().is_empty());
        assert_consistent(&sol);
    }

    #[test]
    fn test_dispatch_updates_counters() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        sol.dispatch(GroupKey::new(1, 1, 0), 0, 1).expect("valid");
        assert_eq!(sol.fulfilled(0), 3);
        assert_eq!(sol.remaining_customers(), 8);
        assert!((sol.total_cost() - 1.5).abs() < 1e-10);
        assert_consistent(&sol);
    }

    #[test]
    fn test_dispatch_rejects_invalid() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        let key = GroupKey::new(0, 0, 0);
        assert!(matches!(sol.dispatch(key, 1, 0), Err(DispatchError::ZeroAmount { .. })));
        assert!(matches!(sol.dispatch(key, 0, 1), Err(DispatchError::SelfDispatch { .. })));
        assert!(matches!(
            sol.dispatch(key, 1, 5),
            Err(DispatchError::InsufficientPool { requested: 5, available: 4, .. })
        ));
        assert!(matches!(sol.dispatch(key, 7, 1), Err(DispatchError::OutOfRange { .. })));
        assert!(matches!(
            sol.dispatch(GroupKey::new(0, 2, 0), 1, 1),
            Err(DispatchError::OutOfRange { .. })
        ));
        assert_eq!(sol.remaining_customers(), 9);
        assert_consistent(&sol);
    }

    #[test]
    fn test_recall_is_inverse_of_dispatch() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        let key = GroupKey::new(2, 0, 0);
        sol.dispatch(key, 1, 3).expect("valid");
        sol.recall(key, 1, 2).expect("valid");
        assert_eq!(sol.assigned(key, 1), 1);
        assert_eq!(sol.unassigned(key), 2);
        assert_consistent(&sol);
        assert!(matches!(
            sol.recall(key, 1, 2),
            Err(DispatchError::InsufficientAssigned { requested: 2, assigned: 1, .. })
        ));
    }

    #[test]
    fn test_feasible_when_demand_met() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        sol.dispatch(GroupKey::new(2, 0, 0), 0, 2).expect("valid");
        sol.dispatch(GroupKey::new(0, 0, 0), 1, 3).expect("valid");
        assert_eq!(sol.feasibility(), Feasibility::Feasible);
        assert!(sol.is_feasible());
        assert_eq!(sol.deficit(1), 0);
    }

    #[test]
    fn test_from_counts_detects_over_assignment() {
        let inst = three_cell_instance();
        let shape = inst.shape();
        let mut counts = vec![0u32; shape.num_assignments()];
        counts[shape.assignment_index(GroupKey::new(2, 0, 0), 0)] = 2;
        counts[shape.assignment_index(GroupKey::new(0, 0, 0), 1)] = 6;
        let sol = Solution::from_counts(&inst, counts).expect("valid length");
        assert_eq!(sol.feasibility(), Feasibility::UnfCustomers);
        assert_eq!(sol.unassigned(GroupKey::new(0, 0, 0)), 0);
        assert!((sol.total_cost() - sol.recomputed_cost()).abs() < 1e-9);
    }

    #[test]
    fn test_from_counts_rejects_wrong_length() {
        let inst = three_cell_instance();
        let err = Solution::from_counts(&inst, vec![0; 3]).expect_err("short counts");
        assert!(matches!(err, InstanceError::LengthMismatch { expected: 18, actual: 3, .. }));
    }

    #[test]
    fn test_assignments_ordered_by_destination() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        sol.dispatch(GroupKey::new(0, 0, 0), 1, 1).expect("valid");
        sol.dispatch(GroupKey::new(2, 0, 0), 0, 2).expect("valid");
        sol.dispatch(GroupKey::new(1, 1, 0), 0, 1).expect("valid");
        let dests: Vec<usize> = sol.assignments().iter().map(|a| a.dest).collect();
        assert_eq!(dests, vec![0, 0, 1]);
        let first = sol.assignments()[0];
        assert_eq!(first.key(), GroupKey::new(1, 1, 0));
        let text = sol.to_string();
        assert_eq!(text.lines().next(), Some("(1, 0, 1, 0) : 1"));
    }

    #[test]
    fn test_serving_and_pool() {
        let inst = three_cell_instance();
        let mut sol = Solution::new(&inst);
        sol.dispatch(GroupKey::new(0, 0, 0), 1, 3).expect("valid");
        let serving: Vec<(GroupKey, u32)> = sol.serving(1).collect();
        assert_eq!(serving, vec![(GroupKey::new(0, 0, 0), 3)]);
        let pool: Vec<(GroupKey, u32)> = sol.pool().collect();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0], (GroupKey::new(0, 0, 0), 1));
    }

    #[test]
    fn test_feasibility_display() {
        assert_eq!(Feasibility::Feasible.to_string(), "FEASIBLE");
        assert_eq!(Feasibility::UnfDemand.to_string(), "UNF_DEMAND");
        assert_eq!(Feasibility::UnfCustomers.to_string(), "UNF_CUSTOMERS");
    }
}
