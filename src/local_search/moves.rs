//! Single-customer exchange moves and neighbourhood generation.
//!
//! # Move kinds
//!
//! - **Swap** `(i, j)`: one customer serving `i` moves to `j` while one
//!   customer serving `j` moves to `i`.
//! - **Release** `(i, pool)`: one customer serving `i` returns to the
//!   unassigned pool; if `i` would fall short of its demand, a pooled
//!   customer takes its place.
//!
//! The outgoing customer is always the most expensive one serving `i`. The
//! incoming one is the candidate giving the lowest resulting cost among
//! those that keep both cells at least as satisfied as before (a cell
//! already at or above demand may not drop below it; a cell below demand
//! may not lose tasks).
//!
//! Resulting costs are computed incrementally from the current total.
//!
//! # Complexity
//!
//! O(n² · g) per generation, where n = cells and g = groups.

use crate::error::DispatchError;
use crate::models::{GroupKey, Solution};

/// A candidate single-step modification of a [`Solution`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    /// Cell losing `group_out`.
    pub origin: usize,
    /// Cell receiving `group_out`, or `None` to return it to the pool.
    pub dest: Option<usize>,
    /// Group of the customer leaving `origin`.
    pub group_out: GroupKey,
    /// Group of the customer entering `origin`: drawn from `dest` for a
    /// swap, from the pool for a release, or `None` for a plain release.
    pub group_in: Option<GroupKey>,
    /// Total cost of the solution after the move.
    pub resulting_cost: f64,
}

impl Move {
    /// Applies the move through `recall` and `dispatch`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the move was generated for a different
    /// state of the solution.
    pub fn apply(&self, solution: &mut Solution<'_>) -> Result<(), DispatchError> {
        solution.recall(self.group_out, self.origin, 1)?;
        match self.dest {
            Some(dest) => {
                solution.dispatch(self.group_out, dest, 1)?;
                if let Some(group_in) = self.group_in {
                    solution.recall(group_in, dest, 1)?;
                    solution.dispatch(group_in, self.origin, 1)?;
                }
            }
            None => {
                if let Some(group_in) = self.group_in {
                    solution.dispatch(group_in, self.origin, 1)?;
                }
            }
        }
        Ok(())
    }

    /// Cost change the move causes, negative for an improvement.
    pub fn delta(&self, current_cost: f64) -> f64 {
        self.resulting_cost - current_cost
    }
}

/// All candidate moves from one solution state.
///
/// Any mutation of the solution invalidates the neighbourhood; regenerate
/// it after applying a move.
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    moves: Vec<Move>,
}

impl Neighborhood {
    /// Generates one swap per ordered pair of distinct cells with positive
    /// demand and one release per cell with positive demand, skipping pairs
    /// for which no valid exchange exists.
    pub fn generate(solution: &Solution<'_>) -> Self {
        let instance = solution.instance();
        let n = instance.n_cells();
        let serving: Vec<Vec<GroupKey>> = (0..n)
            .map(|cell| solution.serving(cell).map(|(key, _)| key).collect())
            .collect();

        let mut moves = Vec::new();
        for origin in 0..n {
            if instance.tasks_to_do(origin) == 0 || serving[origin].is_empty() {
                continue;
            }
            for dest in 0..n {
                if dest == origin || instance.tasks_to_do(dest) == 0 {
                    continue;
                }
                if let Some(mv) = swap_move(solution, &serving, origin, dest) {
                    moves.push(mv);
                }
            }
            if let Some(mv) = release_move(solution, &serving[origin], origin) {
                moves.push(mv);
            }
        }
        Self { moves }
    }

    /// Number of moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` if no move exists.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The moves, in generation order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Move at `index`.
    pub fn get(&self, index: usize) -> Option<&Move> {
        self.moves.get(index)
    }

    /// Mean resulting cost over all moves, or `None` if empty.
    pub fn average_cost(&self) -> Option<f64> {
        if self.moves.is_empty() {
            return None;
        }
        let sum: f64 = self.moves.iter().map(|m| m.resulting_cost).sum();
        Some(sum / self.moves.len() as f64)
    }

    /// Move with the lowest resulting cost (first on ties).
    pub fn best(&self) -> Option<&Move> {
        self.moves.iter().fold(None, |best: Option<&Move>, m| match best {
            Some(b) if b.resulting_cost <= m.resulting_cost => Some(b),
            _ => Some(m),
        })
    }
}

/// Whether a cell stays acceptably satisfied after its completed tasks
/// change from `before` to `after`.
fn keeps_demand(demand: u64, before: u64, after: u64) -> bool {
    after >= demand.min(before)
}

/// Most expensive group serving `cell`, ignoring groups homed at `exclude`.
fn most_expensive(solution: &Solution<'_>, serving: &[GroupKey], cell: usize, exclude: Option<usize>) -> Option<GroupKey> {
    let instance = solution.instance();
    let mut best: Option<(GroupKey, f64)> = None;
    for &key in serving {
        if Some(key.source) == exclude {
            continue;
        }
        let cost = instance.cost(key, cell);
        match best {
            Some((_, incumbent)) if cost <= incumbent => {}
            _ => best = Some((key, cost)),
        }
    }
    best.map(|(key, _)| key)
}

fn swap_move(solution: &Solution<'_>, serving: &[Vec<GroupKey>], origin: usize, dest: usize) -> Option<Move> {
    let instance = solution.instance();
    let out = most_expensive(solution, &serving[origin], origin, Some(dest))?;
    let out_tasks = u64::from(instance.type_tasks(out.customer_type));
    let base = solution.total_cost() - instance.cost(out, origin) + instance.cost(out, dest);

    let origin_demand = u64::from(instance.tasks_to_do(origin));
    let dest_demand = u64::from(instance.tasks_to_do(dest));
    let origin_done = solution.fulfilled(origin);
    let dest_done = solution.fulfilled(dest);

    let mut best: Option<(GroupKey, f64)> = None;
    for &candidate in &serving[dest] {
        if candidate.source == origin || candidate == out {
            continue;
        }
        let in_tasks = u64::from(instance.type_tasks(candidate.customer_type));
        let origin_after = origin_done - out_tasks + in_tasks;
        let dest_after = dest_done + out_tasks - in_tasks;
        if !keeps_demand(origin_demand, origin_done, origin_after)
            || !keeps_demand(dest_demand, dest_done, dest_after)
        {
            continue;
        }
        let cost = base - instance.cost(candidate, dest) + instance.cost(candidate, origin);
        match best {
            Some((_, incumbent)) if cost >= incumbent => {}
            _ => best = Some((candidate, cost)),
        }
    }

    best.map(|(group_in, resulting_cost)| Move {
        origin,
        dest: Some(dest),
        group_out: out,
        group_in: Some(group_in),
        resulting_cost,
    })
}

fn release_move(solution: &Solution<'_>, serving: &[GroupKey], origin: usize) -> Option<Move> {
    let instance = solution.instance();
    let out = most_expensive(solution, serving, origin, None)?;
    let out_tasks = u64::from(instance.type_tasks(out.customer_type));
    let base = solution.total_cost() - instance.cost(out, origin);

    let demand = u64::from(instance.tasks_to_do(origin));
    let done = solution.fulfilled(origin);
    let without = done - out_tasks;
    if without >= demand {
        return Some(Move {
            origin,
            dest: None,
            group_out: out,
            group_in: None,
            resulting_cost: base,
        });
    }

    let mut best: Option<(GroupKey, f64)> = None;
    for (candidate, _) in solution.pool() {
        if candidate.source == origin || candidate == out {
            continue;
        }
        let in_tasks = u64::from(instance.type_tasks(candidate.customer_type));
        if !keeps_demand(demand, done, without + in_tasks) {
            continue;
        }
        let cost = base + instance.cost(candidate, origin);
        match best {
            Some((_, incumbent)) if cost >= incumbent => {}
            _ => best = Some((candidate, cost)),
        }
    }

    best.map(|(group_in, resulting_cost)| Move {
        origin,
        dest: None,
        group_out: out,
        group_in: Some(group_in),
        resulting_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, ProblemInstance, Shape};

    /// Cells 1 and 2 each need 2 tasks; cells 0 and 3 hold the customers.
    fn exchange_instance() -> ProblemInstance {
        let shape = Shape::new(4, 1, 1);
        let mut costs = CostTensor::new(shape);
        costs.set(0, 1, 0, 0, 10.0);
        costs.set(0, 2, 0, 0, 1.0);
        costs.set(3, 1, 0, 0, 2.0);
        costs.set(3, 2, 0, 0, 10.0);
        ProblemInstance::new(
            vec![1],
            vec![0, 2, 2, 0],
            costs,
            vec![CustomerGroup::new(0, 0, 0, 3), CustomerGroup::new(3, 0, 0, 3)],
        )
        .expect("valid")
    }

    fn crossed_solution(inst: &ProblemInstance) -> Solution<'_> {
        let mut sol = Solution::new(inst);
        sol.dispatch(GroupKey::new(0, 0, 0), 1, 2).expect("valid");
        sol.dispatch(GroupKey::new(3, 0, 0), 2, 2).expect("valid");
        sol
    }

    #[test]
    fn test_swap_move_cost_is_incremental() {
        let inst = exchange_instance();
        let sol = crossed_solution(&inst);
        assert!((sol.total_cost() - 40.0).abs() < 1e-10);

        let hood = Neighborhood::generate(&sol);
        let swap = hood
            .moves()
            .iter()
            .find(|m| m.origin == 1 && m.dest == Some(2))
            .expect("swap exists");
        assert_eq!(swap.group_out, GroupKey::new(0, 0, 0));
        assert_eq!(swap.group_in, Some(GroupKey::new(3, 0, 0)));
        // 40 - 10 + 1 - 10 + 2
        assert!((swap.resulting_cost - 23.0).abs() < 1e-10);
        assert!((swap.delta(sol.total_cost()) + 17.0).abs() < 1e-10);

        let mut applied = sol.clone();
        swap.apply(&mut applied).expect("valid move");
        assert!((applied.total_cost() - swap.resulting_cost).abs() < 1e-10);
        assert!((applied.total_cost() - applied.recomputed_cost()).abs() < 1e-10);
        assert!(applied.is_feasible());
    }

    #[test]
    fn test_release_replaces_from_pool() {
        let inst = exchange_instance();
        let sol = crossed_solution(&inst);
        let hood = Neighborhood::generate(&sol);
        let release = hood
            .moves()
            .iter()
            .find(|m| m.origin == 1 && m.dest.is_none())
            .expect("release exists");
        assert_eq!(release.group_in, Some(GroupKey::new(3, 0, 0)));
        assert!((release.resulting_cost - 32.0).abs() < 1e-10);

        let mut applied = sol.clone();
        release.apply(&mut applied).expect("valid move");
        assert_eq!(applied.fulfilled(1), 2);
        assert_eq!(applied.remaining_customers(), 2);
        assert!((applied.total_cost() - 32.0).abs() < 1e-10);
    }

    #[test]
    fn test_plain_release_when_oversupplied() {
        let inst = exchange_instance();
        let mut sol = Solution::new(&inst);
        sol.dispatch(GroupKey::new(3, 0, 0), 1, 3).expect("valid");
        let hood = Neighborhood::generate(&sol);
        let release = hood
            .moves()
            .iter()
            .find(|m| m.origin == 1 && m.dest.is_none())
            .expect("release exists");
        assert_eq!(release.group_in, None);
        assert!((release.resulting_cost - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_moves_never_break_satisfied_cells() {
        let inst = exchange_instance();
        let sol = crossed_solution(&inst);
        for mv in Neighborhood::generate(&sol).moves() {
            let mut applied = sol.clone();
            mv.apply(&mut applied).expect("valid move");
            assert!(applied.is_feasible());
            assert!((applied.total_cost() - mv.resulting_cost).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_neighborhood_without_assignments() {
        let inst = exchange_instance();
        let sol = Solution::new(&inst);
        let hood = Neighborhood::generate(&sol);
        assert!(hood.is_empty());
        assert!(hood.average_cost().is_none());
        assert!(hood.best().is_none());
    }

    #[test]
    fn test_best_and_average() {
        let inst = exchange_instance();
        let sol = crossed_solution(&inst);
        let hood = Neighborhood::generate(&sol);
        let best = hood.best().expect("non-empty");
        assert!(hood.moves().iter().all(|m| m.resulting_cost >= best.resulting_cost));
        let avg = hood.average_cost().expect("non-empty");
        assert!(avg >= best.resulting_cost);
    }
}
