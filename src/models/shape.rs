//! Index arithmetic shared by every dense structure in the crate.

use serde::{Deserialize, Serialize};

use super::GroupKey;

/// Cardinalities of a problem instance and the row-major layouts derived
/// from them.
///
/// Two index spaces are used throughout the crate:
///
/// - **group space** `(source, type, period)`: one slot per customer group,
///   laid out as `[source][type][period]`;
/// - **assignment space** `(source, dest, type, period)`: one slot per
///   possible dispatch, laid out as `[source][dest][type][period]`. The cost
///   tensor, solution counters and GA chromosomes all share this layout.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{GroupKey, Shape};
///
/// let shape = Shape::new(3, 2, 2); // 3 cells, 2 periods, 2 types
/// assert_eq!(shape.num_groups(), 12);
/// assert_eq!(shape.num_assignments(), 36);
///
/// let key = GroupKey::new(2, 1, 0);
/// assert_eq!(shape.group_key(shape.group_index(key)), key);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    n_cells: usize,
    n_periods: usize,
    n_types: usize,
}

impl Shape {
    /// Creates a shape from the cardinalities, in the order used by the
    /// instance text format: cells, periods, types.
    pub fn new(n_cells: usize, n_periods: usize, n_types: usize) -> Self {
        Self {
            n_cells,
            n_periods,
            n_types,
        }
    }

    /// Number of cells (each both a source and a destination).
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Number of time periods.
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    /// Number of customer types.
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Size of the group space.
    pub fn num_groups(&self) -> usize {
        self.n_cells * self.n_types * self.n_periods
    }

    /// Size of the assignment space.
    pub fn num_assignments(&self) -> usize {
        self.n_cells * self.n_cells * self.n_types * self.n_periods
    }

    /// Returns `true` if the key addresses a slot inside this shape.
    pub fn contains(&self, key: GroupKey) -> bool {
        key.source < self.n_cells && key.customer_type < self.n_types && key.period < self.n_periods
    }

    /// Flat index of a group.
    pub fn group_index(&self, key: GroupKey) -> usize {
        (key.source * self.n_types + key.customer_type) * self.n_periods + key.period
    }

    /// Inverse of [`group_index`](Self::group_index).
    pub fn group_key(&self, index: usize) -> GroupKey {
        let period = index % self.n_periods;
        let rest = index / self.n_periods;
        GroupKey::new(rest / self.n_types, rest % self.n_types, period)
    }

    /// Flat index of the dispatch of `key` to `dest`.
    pub fn assignment_index(&self, key: GroupKey, dest: usize) -> usize {
        ((key.source * self.n_cells + dest) * self.n_types + key.customer_type) * self.n_periods
            + key.period
    }

    /// Inverse of [`assignment_index`](Self::assignment_index): `(key, dest)`.
    pub fn assignment_key(&self, index: usize) -> (GroupKey, usize) {
        let period = index % self.n_periods;
        let rest = index / self.n_periods;
        let customer_type = rest % self.n_types;
        let rest = rest / self.n_types;
        let dest = rest % self.n_cells;
        let source = rest / self.n_cells;
        (GroupKey::new(source, customer_type, period), dest)
    }

    /// Iterates over every group key in index order.
    pub fn group_keys(self) -> impl Iterator<Item = GroupKey> {
        (0..self.num_groups()).map(move |i| self.group_key(i))
    }
}
