//! Validated, immutable problem instance.

use crate::cost::CostTensor;
use crate::error::InstanceError;

use super::{CustomerGroup, GroupKey, Shape};

/// A capacitated, time-indexed dispatch problem.
///
/// Holds the cardinalities, the task throughput of each customer type, the
/// task demand of each cell, the `[source][dest][type][period]` cost tensor
/// and the merged availability of every customer group. All data is
/// validated once in [`ProblemInstance::new`]; afterwards the instance is
/// read-only and the search algorithms borrow it immutably.
///
/// # Examples
///
/// ```
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::models::{CustomerGroup, GroupKey, ProblemInstance, Shape};
///
/// let shape = Shape::new(2, 1, 1);
/// let mut costs = CostTensor::new(shape);
/// costs.set(0, 1, 0, 0, 5.0);
///
/// let instance = ProblemInstance::new(
///     vec![2],    // a type-0 customer completes 2 tasks
///     vec![0, 4], // cell 1 needs 4 tasks
///     costs,
///     vec![CustomerGroup::new(0, 0, 0, 3)],
/// )
/// .unwrap();
///
/// assert_eq!(instance.availability(GroupKey::new(0, 0, 0)), 3);
/// assert_eq!(instance.total_tasks(), 4);
/// assert!((instance.unit_cost(GroupKey::new(0, 0, 0), 1) - 2.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    shape: Shape,
    type_tasks: Vec<u32>,
    tasks_to_do: Vec<u32>,
    costs: CostTensor,
    availability: Vec<u32>,
    total_customers: u64,
    total_tasks: u64,
}

impl ProblemInstance {
    /// Validates and assembles an instance.
    ///
    /// The shape is taken from `costs`. Group records sharing a key are
    /// merged by summing their counts.
    ///
    /// # Errors
    ///
    /// Returns an [`InstanceError`] if a cardinality is zero, a vector has
    /// the wrong length, a type completes zero tasks, a cost is negative or
    /// non-finite, or a group record is out of range or empty.
    pub fn new<I>(
        type_tasks: Vec<u32>,
        tasks_to_do: Vec<u32>,
        costs: CostTensor,
        groups: I,
    ) -> Result<Self, InstanceError>
    where
        I: IntoIterator<Item = CustomerGroup>,
    {
        let shape = costs.shape();
        if shape.n_cells() == 0 {
            return Err(InstanceError::ZeroCardinality { what: "cells" });
        }
        if shape.n_periods() == 0 {
            return Err(InstanceError::ZeroCardinality { what: "periods" });
        }
        if shape.n_types() == 0 {
            return Err(InstanceError::ZeroCardinality { what: "types" });
        }
        if type_tasks.len() != shape.n_types() {
            return Err(InstanceError::LengthMismatch {
                what: "type tasks",
                expected: shape.n_types(),
                actual: type_tasks.len(),
            });
        }
        if tasks_to_do.len() != shape.n_cells() {
            return Err(InstanceError::LengthMismatch {
                what: "tasks to do",
                expected: shape.n_cells(),
                actual: tasks_to_do.len(),
            });
        }
        if let Some(customer_type) = type_tasks.iter().position(|&t| t == 0) {
            return Err(InstanceError::ZeroTypeTasks { customer_type });
        }
        if let Some((key, dest, value)) = costs.first_invalid() {
            return Err(InstanceError::InvalidCost {
                source: key.source,
                dest,
                customer_type: key.customer_type,
                period: key.period,
                value,
            });
        }

        let mut availability = vec![0u32; shape.num_groups()];
        for group in groups {
            if !shape.contains(group.key) {
                return Err(InstanceError::GroupOutOfRange { key: group.key });
            }
            if group.count == 0 {
                return Err(InstanceError::EmptyGroup { key: group.key });
            }
            let slot = &mut availability[shape.group_index(group.key)];
            *slot = slot
                .checked_add(group.count)
                .ok_or(InstanceError::CountOverflow { key: group.key })?;
        }

        let total_customers = availability.iter().map(|&c| u64::from(c)).sum();
        let total_tasks = tasks_to_do.iter().map(|&t| u64::from(t)).sum();

        Ok(Self {
            shape,
            type_tasks,
            tasks_to_do,
            costs,
            availability,
            total_customers,
            total_tasks,
        })
    }

    /// Cardinalities and index layouts.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of cells.
    pub fn n_cells(&self) -> usize {
        self.shape.n_cells()
    }

    /// Number of periods.
    pub fn n_periods(&self) -> usize {
        self.shape.n_periods()
    }

    /// Number of customer types.
    pub fn n_types(&self) -> usize {
        self.shape.n_types()
    }

    /// Tasks a customer of the given type completes.
    pub fn type_tasks(&self, customer_type: usize) -> u32 {
        self.type_tasks[customer_type]
    }

    /// Task demand of a cell.
    pub fn tasks_to_do(&self, cell: usize) -> u32 {
        self.tasks_to_do[cell]
    }

    /// Task demand of every cell.
    pub fn demands(&self) -> &[u32] {
        &self.tasks_to_do
    }

    /// The full cost tensor.
    pub fn costs(&self) -> &CostTensor {
        &self.costs
    }

    /// Cost of sending one customer of group `key` to `dest`.
    pub fn cost(&self, key: GroupKey, dest: usize) -> f64 {
        self.costs.at(key, dest)
    }

    /// Cost per task of sending a customer of group `key` to `dest`.
    ///
    /// Normalizing by throughput lets productive customer types outrank
    /// cheaper but less productive ones.
    pub fn unit_cost(&self, key: GroupKey, dest: usize) -> f64 {
        self.costs.at(key, dest) / f64::from(self.type_tasks[key.customer_type])
    }

    /// Original number of customers in a group (zero if none were declared).
    pub fn availability(&self, key: GroupKey) -> u32 {
        self.availability[self.shape.group_index(key)]
    }

    /// Availability indexed by [`Shape::group_index`].
    pub fn availability_slice(&self) -> &[u32] {
        &self.availability
    }

    /// Iterates over the merged, non-empty customer groups in key order.
    pub fn groups(&self) -> impl Iterator<Item = CustomerGroup> + '_ {
        self.availability
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(move |(index, &count)| CustomerGroup {
                key: self.shape.group_key(index),
                count,
            })
    }

    /// Total number of customers over all groups.
    pub fn total_customers(&self) -> u64 {
        self.total_customers
    }

    /// Total task demand over all cells.
    pub fn total_tasks(&self) -> u64 {
        self.total_tasks
    }

    /// Total tasks the whole customer pool could complete.
    pub fn total_capacity(&self) -> u64 {
        self.groups()
            .map(|g| u64::from(g.count) * u64::from(self.type_tasks(g.key.customer_type)))
            .sum()
    }
}
