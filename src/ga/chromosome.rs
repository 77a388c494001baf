//! Assignment-grid chromosome with cost-based fitness.

use crate::error::InstanceError;
use crate::models::{ProblemInstance, Solution};

use super::grid::AssignmentGrid;

/// Fitness of any chromosome violating demand or availability.
///
/// Dominates every feasible cost in comparisons.
pub const INFEASIBLE_FITNESS: f64 = f64::MAX;

/// A GA individual: an assignment grid plus its fitness and rank.
///
/// Fitness is the total dispatch cost when the grid is feasible and
/// [`INFEASIBLE_FITNESS`] otherwise, so lower is better. Rank runs from 0
/// (worst) to `population - 1` (best) and is recomputed every generation.
///
/// # Examples
///
/// ```
/// use u_dispatch::ga::{AssignmentGrid, Chromosome, INFEASIBLE_FITNESS};
/// use u_dispatch::models::Shape;
///
/// let chrom = Chromosome::new(AssignmentGrid::zeros(Shape::new(2, 1, 1)));
/// assert_eq!(chrom.fitness(), INFEASIBLE_FITNESS);
/// assert_eq!(chrom.rank(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Chromosome {
    grid: AssignmentGrid,
    fitness: f64,
    rank: usize,
}

impl Chromosome {
    /// Wraps a grid; the chromosome is unevaluated (infeasible fitness).
    pub fn new(grid: AssignmentGrid) -> Self {
        Self {
            grid,
            fitness: INFEASIBLE_FITNESS,
            rank: 0,
        }
    }

    /// Builds and evaluates a chromosome from a solution.
    pub fn from_solution(solution: &Solution<'_>) -> Self {
        let fitness = if solution.is_feasible() {
            solution.total_cost()
        } else {
            INFEASIBLE_FITNESS
        };
        Self {
            grid: AssignmentGrid::from_solution(solution),
            fitness,
            rank: 0,
        }
    }

    /// Recomputes fitness from the grid.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::LengthMismatch`] if the grid was built for
    /// a different instance shape.
    pub fn evaluate(&mut self, instance: &ProblemInstance) -> Result<f64, InstanceError> {
        let solution = self.to_solution(instance)?;
        self.fitness = if solution.is_feasible() {
            solution.total_cost()
        } else {
            INFEASIBLE_FITNESS
        };
        Ok(self.fitness)
    }

    /// Decodes the grid into a solution.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate).
    pub fn to_solution<'a>(&self, instance: &'a ProblemInstance) -> Result<Solution<'a>, InstanceError> {
        Solution::from_counts(instance, self.grid.genes().to_vec())
    }

    /// Genome.
    pub fn grid(&self) -> &AssignmentGrid {
        &self.grid
    }

    /// Mutable genome. Fitness is stale until [`evaluate`](Self::evaluate).
    pub fn grid_mut(&mut self) -> &mut AssignmentGrid {
        &mut self.grid
    }

    /// Last computed fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Returns true if the last evaluation found the grid feasible.
    pub fn is_feasible(&self) -> bool {
        self.fitness < INFEASIBLE_FITNESS
    }

    /// Rank within the current population.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub(crate) fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }
}
