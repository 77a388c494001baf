//! Fixed-size assignment-count grid used as the GA genome.

use crate::models::{GroupKey, Shape, Solution};

/// Dispatch counts over the whole `(source, dest, type, period)` space.
///
/// The layout matches [`Shape::assignment_index`], so a grid converts to
/// and from a [`Solution`] without reindexing. Genes are unsigned and every
/// update clamps instead of wrapping.
///
/// # Examples
///
/// ```
/// use u_dispatch::ga::AssignmentGrid;
/// use u_dispatch::models::{GroupKey, Shape};
///
/// let mut grid = AssignmentGrid::zeros(Shape::new(2, 1, 1));
/// grid.set(GroupKey::new(0, 0, 0), 1, 4);
/// assert_eq!(grid.get(GroupKey::new(0, 0, 0), 1), 4);
/// assert_eq!(grid.total(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentGrid {
    shape: Shape,
    genes: Vec<u32>,
}

impl AssignmentGrid {
    /// Creates an all-zero grid.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            genes: vec![0; shape.num_assignments()],
        }
    }

    /// Creates a grid from raw genes.
    ///
    /// Returns `None` if the length doesn't match the shape.
    pub fn from_genes(shape: Shape, genes: Vec<u32>) -> Option<Self> {
        if genes.len() != shape.num_assignments() {
            return None;
        }
        Some(Self { shape, genes })
    }

    /// Copies the assignment counts of a solution.
    pub fn from_solution(solution: &Solution<'_>) -> Self {
        Self {
            shape: solution.instance().shape(),
            genes: solution.counts().to_vec(),
        }
    }

    /// Shape of the grid.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Raw genes.
    pub fn genes(&self) -> &[u32] {
        &self.genes
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns true if the grid has no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Count of group `key` dispatched to `dest`.
    pub fn get(&self, key: GroupKey, dest: usize) -> u32 {
        self.genes[self.shape.assignment_index(key, dest)]
    }

    /// Overwrites the count of group `key` dispatched to `dest`.
    pub fn set(&mut self, key: GroupKey, dest: usize, count: u32) {
        let index = self.shape.assignment_index(key, dest);
        self.genes[index] = count;
    }

    /// Sets a gene to `value` clamped to `[0, cap]`.
    pub fn set_clamped(&mut self, index: usize, value: i64, cap: u32) {
        self.genes[index] = value.clamp(0, i64::from(cap)) as u32;
    }

    /// Sum of all genes.
    pub fn total(&self) -> u64 {
        self.genes.iter().map(|&g| u64::from(g)).sum()
    }

    /// Exchanges the gene at `index` with `other`.
    pub fn swap_gene(&mut self, other: &mut Self, index: usize) {
        std::mem::swap(&mut self.genes[index], &mut other.genes[index]);
    }

    /// Number of positions where the two grids differ.
    pub fn differing_genes(&self, other: &Self) -> usize {
        self.genes
            .iter()
            .zip(&other.genes)
            .filter(|(a, b)| a != b)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_genes_checks_length() {
        let shape = Shape::new(2, 1, 1);
        assert!(AssignmentGrid::from_genes(shape, vec![0, 1, 2, 3]).is_some());
        assert!(AssignmentGrid::from_genes(shape, vec![0, 1]).is_none());
    }

    #[test]
    fn test_set_clamped() {
        let mut grid = AssignmentGrid::zeros(Shape::new(2, 1, 1));
        grid.set_clamped(1, -5, 10);
        assert_eq!(grid.genes()[1], 0);
        grid.set_clamped(1, 300, 10);
        assert_eq!(grid.genes()[1], 10);
        grid.set_clamped(1, 7, 10);
        assert_eq!(grid.genes()[1], 7);
    }

    #[test]
    fn test_swap_and_difference() {
        let shape = Shape::new(2, 1, 1);
        let mut a = AssignmentGrid::from_genes(shape, vec![1, 2, 3, 4]).expect("valid");
        let mut b = AssignmentGrid::from_genes(shape, vec![5, 6, 7, 8]).expect("valid");
        assert_eq!(a.differing_genes(&b), 4);
        a.swap_gene(&mut b, 2);
        assert_eq!(a.genes(), &[1, 2, 7, 4]);
        assert_eq!(b.genes(), &[5, 6, 3, 8]);
        assert_eq!(a.total(), 14);
    }
}
