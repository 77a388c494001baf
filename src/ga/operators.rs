//! Crossover and mutation over assignment grids.
//!
//! # Crossover
//!
//! All variants exchange genes in place between two child grids:
//!
//! - **One-point**: a single random `(source, dest, type, period)` position.
//! - **Two-point**: the inclusive box spanned by two random positions,
//!   bounds sorted per dimension.
//! - **Uniform**: every position independently with probability 1/2.
//! - **Roulette**: one of the above, chosen uniformly per call.
//!
//! # Mutation
//!
//! A random off-diagonal gene `g` moves up or down (50/50) by
//! `floor(g * r / 1000)` with `r` uniform in `0..1000`, then is clamped to
//! `[0, availability(source, type, period)]`. Mutation may leave the grid
//! infeasible; fitness penalizes that.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{GroupKey, ProblemInstance};

use super::grid::AssignmentGrid;

/// Crossover operator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossoverKind {
    /// Swap a single gene.
    #[default]
    OnePoint,
    /// Swap a hyper-rectangle of genes.
    TwoPoint,
    /// Swap each gene with probability 1/2.
    Uniform,
    /// Pick one of the other three uniformly at random.
    Roulette,
}

impl CrossoverKind {
    /// Recombines `a` and `b` in place.
    pub fn apply<R: Rng>(self, a: &mut AssignmentGrid, b: &mut AssignmentGrid, rng: &mut R) {
        match self {
            CrossoverKind::OnePoint => one_point_crossover(a, b, rng),
            CrossoverKind::TwoPoint => two_point_crossover(a, b, rng),
            CrossoverKind::Uniform => uniform_crossover(a, b, rng),
            CrossoverKind::Roulette => {
                let picked = match rng.random_range(0..3) {
                    0 => CrossoverKind::OnePoint,
                    1 => CrossoverKind::TwoPoint,
                    _ => CrossoverKind::Uniform,
                };
                picked.apply(a, b, rng);
            }
        }
    }
}

fn random_position<R: Rng>(a: &AssignmentGrid, rng: &mut R) -> (GroupKey, usize) {
    let shape = a.shape();
    let key = GroupKey::new(
        rng.random_range(0..shape.n_cells()),
        rng.random_range(0..shape.n_types()),
        rng.random_range(0..shape.n_periods()),
    );
    (key, rng.random_range(0..shape.n_cells()))
}

/// Swaps one random gene.
pub fn one_point_crossover<R: Rng>(a: &mut AssignmentGrid, b: &mut AssignmentGrid, rng: &mut R) {
    if a.is_empty() {
        return;
    }
    let (key, dest) = random_position(a, rng);
    let index = a.shape().assignment_index(key, dest);
    a.swap_gene(b, index);
}

/// Swaps every gene inside the box spanned by two random positions.
pub fn two_point_crossover<R: Rng>(a: &mut AssignmentGrid, b: &mut AssignmentGrid, rng: &mut R) {
    if a.is_empty() {
        return;
    }
    let shape = a.shape();
    let (k1, d1) = random_position(a, rng);
    let (k2, d2) = random_position(a, rng);

    let sources = k1.source.min(k2.source)..=k1.source.max(k2.source);
    let dests = d1.min(d2)..=d1.max(d2);
    let types = k1.customer_type.min(k2.customer_type)..=k1.customer_type.max(k2.customer_type);
    let periods = k1.period.min(k2.period)..=k1.period.max(k2.period);

    for source in sources {
        for dest in dests.clone() {
            for customer_type in types.clone() {
                for period in periods.clone() {
                    let key = GroupKey::new(source, customer_type, period);
                    a.swap_gene(b, shape.assignment_index(key, dest));
                }
            }
        }
    }
}

/// Swaps each gene independently with probability 1/2.
pub fn uniform_crossover<R: Rng>(a: &mut AssignmentGrid, b: &mut AssignmentGrid, rng: &mut R) {
    for index in 0..a.len() {
        if rng.random_bool(0.5) {
            a.swap_gene(b, index);
        }
    }
}

/// Perturbs one random off-diagonal gene.
///
/// Returns `true` if the gene changed. A zero gene stays zero, and a
/// single-cell instance has no off-diagonal gene to mutate.
pub fn mutate<R: Rng>(grid: &mut AssignmentGrid, instance: &ProblemInstance, rng: &mut R) -> bool {
    let n = instance.n_cells();
    if n < 2 {
        return false;
    }
    let source = rng.random_range(0..n);
    let mut dest = rng.random_range(0..n - 1);
    if dest >= source {
        dest += 1;
    }
    let key = GroupKey::new(
        source,
        rng.random_range(0..instance.n_types()),
        rng.random_range(0..instance.n_periods()),
    );

    let index = instance.shape().assignment_index(key, dest);
    let gene = i64::from(grid.genes()[index]);
    let step = gene * rng.random_range(0..1000i64) / 1000;
    let value = if rng.random_bool(0.5) { gene + step } else { gene - step };
    grid.set_clamped(index, value, instance.availability(key));
    i64::from(grid.genes()[index]) != gene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grids(shape: Shape) -> (AssignmentGrid, AssignmentGrid) {
        let n = shape.num_assignments();
        let a = AssignmentGrid::from_genes(shape, vec![1; n]).expect("valid");
        let b = AssignmentGrid::from_genes(shape, vec![2; n]).expect("valid");
        (a, b)
    }

    fn assert_exchanged(a: &AssignmentGrid, b: &AssignmentGrid) {
        // Genes are exchanged, never created or lost.
        for (x, y) in a.genes().iter().zip(b.genes()) {
            assert_eq!(x + y, 3);
        }
    }

    #[test]
    fn test_one_point_swaps_single_gene() {
        let (mut a, mut b) = grids(Shape::new(3, 2, 2));
        let mut rng = StdRng::seed_from_u64(1);
        one_point_crossover(&mut a, &mut b, &mut rng);
        assert_eq!(a.genes().iter().filter(|&&g| g == 2).count(), 1);
        assert_exchanged(&a, &b);
    }

    #[test]
    fn test_two_point_swaps_box() {
        let shape = Shape::new(4, 2, 2);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let (mut a, mut b) = grids(shape);
            two_point_crossover(&mut a, &mut b, &mut rng);
            assert_exchanged(&a, &b);
            let swapped = a.genes().iter().filter(|&&g| g == 2).count();
            assert!(swapped >= 1);
        }
    }

    #[test]
    fn test_uniform_and_roulette_conserve_genes() {
        let mut rng = StdRng::seed_from_u64(5);
        for kind in [CrossoverKind::Uniform, CrossoverKind::Roulette, CrossoverKind::TwoPoint] {
            let (mut a, mut b) = grids(Shape::new(3, 1, 2));
            kind.apply(&mut a, &mut b, &mut rng);
            assert_exchanged(&a, &b);
        }
    }

    #[test]
    fn test_mutation_respects_availability() {
        let shape = Shape::new(3, 1, 1);
        let inst = ProblemInstance::new(
            vec![1],
            vec![0, 1, 1],
            CostTensor::new(shape),
            vec![
                CustomerGroup::new(0, 0, 0, 4),
                CustomerGroup::new(1, 0, 0, 4),
                CustomerGroup::new(2, 0, 0, 4),
            ],
        )
        .expect("valid");
        let mut grid = AssignmentGrid::from_genes(shape, vec![3; 9]).expect("valid");
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            mutate(&mut grid, &inst, &mut rng);
            for index in 0..grid.len() {
                let (key, dest) = shape.assignment_key(index);
                assert!(grid.genes()[index] <= 4);
                if key.source == dest {
                    assert_eq!(grid.genes()[index], 3);
                }
            }
        }
    }

    #[test]
    fn test_mutation_single_cell_is_noop() {
        let shape = Shape::new(1, 1, 1);
        let inst = ProblemInstance::new(
            vec![1],
            vec![0],
            CostTensor::new(shape),
            vec![CustomerGroup::new(0, 0, 0, 2)],
        )
        .expect("valid");
        let mut grid = AssignmentGrid::from_genes(shape, vec![2]).expect("valid");
        let mut rng = StdRng::seed_from_u64(0);
        assert!(!mutate(&mut grid, &inst, &mut rng));
        assert_eq!(grid.genes(), &[2]);
    }

    #[test]
    fn test_mutation_keeps_zero_genes() {
        let shape = Shape::new(2, 1, 1);
        let inst = ProblemInstance::new(
            vec![1],
            vec![0, 1],
            CostTensor::new(shape),
            vec![CustomerGroup::new(0, 0, 0, 5)],
        )
        .expect("valid");
        let mut grid = AssignmentGrid::zeros(shape);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            assert!(!mutate(&mut grid, &inst, &mut rng));
        }
        assert_eq!(grid.total(), 0);
    }
}
