//! One-call facade over every strategy in the crate.
//!
//! [`solve`] builds the random source from [`SolverConfig::seed`], runs the
//! selected [`Strategy`] and reports the solution with its cost, status
//! and wall-clock time. Equal seeds give equal results.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::constructive::{altruistic_greedy, greedy, random_construction, random_greedy};
use crate::error::SolveError;
use crate::ga::{GaConfig, GenerationStats, GeneticOptimizer};
use crate::io::optimality_gap;
use crate::local_search::{multi_start_annealing, simulated_annealing, AnnealingConfig};
use crate::models::{Feasibility, ProblemInstance, Solution};

/// Algorithm run by [`solve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// Deterministic greedy in cell order.
    Greedy,
    /// Greedy over a shuffled cell order.
    RandomGreedy,
    /// Round-robin greedy serving the largest deficits first.
    Altruistic,
    /// Random eligible groups and amounts.
    Random,
    /// Simulated annealing seeded by [`Strategy::Greedy`].
    Annealing(AnnealingConfig),
    /// Annealing from several random-greedy seeds.
    MultiStartAnnealing {
        /// Independent starts, at least 1.
        starts: usize,
        /// Parameters of each run.
        config: AnnealingConfig,
    },
    /// Genetic optimizer.
    Genetic(GaConfig),
}

impl Strategy {
    /// Short lowercase name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Greedy => "greedy",
            Strategy::RandomGreedy => "random-greedy",
            Strategy::Altruistic => "altruistic",
            Strategy::Random => "random",
            Strategy::Annealing(_) => "annealing",
            Strategy::MultiStartAnnealing { .. } => "multi-start-annealing",
            Strategy::Genetic(_) => "genetic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategy plus random seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Algorithm to run.
    pub strategy: Strategy,
    /// Seed of the random source; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Greedy,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Creates a config running `strategy` with an OS seed.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            seed: None,
        }
    }

    /// Fixes the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Outcome of [`solve`].
#[derive(Debug, Clone)]
pub struct SolveReport<'a> {
    /// Final solution.
    pub solution: Solution<'a>,
    /// Its total cost.
    pub total_cost: f64,
    /// Its status.
    pub feasibility: Feasibility,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Per-generation statistics of a genetic run with statistics enabled.
    pub statistics: Vec<GenerationStats>,
}

impl SolveReport<'_> {
    /// Optimality gap in percent against a known reference cost.
    pub fn gap(&self, reference: f64) -> Option<f64> {
        optimality_gap(self.total_cost, reference)
    }
}

/// Runs the configured strategy on `instance`.
///
/// # Errors
///
/// Returns [`SolveError::Config`] for invalid parameters. Dispatch and
/// instance errors only surface on internal inconsistencies.
///
/// # Examples
///
/// ```
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::models::{CustomerGroup, Feasibility, ProblemInstance, Shape};
/// use u_dispatch::solver::{solve, SolverConfig, Strategy};
///
/// let mut costs = CostTensor::new(Shape::new(2, 1, 1));
/// costs.set(0, 1, 0, 0, 5.0);
/// let instance = ProblemInstance::new(
///     vec![2],
///     vec![0, 4],
///     costs,
///     vec![CustomerGroup::new(0, 0, 0, 3)],
/// )
/// .unwrap();
///
/// let config = SolverConfig::new(Strategy::Altruistic).with_seed(7);
/// let report = solve(&instance, &config).unwrap();
/// assert_eq!(report.feasibility, Feasibility::Feasible);
/// assert!((report.total_cost - 10.0).abs() < 1e-10);
/// ```
#[instrument(skip_all, fields(strategy = %config.strategy, seed = config.seed))]
pub fn solve<'a>(
    instance: &'a ProblemInstance,
    config: &SolverConfig,
) -> Result<SolveReport<'a>, SolveError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let started = Instant::now();
    let mut statistics = Vec::new();

    let solution = match &config.strategy {
        Strategy::Greedy => greedy(instance)?,
        Strategy::RandomGreedy => random_greedy(instance, &mut rng)?,
        Strategy::Altruistic => altruistic_greedy(instance, &mut rng)?,
        Strategy::Random => random_construction(instance, &mut rng)?,
        Strategy::Annealing(annealing) => {
            let seed = greedy(instance)?;
            simulated_annealing(seed, annealing, &mut rng)?.best
        }
        Strategy::MultiStartAnnealing { starts, config } => {
            multi_start_annealing(instance, *starts, config, &mut rng)?.best
        }
        Strategy::Genetic(ga) => {
            let outcome = GeneticOptimizer::new(instance, ga.clone())?.run(&mut rng)?;
            statistics = outcome.statistics;
            outcome.best
        }
    };

    let elapsed = started.elapsed();
    let total_cost = solution.total_cost();
    let feasibility = solution.feasibility();
    info!(
        total_cost,
        %feasibility,
        elapsed_ms = elapsed.as_millis() as u64,
        "solve finished"
    );

    Ok(SolveReport {
        solution,
        total_cost,
        feasibility,
        elapsed,
        statistics,
    })
}
