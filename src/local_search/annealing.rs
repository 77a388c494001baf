//! Simulated annealing over the exchange neighbourhood.
//!
//! # Algorithm
//!
//! 1. Generate the neighbourhood of the seed and calibrate the initial
//!    temperature so that a move of average cost is accepted with
//!    probability one half: `T0 = |avg - current| / ln 2`.
//! 2. Each iteration draws a uniformly random move. A strict improvement is
//!    always accepted; otherwise the move is accepted with probability
//!    `exp((current - resulting) / T)`.
//! 3. The temperature follows a stepped geometric schedule
//!    `T = alpha^floor(it / L) * T0` with plateau length
//!    `L = max(1, ceil(gamma * |neighbourhood|))`.
//! 4. After every accepted move the neighbourhood is regenerated.
//!
//! The run stops at the iteration budget, at the wall-clock deadline
//! (checked once per iteration), or when the neighbourhood is empty. The
//! best solution seen is returned.
//!
//! # Reference
//!
//! Kirkpatrick, S., Gelatt, C. D. & Vecchi, M. P. (1983). "Optimization by
//! Simulated Annealing", *Science* 220(4598), 671-680.

use std::f64::consts::LN_2;
use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::constructive::random_greedy;
use crate::error::{ConfigError, SolveError};
use crate::models::{ProblemInstance, Solution};

use super::moves::Neighborhood;

/// Simulated annealing parameters.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_dispatch::local_search::AnnealingConfig;
///
/// let config = AnnealingConfig::default()
///     .with_alpha(0.9)
///     .with_max_iterations(500)
///     .with_max_duration(Duration::from_secs(2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealingConfig {
    /// Geometric cooling factor per plateau, in `(0, 1)`.
    pub alpha: f64,
    /// Plateau length as a fraction of the neighbourhood size, positive.
    pub gamma: f64,
    /// Iteration budget. Zero returns the seed unchanged.
    pub max_iterations: usize,
    /// Optional wall-clock budget.
    pub max_duration: Option<Duration>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.95,
            gamma: 0.5,
            max_iterations: 10_000,
            max_duration: None,
        }
    }
}

impl AnnealingConfig {
    /// Sets the cooling factor.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the plateau factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Alpha`] or [`ConfigError::Gamma`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha { value: self.alpha });
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(ConfigError::Gamma { value: self.gamma });
        }
        Ok(())
    }
}

/// Why an annealing run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The iteration budget was used up.
    IterationLimit,
    /// The wall-clock budget was used up.
    Deadline,
    /// No move exists from the current solution.
    EmptyNeighborhood,
    /// Every initial move has the seed's cost, so no temperature can be
    /// calibrated.
    FlatNeighborhood,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::IterationLimit => "iteration limit",
            StopReason::Deadline => "deadline",
            StopReason::EmptyNeighborhood => "empty neighbourhood",
            StopReason::FlatNeighborhood => "flat neighbourhood",
        };
        f.write_str(s)
    }
}

/// Result of an annealing run.
#[derive(Debug, Clone)]
pub struct AnnealingOutcome<'a> {
    /// Best solution seen, the seed included.
    pub best: Solution<'a>,
    /// Iterations performed.
    pub iterations: usize,
    /// Moves accepted.
    pub accepted: usize,
    /// Termination cause.
    pub stop_reason: StopReason,
}

impl<'a> AnnealingOutcome<'a> {
    fn unchanged(seed: Solution<'a>, stop_reason: StopReason) -> Self {
        Self {
            best: seed,
            iterations: 0,
            accepted: 0,
            stop_reason,
        }
    }
}

/// Improves `seed` by simulated annealing.
///
/// # Errors
///
/// Returns [`SolveError::Config`] for invalid parameters and
/// [`SolveError::Dispatch`] if a generated move cannot be applied, which
/// indicates a bug.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_dispatch::constructive::greedy;
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::local_search::{simulated_annealing, AnnealingConfig};
/// use u_dispatch::models::{CustomerGroup, ProblemInstance, Shape};
///
/// let costs = CostTensor::from_fn(Shape::new(3, 1, 1), |i, j, _, _| if i == j { 0.0 } else { (i + 2 * j) as f64 });
/// let instance = ProblemInstance::new(
///     vec![1],
///     vec![0, 2, 1],
///     costs,
///     vec![CustomerGroup::new(0, 0, 0, 3), CustomerGroup::new(2, 0, 0, 3)],
/// )
/// .unwrap();
///
/// let seed = greedy(&instance).unwrap();
/// let seed_cost = seed.total_cost();
/// let mut rng = StdRng::seed_from_u64(42);
/// let outcome = simulated_annealing(seed, &AnnealingConfig::default(), &mut rng).unwrap();
/// assert!(outcome.best.total_cost() <= seed_cost);
/// assert!(outcome.best.is_feasible());
/// ```
#[instrument(skip_all, fields(max_iterations = config.max_iterations))]
pub fn simulated_annealing<'a, R: Rng>(
    seed: Solution<'a>,
    config: &AnnealingConfig,
    rng: &mut R,
) -> Result<AnnealingOutcome<'a>, SolveError> {
    config.validate()?;
    let started = Instant::now();

    if config.max_iterations == 0 {
        return Ok(AnnealingOutcome::unchanged(seed, StopReason::IterationLimit));
    }

    let mut neighborhood = Neighborhood::generate(&seed);
    let Some(average) = neighborhood.average_cost() else {
        info!(cost = seed.total_cost(), "initial neighbourhood is empty");
        return Ok(AnnealingOutcome::unchanged(seed, StopReason::EmptyNeighborhood));
    };
    let spread = (average - seed.total_cost()).abs();
    if spread <= f64::EPSILON * seed.total_cost().abs().max(1.0) {
        warn!(
            cost = seed.total_cost(),
            moves = neighborhood.len(),
            "initial neighbourhood has no cost spread; returning seed"
        );
        return Ok(AnnealingOutcome::unchanged(seed, StopReason::FlatNeighborhood));
    }

    let t0 = initial_temperature(seed.total_cost(), average);
    let plateau = ((config.gamma * neighborhood.len() as f64).ceil() as usize).max(1);
    debug!(t0, plateau, moves = neighborhood.len(), "annealing calibrated");

    let mut current = seed;
    let mut best = current.clone();
    let mut accepted = 0usize;
    let mut iteration = 0usize;

    let stop_reason = loop {
        if iteration >= config.max_iterations {
            break StopReason::IterationLimit;
        }
        if config.max_duration.is_some_and(|limit| started.elapsed() >= limit) {
            break StopReason::Deadline;
        }

        let temperature = temperature(t0, config.alpha, iteration, plateau);
        let index = rng.random_range(0..neighborhood.len());
        let Some(&mv) = neighborhood.get(index) else {
            break StopReason::EmptyNeighborhood;
        };

        let current_cost = current.total_cost();
        let accept = mv.resulting_cost < current_cost
            || rng.random::<f64>() < acceptance_probability(current_cost, mv.resulting_cost, temperature);
        iteration += 1;
        if !accept {
            continue;
        }

        mv.apply(&mut current)?;
        accepted += 1;
        trace!(
            iteration,
            temperature,
            origin = mv.origin,
            cost = current.total_cost(),
            "move accepted"
        );
        if current.total_cost() < best.total_cost() {
            best = current.clone();
        }

        neighborhood = Neighborhood::generate(&current);
        if neighborhood.is_empty() {
            break StopReason::EmptyNeighborhood;
        }
    };

    info!(
        %stop_reason,
        iterations = iteration,
        accepted,
        best_cost = best.total_cost(),
        "annealing finished"
    );

    Ok(AnnealingOutcome {
        best,
        iterations: iteration,
        accepted,
        stop_reason,
    })
}

/// Runs annealing from `starts` independent random-greedy seeds and keeps
/// the best outcome (feasible before infeasible, then lowest cost).
///
/// # Errors
///
/// Returns [`ConfigError::NoStarts`] if `starts` is zero, plus the errors
/// of [`simulated_annealing`].
#[instrument(skip_all, fields(starts = starts))]
pub fn multi_start_annealing<'a, R: Rng>(
    instance: &'a ProblemInstance,
    starts: usize,
    config: &AnnealingConfig,
    rng: &mut R,
) -> Result<AnnealingOutcome<'a>, SolveError> {
    if starts == 0 {
        return Err(ConfigError::NoStarts.into());
    }
    config.validate()?;

    let mut best: Option<AnnealingOutcome<'a>> = None;
    for start in 0..starts {
        let seed = random_greedy(instance, rng)?;
        let outcome = simulated_annealing(seed, config, rng)?;
        debug!(start, cost = outcome.best.total_cost(), "start finished");
        let improves = match &best {
            None => true,
            Some(incumbent) => is_better(&outcome.best, &incumbent.best),
        };
        if improves {
            best = Some(outcome);
        }
    }
    best.ok_or_else(|| ConfigError::NoStarts.into())
}

/// Temperature at which a move of cost `average` from `current` is
/// accepted with probability 1/2.
fn initial_temperature(current: f64, average: f64) -> f64 {
    (average - current).abs() / LN_2
}

/// Stepped geometric cooling: `t0 * alpha^floor(iteration / plateau)`.
fn temperature(t0: f64, alpha: f64, iteration: usize, plateau: usize) -> f64 {
    t0 * alpha.powf((iteration / plateau) as f64)
}

/// Metropolis acceptance probability of moving from `current` to
/// `candidate` at `temperature`.
fn acceptance_probability(current: f64, candidate: f64, temperature: f64) -> f64 {
    if candidate < current {
        1.0
    } else {
        ((current - candidate) / temperature).exp()
    }
}

/// Feasible beats infeasible; otherwise lower cost wins.
fn is_better(candidate: &Solution<'_>, incumbent: &Solution<'_>) -> bool {
    match (candidate.is_feasible(), incumbent.is_feasible()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.total_cost() < incumbent.total_cost(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructive::greedy;
    use crate::cost::CostTensor;
    use crate::models::{CustomerGroup, GroupKey, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

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
            vec![CustomerGroup::new(0, 0, 0, 2), CustomerGroup::new(3, 0, 0, 2)],
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
    fn test_default_config() {
        let c = AnnealingConfig::default();
        assert!((c.alpha - 0.95).abs() < 1e-10);
        assert!((c.gamma - 0.5).abs() < 1e-10);
        assert_eq!(c.max_iterations, 10_000);
        assert!(c.max_duration.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            AnnealingConfig::default().with_alpha(1.0).validate(),
            Err(ConfigError::Alpha { .. })
        ));
        assert!(matches!(
            AnnealingConfig::default().with_gamma(0.0).validate(),
            Err(ConfigError::Gamma { .. })
        ));
    }

    #[test]
    fn test_acceptance_probability() {
        assert_eq!(acceptance_probability(10.0, 9.0, 0.5), 1.0);
        assert_eq!(acceptance_probability(10.0, 9.0, 1e-12), 1.0);
        assert!((acceptance_probability(10.0, 10.0, 2.0) - 1.0).abs() < 1e-12);
        let worse = acceptance_probability(10.0, 12.0, 2.0);
        assert!((worse - (-1.0f64).exp()).abs() < 1e-12);
        assert!(acceptance_probability(10.0, 13.0, 2.0) < worse);
    }

    #[test]
    fn test_average_move_accepted_half_the_time_at_start() {
        for (current, average) in [(10.0, 14.0), (10.0, 6.0), (100.0, 100.5)] {
            let t0 = initial_temperature(current, average);
            let uphill = current + (average - current).abs();
            assert!((acceptance_probability(current, uphill, t0) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_temperature_steps_per_plateau() {
        let (t0, alpha, plateau) = (8.0, 0.5, 3);
        assert_eq!(temperature(t0, alpha, 0, plateau), t0);
        assert_eq!(temperature(t0, alpha, 1, plateau), t0);
        assert_eq!(temperature(t0, alpha, 2, plateau), t0);
        assert!((temperature(t0, alpha, 3, plateau) - t0 * alpha).abs() < 1e-12);
        assert!((temperature(t0, alpha, 5, plateau) - t0 * alpha).abs() < 1e-12);
        assert!((temperature(t0, alpha, 6, plateau) - t0 * alpha * alpha).abs() < 1e-12);
        let cooled = temperature(t0, 0.95, 40, 1);
        assert!((cooled / temperature(t0, 0.95, 39, 1) - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations_returns_seed() {
        let inst = exchange_instance();
        let seed = crossed_solution(&inst);
        let counts = seed.counts().to_vec();
        let config = AnnealingConfig::default().with_max_iterations(0);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = simulated_annealing(seed, &config, &mut rng).expect("valid");
        assert_eq!(outcome.best.counts(), counts.as_slice());
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.stop_reason, StopReason::IterationLimit);
    }

    #[test]
    fn test_annealing_improves_crossed_assignment() {
        let inst = exchange_instance();
        let seed = crossed_solution(&inst);
        let config = AnnealingConfig::default().with_max_iterations(2_000);
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = simulated_annealing(seed, &config, &mut rng).expect("valid");
        // Optimum sends cell 3's customers to 1 and cell 0's to 2.
        assert!((outcome.best.total_cost() - 6.0).abs() < 1e-9);
        assert!(outcome.best.is_feasible());
        assert!(outcome.accepted > 0);
        assert!((outcome.best.total_cost() - outcome.best.recomputed_cost()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_neighborhood_stops() {
        let inst = exchange_instance();
        let seed = Solution::new(&inst);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = simulated_annealing(seed, &AnnealingConfig::default(), &mut rng).expect("valid");
        assert_eq!(outcome.stop_reason, StopReason::EmptyNeighborhood);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_flat_neighborhood_returns_seed() {
        // Every dispatch costs the same, so every move keeps the cost.
        let shape = Shape::new(4, 1, 1);
        let costs = CostTensor::from_fn(shape, |i, j, _, _| if i == j { 0.0 } else { 1.0 });
        let inst = ProblemInstance::new(
            vec![1],
            vec![0, 1, 1, 0],
            costs,
            vec![CustomerGroup::new(0, 0, 0, 2), CustomerGroup::new(3, 0, 0, 2)],
        )
        .expect("valid");
        let seed = greedy(&inst).expect("valid");
        let cost = seed.total_cost();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = simulated_annealing(seed, &AnnealingConfig::default(), &mut rng).expect("valid");
        assert_eq!(outcome.stop_reason, StopReason::FlatNeighborhood);
        assert_eq!(outcome.best.total_cost(), cost);
    }

    #[test]
    fn test_deadline_stops_run() {
        let inst = exchange_instance();
        let seed = crossed_solution(&inst);
        let config = AnnealingConfig::default()
            .with_max_iterations(usize::MAX)
            .with_max_duration(Duration::ZERO);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = simulated_annealing(seed, &config, &mut rng).expect("valid");
        assert_eq!(outcome.stop_reason, StopReason::Deadline);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_multi_start() {
        let inst = exchange_instance();
        let config = AnnealingConfig::default().with_max_iterations(500);
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = multi_start_annealing(&inst, 3, &config, &mut rng).expect("valid");
        assert!(outcome.best.is_feasible());
        assert!((outcome.best.total_cost() - 6.0).abs() < 1e-9);

        let err = multi_start_annealing(&inst, 0, &config, &mut rng).expect_err("no starts");
        assert_eq!(err, SolveError::Config(ConfigError::NoStarts));
    }
}
