//! Genetic optimizer parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::operators::CrossoverKind;

/// Parameters of a [`GeneticOptimizer`](super::GeneticOptimizer) run.
///
/// # Examples
///
/// ```
/// use u_dispatch::ga::{CrossoverKind, GaConfig};
///
/// let config = GaConfig::default()
///     .with_population_size(20)
///     .with_max_generations(50)
///     .with_crossover(CrossoverKind::Roulette);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    /// Chromosomes per generation, at least 2.
    pub population_size: usize,
    /// Probability that a mating pair is recombined.
    pub crossover_prob: f64,
    /// Percentage (0..=100) of parent draws accepted regardless of rank.
    pub random_selection_chance: u32,
    /// Generations of the main run.
    pub max_generations: usize,
    /// Preliminary runs seeding the main population; 0 disables them.
    pub num_prelim_runs: usize,
    /// Generations of each preliminary run.
    pub max_prelim_generations: usize,
    /// Probability that an offspring (other than the elites and the worst)
    /// is mutated.
    pub mutation_prob: f64,
    /// Crossover operator.
    pub crossover: CrossoverKind,
    /// Probability that an initial chromosome comes from plain greedy
    /// rather than random greedy.
    pub greedy_init_ratio: f64,
    /// Record [`GenerationStats`](super::GenerationStats) every generation.
    pub compute_statistics: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            crossover_prob: 0.7,
            random_selection_chance: 30,
            max_generations: 100,
            num_prelim_runs: 0,
            max_prelim_generations: 0,
            mutation_prob: 0.05,
            crossover: CrossoverKind::OnePoint,
            greedy_init_ratio: 0.3,
            compute_statistics: false,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the crossover probability.
    pub fn with_crossover_prob(mut self, prob: f64) -> Self {
        self.crossover_prob = prob;
        self
    }

    /// Sets the random selection chance in percent.
    pub fn with_random_selection_chance(mut self, chance: u32) -> Self {
        self.random_selection_chance = chance;
        self
    }

    /// Sets the number of main-run generations.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Enables `runs` preliminary runs of `generations` generations each.
    pub fn with_prelim_runs(mut self, runs: usize, generations: usize) -> Self {
        self.num_prelim_runs = runs;
        self.max_prelim_generations = generations;
        self
    }

    /// Sets the mutation probability.
    pub fn with_mutation_prob(mut self, prob: f64) -> Self {
        self.mutation_prob = prob;
        self
    }

    /// Sets the crossover operator.
    pub fn with_crossover(mut self, crossover: CrossoverKind) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the share of plain-greedy initial chromosomes.
    pub fn with_greedy_init_ratio(mut self, ratio: f64) -> Self {
        self.greedy_init_ratio = ratio;
        self
    }

    /// Enables or disables per-generation statistics.
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.compute_statistics = enabled;
        self
    }

    /// Chromosomes each preliminary run contributes to the main population.
    pub fn prelim_survivors_per_run(&self) -> usize {
        if self.num_prelim_runs == 0 {
            0
        } else {
            self.population_size / self.num_prelim_runs
        }
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall {
                size: self.population_size,
            });
        }
        for (name, value) in [
            ("crossover_prob", self.crossover_prob),
            ("mutation_prob", self.mutation_prob),
            ("greedy_init_ratio", self.greedy_init_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.random_selection_chance > 100 {
            return Err(ConfigError::SelectionChance {
                value: self.random_selection_chance,
            });
        }
        if self.num_prelim_runs > self.population_size {
            return Err(ConfigError::TooManyPrelimRuns {
                runs: self.num_prelim_runs,
                population: self.population_size,
            });
        }
        Ok(())
    }
}
