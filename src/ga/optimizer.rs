//! Generational genetic optimizer over assignment grids.
//!
//! # Generation
//!
//! 1. Rank the current population: `rank(c)` = number of chromosomes whose
//!    fitness is `>= c.fitness`, minus one (O(p²)).
//! 2. Copy the best chromosome into the first two slots of the next
//!    generation (elitism).
//! 3. Fill the remaining slots with offspring: select two distinct parents
//!    by rank, recombine them with probability `crossover_prob`, otherwise
//!    copy them unchanged.
//! 4. Evaluate the offspring; always mutate the worst one and mutate each
//!    other with probability `mutation_prob`. Elite slots are never
//!    mutated, so the best fitness never worsens.
//! 5. Swap the buffers.
//!
//! The current and next generations live in two separate vectors; the
//! current one is never written while offspring are assembled.
//!
//! # Preliminary runs
//!
//! With `num_prelim_runs > 0`, short independent runs precede the main
//! one and the `population / num_prelim_runs` fittest chromosomes of each
//! seed the main population.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::constructive::{greedy, random_greedy};
use crate::error::{ConfigError, SolveError};
use crate::models::{ProblemInstance, Solution};

use super::chromosome::Chromosome;
use super::config::GaConfig;
use super::operators::mutate;

/// Population summary recorded after a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Zero-based generation index within the main run.
    pub generation: usize,
    /// Lowest fitness in the population.
    pub best_fitness: f64,
    /// Mean fitness over feasible chromosomes, `None` if there are none.
    pub mean_feasible_fitness: Option<f64>,
    /// Number of feasible chromosomes.
    pub feasible_count: usize,
    /// Genes differing from the best chromosome, summed over the
    /// population. Falls as the population converges.
    pub deviation: usize,
}

/// Result of a genetic run.
#[derive(Debug, Clone)]
pub struct GaOutcome<'a> {
    /// Decoded best chromosome of the final population.
    pub best: Solution<'a>,
    /// Its fitness.
    pub best_fitness: f64,
    /// Main-run generations performed.
    pub generations: usize,
    /// Per-generation statistics (empty unless enabled).
    pub statistics: Vec<GenerationStats>,
}

/// Genetic optimizer over a fixed-size population of assignment grids.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::ga::{GaConfig, GeneticOptimizer};
/// use u_dispatch::models::{CustomerGroup, ProblemInstance, Shape};
///
/// let costs = CostTensor::from_fn(Shape::new(3, 1, 1), |i, j, _, _| if i == j { 0.0 } else { (1 + i + j) as f64 });
/// let instance = ProblemInstance::new(
///     vec![1],
///     vec![0, 2, 2],
///     costs,
///     vec![CustomerGroup::new(0, 0, 0, 5)],
/// )
/// .unwrap();
///
/// let config = GaConfig::default().with_population_size(10).with_max_generations(20);
/// let mut rng = StdRng::seed_from_u64(42);
/// let outcome = GeneticOptimizer::new(&instance, config).unwrap().run(&mut rng).unwrap();
/// assert!(outcome.best.is_feasible());
/// assert!((outcome.best_fitness - 10.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct GeneticOptimizer<'a> {
    instance: &'a ProblemInstance,
    config: GaConfig,
    population: Vec<Chromosome>,
    next: Vec<Chromosome>,
    best_index: usize,
    worst_index: usize,
    generation: usize,
    statistics: Vec<GenerationStats>,
}

impl<'a> GeneticOptimizer<'a> {
    /// Creates an optimizer with an empty population.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(instance: &'a ProblemInstance, config: GaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            instance,
            population: Vec::with_capacity(config.population_size),
            next: Vec::with_capacity(config.population_size),
            config,
            best_index: 0,
            worst_index: 0,
            generation: 0,
            statistics: Vec::new(),
        })
    }

    /// The configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Current population.
    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    /// Main-run generations performed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Statistics recorded so far.
    pub fn statistics(&self) -> &[GenerationStats] {
        &self.statistics
    }

    /// Best chromosome of the current population, once ranked.
    pub fn best(&self) -> Option<&Chromosome> {
        self.population.get(self.best_index)
    }

    /// Worst chromosome of the current population, once ranked.
    pub fn worst(&self) -> Option<&Chromosome> {
        self.population.get(self.worst_index)
    }

    /// Builds the initial population, running the preliminary runs first
    /// when configured.
    ///
    /// # Errors
    ///
    /// Propagates constructive and decoding failures, which indicate bugs.
    pub fn initialize<R: Rng>(&mut self, rng: &mut R) -> Result<(), SolveError> {
        let mut seeds = Vec::new();
        let per_run = self.config.prelim_survivors_per_run();
        for run in 0..self.config.num_prelim_runs {
            self.fill_population(Vec::new(), rng)?;
            for _ in 0..self.config.max_prelim_generations {
                self.advance(rng)?;
            }
            self.rank();
            let mut order: Vec<usize> = (0..self.population.len()).collect();
            order.sort_by(|&a, &b| {
                self.population[a]
                    .fitness()
                    .total_cmp(&self.population[b].fitness())
            });
            seeds.extend(order.iter().take(per_run).map(|&i| self.population[i].clone()));
            info!(
                run,
                best_fitness = self.population[self.best_index].fitness(),
                survivors = per_run,
                "preliminary run finished"
            );
        }

        self.fill_population(seeds, rng)?;
        self.generation = 0;
        self.statistics.clear();
        Ok(())
    }

    /// Runs one main-run generation.
    ///
    /// # Errors
    ///
    /// Propagates decoding failures, which indicate bugs.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<(), SolveError> {
        self.advance(rng)?;
        if self.config.compute_statistics {
            let stats = self.stats();
            self.statistics.push(stats);
        }
        debug!(
            generation = self.generation,
            best_fitness = self.population[self.best_index].fitness(),
            feasible = self.population.iter().filter(|c| c.is_feasible()).count(),
            "generation finished"
        );
        self.generation += 1;
        Ok(())
    }

    /// Initializes, evolves for `max_generations` and decodes the best
    /// chromosome of the final population.
    ///
    /// # Errors
    ///
    /// Propagates constructive and decoding failures, which indicate bugs.
    #[instrument(skip_all, fields(population = self.config.population_size, generations = self.config.max_generations))]
    pub fn run<R: Rng>(mut self, rng: &mut R) -> Result<GaOutcome<'a>, SolveError> {
        self.initialize(rng)?;
        for _ in 0..self.config.max_generations {
            self.step(rng)?;
        }
        self.rank();

        let best = &self.population[self.best_index];
        let best_fitness = best.fitness();
        let solution = best.to_solution(self.instance)?;
        info!(
            generations = self.generation,
            best_fitness,
            feasibility = %solution.feasibility(),
            "genetic run finished"
        );
        Ok(GaOutcome {
            best: solution,
            best_fitness,
            generations: self.generation,
            statistics: self.statistics,
        })
    }

    /// Replaces the population with `seeds` topped up by fresh chromosomes,
    /// then ranks it.
    fn fill_population<R: Rng>(&mut self, seeds: Vec<Chromosome>, rng: &mut R) -> Result<(), SolveError> {
        self.population.clear();
        self.population.extend(seeds.into_iter().take(self.config.population_size));
        while self.population.len() < self.config.population_size {
            let solution = if rng.random_bool(self.config.greedy_init_ratio) {
                greedy(self.instance)?
            } else {
                random_greedy(self.instance, rng)?
            };
            self.population.push(Chromosome::from_solution(&solution));
        }
        self.rank();
        Ok(())
    }

    /// Ranks the population and records the best and worst indices.
    fn rank(&mut self) {
        let fitness: Vec<f64> = self.population.iter().map(Chromosome::fitness).collect();
        for (chrom, &own) in self.population.iter_mut().zip(&fitness) {
            let at_least = fitness.iter().filter(|&&f| f >= own).count();
            chrom.set_rank(at_least.saturating_sub(1));
        }
        self.best_index = argmin(&fitness);
        self.worst_index = argmax(&fitness);
    }

    /// Produces the next generation and swaps it in.
    fn advance<R: Rng>(&mut self, rng: &mut R) -> Result<(), SolveError> {
        let size = self.config.population_size;
        let elite = self.population[self.best_index].clone();

        self.next.clear();
        self.next.push(elite.clone());
        self.next.push(elite);

        while self.next.len() < size {
            let first = self.select_parent(rng, None);
            let second = self.select_parent(rng, Some(first));
            let mut a = self.population[first].clone();
            let mut b = self.population[second].clone();
            if rng.random_bool(self.config.crossover_prob) {
                self.config.crossover.apply(a.grid_mut(), b.grid_mut(), rng);
                a.evaluate(self.instance)?;
                b.evaluate(self.instance)?;
            }
            self.next.push(a);
            if self.next.len() < size {
                self.next.push(b);
            }
        }

        // Mutation over offspring only; slots 0 and 1 hold the elite.
        if self.next.len() > 2 {
            let worst = 2 + argmax(
                &self.next[2..]
                    .iter()
                    .map(Chromosome::fitness)
                    .collect::<Vec<_>>(),
            );
            for index in 2..self.next.len() {
                if index == worst || rng.random_bool(self.config.mutation_prob) {
                    let chrom = &mut self.next[index];
                    if mutate(chrom.grid_mut(), self.instance, rng) {
                        chrom.evaluate(self.instance)?;
                    }
                }
            }
        }

        std::mem::swap(&mut self.population, &mut self.next);
        self.rank();
        Ok(())
    }

    /// Draws a parent: a uniform candidate is accepted outright with
    /// `random_selection_chance` percent, otherwise with probability
    /// `(rank + 1) / population`.
    fn select_parent<R: Rng>(&self, rng: &mut R, exclude: Option<usize>) -> usize {
        let n = self.population.len();
        loop {
            let index = rng.random_range(0..n);
            if Some(index) == exclude {
                continue;
            }
            if self.config.random_selection_chance > rng.random_range(0..100) {
                return index;
            }
            if self.population[index].rank() + 1 > rng.random_range(0..n) {
                return index;
            }
        }
    }

    fn stats(&self) -> GenerationStats {
        let best = &self.population[self.best_index];
        let feasible: Vec<f64> = self
            .population
            .iter()
            .filter(|c| c.is_feasible())
            .map(Chromosome::fitness)
            .collect();
        let mean_feasible_fitness = if feasible.is_empty() {
            None
        } else {
            Some(feasible.iter().sum::<f64>() / feasible.len() as f64)
        };
        GenerationStats {
            generation: self.generation,
            best_fitness: best.fitness(),
            mean_feasible_fitness,
            feasible_count: feasible.len(),
            deviation: self
                .population
                .iter()
                .map(|c| c.grid().differing_genes(best.grid()))
                .sum(),
        }
    }
}

/// Index of the first minimum.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[best] {
            best = i;
        }
    }
    best
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    let mut worst = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[worst] {
            worst = i;
        }
    }
    worst
}
