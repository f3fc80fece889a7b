//! Generational genetic algorithm for the open-route TSP.
//!
//! The run is a finite state machine:
//!
//! ```text
//! Initialize -> SelectParents -> Crossover -> Mutation -> Replace
//!                     ^                                     |
//!                     +-------------------------------------+--> Terminate
//! ```
//!
//! Each generation breeds one child from the two fittest members, mutates
//! it, and lets it replace the weakest member. The run stops after
//! `max_generations` generations, after `stagnation_limit` generations
//! without a new best-ever fitness, or when a cancellation flag is raised.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GaError, Result};
use crate::genome::Genome;
use crate::heuristics::operators::{order_crossover, replace_worst, select_parents, swap_mutation};
use crate::instance::CityMap;
use crate::permutation::{InitStrategy, PermutationSet};
use crate::population::Population;
use crate::solution::{GenerationStats, Solution, StopReason};

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of cities in each genome
    pub genome_length: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Probability of a swap mutation on each child
    pub mutation_rate: f64,
    /// Maximum generations without improvement of the best-ever fitness
    pub stagnation_limit: usize,
    /// Random seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// How initial genomes are drawn
    pub init_strategy: InitStrategy,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 10,
            genome_length: 8,
            max_generations: 5,
            mutation_rate: 1.0,
            stagnation_limit: 3,
            seed: Some(42),
            init_strategy: InitStrategy::Enumerate,
        }
    }
}

impl GAConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_genome_length(mut self, n: usize) -> Self {
        self.genome_length = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the mutation rate, clamped to [0, 1].
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_init_strategy(mut self, strategy: InitStrategy) -> Self {
        self.init_strategy = strategy;
        self
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(GaError::InvalidConfig("population_size must be at least 2".into()));
        }
        if self.genome_length < 2 {
            return Err(GaError::InvalidConfig("genome_length must be at least 2".into()));
        }
        if self.max_generations == 0 {
            return Err(GaError::InvalidConfig("max_generations must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(GaError::InvalidConfig(format!(
                "mutation_rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.stagnation_limit == 0 {
            return Err(GaError::InvalidConfig("stagnation_limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// States of the evolution driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Initialize,
    SelectParents,
    Crossover,
    Mutation,
    Replace,
    Terminate,
}

impl State {
    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Initialize, State::SelectParents)
                | (State::SelectParents, State::Crossover)
                | (State::Crossover, State::Mutation)
                | (State::Mutation, State::Replace)
                | (State::Replace, State::SelectParents)
                | (State::Replace, State::Terminate)
        )
    }
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a> {
    config: GAConfig,
    cities: &'a CityMap,
    population: Population,
    parents: Option<(Genome, Genome)>,
    offspring: Option<Genome>,
    state: State,
    rng: ChaCha8Rng,
    generation: usize,
    best_fitness: f64,
    stagnation: usize,
    worst_initial_distance: f64,
    stop_reason: Option<StopReason>,
    history: Vec<GenerationStats>,
    observer: Option<Box<dyn FnMut(&GenerationStats, &Genome) + 'a>>,
}

impl<'a> GeneticAlgorithm<'a> {
    /// Validate `config` against `cities` and prepare a run.
    pub fn new(cities: &'a CityMap, config: GAConfig) -> Result<Self> {
        config.validate()?;
        if config.genome_length > cities.len() {
            return Err(GaError::InvalidConfig(format!(
                "genome_length {} exceeds the {} available cities",
                config.genome_length,
                cities.len()
            )));
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let population = Population::new(config.population_size);

        Ok(GeneticAlgorithm {
            config,
            cities,
            population,
            parents: None,
            offspring: None,
            state: State::Initialize,
            rng,
            generation: 0,
            best_fitness: 0.0,
            stagnation: 0,
            worst_initial_distance: 0.0,
            stop_reason: None,
            history: Vec::new(),
            observer: None,
        })
    }

    /// Register a callback invoked with every generation's statistics and
    /// the child that was inserted.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&GenerationStats, &Genome) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    fn transition(&mut self, next: State) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(GaError::IllegalTransition { from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }

    /// Fill the population with independent uniformly random genomes
    fn initialize_population(&mut self) -> Result<()> {
        let size = self.config.population_size;
        let length = self.config.genome_length;
        self.population = Population::with_capacity(size)?;

        match self.config.init_strategy {
            InitStrategy::Enumerate => {
                if length > 10 {
                    log::warn!("Enumerating {}! permutations; consider the shuffle strategy", length);
                }
                let permutations = PermutationSet::of_range(length)?;
                for _ in 0..size {
                    let genome = Genome::new(permutations.sample(&mut self.rng), self.cities)?;
                    self.population.append(&genome)?;
                }
            }
            InitStrategy::Shuffle => {
                for _ in 0..size {
                    let genome = Genome::random(length, InitStrategy::Shuffle, self.cities, &mut self.rng)?;
                    self.population.append(&genome)?;
                }
            }
        }

        self.generation = 0;
        self.best_fitness = 0.0;
        self.stagnation = 0;
        self.worst_initial_distance = self.population.weakest().map(Genome::distance).unwrap_or(0.0);

        log::info!(
            "Initialized population: {} genomes of {} cities ({:?})",
            self.population.len(),
            length,
            self.config.init_strategy
        );
        Ok(())
    }

    /// Execute the current state and move to the next one.
    fn step(&mut self, cancel: Option<&AtomicBool>) -> Result<()> {
        match self.state {
            State::Initialize => {
                self.initialize_population()?;
                self.transition(State::SelectParents)
            }
            State::SelectParents => {
                self.parents = Some(select_parents(&self.population)?);
                self.transition(State::Crossover)
            }
            State::Crossover => {
                let (first, second) = self.parents.take().ok_or(GaError::MissingStateData("parents"))?;
                self.offspring = Some(order_crossover(&first, &second, self.cities, &mut self.rng)?);
                self.transition(State::Mutation)
            }
            State::Mutation => {
                let child = self.offspring.as_mut().ok_or(GaError::MissingStateData("offspring"))?;
                swap_mutation(child, self.config.mutation_rate, self.cities, &mut self.rng);
                self.transition(State::Replace)
            }
            State::Replace => {
                let child = self.offspring.take().ok_or(GaError::MissingStateData("offspring"))?;
                replace_worst(&mut self.population, &child)?;
                self.generation += 1;

                let current_best = self.population.best().map(Genome::fitness).unwrap_or(0.0);
                self.record_generation(current_best, child.fitness());
                if let (Some(observer), Some(stats)) = (self.observer.as_mut(), self.history.last()) {
                    observer(stats, &child);
                }

                log::debug!(
                    "Generation {:3} | Best Fitness: {:.4} | Stagnation: {:2}",
                    self.generation,
                    self.best_fitness,
                    self.stagnation
                );

                let cancelled = cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false);
                if self.generation >= self.config.max_generations {
                    self.stop_reason = Some(StopReason::MaxGenerations);
                } else if self.stagnation >= self.config.stagnation_limit {
                    self.stop_reason = Some(StopReason::Stagnation);
                } else if cancelled {
                    log::warn!("Evolution cancelled after {} generations", self.generation);
                    self.stop_reason = Some(StopReason::Cancelled);
                }

                if self.stop_reason.is_some() {
                    self.transition(State::Terminate)
                } else {
                    self.transition(State::SelectParents)
                }
            }
            State::Terminate => Err(GaError::IllegalTransition { from: State::Terminate, to: State::Terminate }),
        }
    }

    /// Update best-ever fitness and the stagnation counter
    fn record_generation(&mut self, current_best: f64, child_fitness: f64) {
        if current_best > self.best_fitness {
            self.best_fitness = current_best;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }

        self.history.push(GenerationStats {
            generation: self.generation,
            best_fitness_ever: self.best_fitness,
            current_best_fitness: current_best,
            child_fitness,
            stagnation: self.stagnation,
        });
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> Result<Solution> {
        self.run_with_cancel(None)
    }

    /// Run with an optional cooperative cancellation flag, checked once per
    /// generation.
    pub fn run_with_cancel(&mut self, cancel: Option<Arc<AtomicBool>>) -> Result<Solution> {
        let start = Instant::now();
        log::info!(
            "Starting evolution: population={}, cities={}, max_generations={}, mutation_rate={}, stagnation_limit={}",
            self.config.population_size,
            self.config.genome_length,
            self.config.max_generations,
            self.config.mutation_rate,
            self.config.stagnation_limit
        );

        while self.state != State::Terminate {
            self.step(cancel.as_deref())?;
        }

        let best = self.population.best().cloned().ok_or(GaError::MissingStateData("population"))?;
        let stop_reason = self.stop_reason.unwrap_or(StopReason::MaxGenerations);

        log::info!(
            "Evolution finished after {} generations ({:?}): best distance {:.3}",
            self.generation,
            stop_reason,
            best.distance()
        );

        Ok(Solution {
            distance: best.distance(),
            fitness: best.fitness(),
            best_fitness_ever: self.best_fitness,
            worst_initial_distance: self.worst_initial_distance,
            generations: self.generation,
            stop_reason,
            algorithm: format!("GA ({:?})", self.config.init_strategy),
            computation_time: start.elapsed().as_secs_f64(),
            history: self.history.clone(),
            best,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    pub fn best_fitness_ever(&self) -> f64 {
        self.best_fitness
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }
}

/// Evolve a population over `cities` and return the fittest surviving genome.
pub fn run_evolution(cities: &CityMap, config: GAConfig) -> Result<Genome> {
    let mut ga = GeneticAlgorithm::new(cities, config)?;
    Ok(ga.run()?.best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> CityMap {
        CityMap::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    fn square_config() -> GAConfig {
        GAConfig::default()
            .with_population_size(5)
            .with_genome_length(4)
            .with_max_generations(5)
            .with_mutation_rate(1.0)
    }

    #[test]
    fn test_default_config() {
        let config = GAConfig::default();
        assert_eq!(config.population_size, 10);
        assert_eq!(config.genome_length, 8);
        assert_eq!(config.max_generations, 5);
        assert_eq!(config.stagnation_limit, 3);
        assert!((config.mutation_rate - 1.0).abs() < 1e-12);
        assert_eq!(config.init_strategy, InitStrategy::Enumerate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert!(GAConfig::default().with_population_size(1).validate().is_err());
        assert!(GAConfig::default().with_genome_length(1).validate().is_err());
        assert!(GAConfig::default().with_max_generations(0).validate().is_err());
        assert!(GAConfig::default().with_stagnation_limit(0).validate().is_err());

        let mut config = GAConfig::default();
        config.mutation_rate = 1.5;
        assert!(config.validate().is_err());
        config.mutation_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_genome_longer_than_map_is_rejected() {
        let cities = square();
        let config = GAConfig::default().with_genome_length(5);
        assert!(matches!(GeneticAlgorithm::new(&cities, config), Err(GaError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_json() {
        let path = std::env::temp_dir().join(format!("tsp_genetic_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"population_size": 6, "init_strategy": "shuffle"}"#).unwrap();

        let config = GAConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.population_size, 6);
        assert_eq!(config.init_strategy, InitStrategy::Shuffle);
        assert_eq!(config.genome_length, 8);
    }

    #[test]
    fn test_state_transitions() {
        use State::*;
        assert!(Initialize.can_transition_to(SelectParents));
        assert!(Replace.can_transition_to(SelectParents));
        assert!(Replace.can_transition_to(Terminate));
        assert!(!Initialize.can_transition_to(Crossover));
        assert!(!Mutation.can_transition_to(SelectParents));
        assert!(!Terminate.can_transition_to(SelectParents));
        assert!(!Crossover.can_transition_to(Replace));
    }

    #[test]
    fn test_square_scenario() {
        let cities = square();
        let mut ga = GeneticAlgorithm::new(&cities, square_config()).unwrap();
        let solution = ga.run().unwrap();

        assert_eq!(ga.state(), State::Terminate);
        assert!(solution.generations <= 5);
        assert!(solution.distance <= solution.worst_initial_distance + 1e-9);
        assert!(solution.best.is_valid());
        let mut sorted = solution.best.path().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
        assert_eq!(ga.population().len(), 5);
    }

    #[test]
    fn test_stagnation_counter_follows_best_ever() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let cities = CityMap::random(8, &mut rng);
        let config = GAConfig::default()
            .with_max_generations(200)
            .with_stagnation_limit(200)
            .with_mutation_rate(0.5);
        let solution = GeneticAlgorithm::new(&cities, config).unwrap().run().unwrap();

        let mut best_ever = 0.0;
        let mut stagnation = 0;
        for stats in &solution.history {
            if stats.current_best_fitness > best_ever {
                best_ever = stats.current_best_fitness;
                stagnation = 0;
            } else {
                stagnation += 1;
            }
            assert_eq!(stats.stagnation, stagnation, "generation {}", stats.generation);
            assert_eq!(stats.best_fitness_ever, best_ever);
        }
    }

    #[test]
    fn test_stagnation_stops_run() {
        let cities = square();
        let config = square_config()
            .with_max_generations(1000)
            .with_stagnation_limit(2)
            .with_mutation_rate(0.0);
        let solution = GeneticAlgorithm::new(&cities, config).unwrap().run().unwrap();

        assert_eq!(solution.stop_reason, StopReason::Stagnation);
        assert!(solution.generations < 1000);
        assert_eq!(solution.history.last().unwrap().stagnation, 2);
    }

    #[test]
    fn test_max_generations_stops_run() {
        let cities = square();
        let config = square_config().with_max_generations(3).with_stagnation_limit(100);
        let solution = GeneticAlgorithm::new(&cities, config).unwrap().run().unwrap();

        assert_eq!(solution.generations, 3);
        assert_eq!(solution.history.len(), 3);
        assert_eq!(solution.stop_reason, StopReason::MaxGenerations);
    }

    #[test]
    fn test_cancellation_stops_after_one_generation() {
        let cities = square();
        let config = square_config().with_max_generations(100).with_stagnation_limit(100);
        let flag = Arc::new(AtomicBool::new(true));
        let solution = GeneticAlgorithm::new(&cities, config)
            .unwrap()
            .run_with_cancel(Some(flag))
            .unwrap();

        assert_eq!(solution.generations, 1);
        assert_eq!(solution.stop_reason, StopReason::Cancelled);
    }

    #[test]
    fn test_observer_sees_every_child() {
        let cities = square();
        let mut seen = Vec::new();
        let config = square_config().with_stagnation_limit(100);
        let solution = GeneticAlgorithm::new(&cities, config)
            .unwrap()
            .with_observer(|stats, child| seen.push((stats.generation, child.is_valid())))
            .run()
            .unwrap();

        assert_eq!(seen.len(), solution.generations);
        assert!(seen.iter().enumerate().all(|(i, &(generation, valid))| generation == i + 1 && valid));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let cities = CityMap::random(7, &mut rng);
        let config = GAConfig::default().with_genome_length(7).with_max_generations(50);

        let a = run_evolution(&cities, config.clone()).unwrap();
        let b = run_evolution(&cities, config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_strategy_runs() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let cities = CityMap::random(30, &mut rng);
        let config = GAConfig::default()
            .with_genome_length(30)
            .with_population_size(20)
            .with_max_generations(100)
            .with_init_strategy(InitStrategy::Shuffle);

        let best = run_evolution(&cities, config).unwrap();
        assert_eq!(best.len(), 30);
        assert!(best.is_valid());
    }
}
