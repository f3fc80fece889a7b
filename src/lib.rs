//! Open-route TSP Genetic Solver Library
//!
//! A generational genetic algorithm for the open-route Euclidean Travelling
//! Salesman Problem: find a short path visiting every city exactly once,
//! without returning to the start.
//!
//! # Features
//!
//! - Uniform random initial routes, by full permutation enumeration or shuffle
//! - Elitist parent selection, order crossover, swap mutation
//! - Replace-worst generational loop with stagnation detection
//! - Seeded, reproducible runs and cooperative cancellation
//! - Benchmarking, text reports and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use tsp_genetic::heuristics::genetic::{GAConfig, GeneticAlgorithm};
//! use tsp_genetic::instance::CityMap;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let cities = CityMap::random(8, &mut rng);
//!
//! let config = GAConfig::default().with_max_generations(50);
//! let mut ga = GeneticAlgorithm::new(&cities, config).unwrap();
//! let solution = ga.run().unwrap();
//!
//! println!("Route length: {:.2}", solution.distance);
//! ```

pub mod error;
pub mod instance;
pub mod permutation;
pub mod genome;
pub mod population;
pub mod heuristics;
pub mod solution;
pub mod report;
pub mod benchmark;
pub mod visualization;

pub use error::{GaError, Result};
pub use genome::Genome;
pub use heuristics::genetic::{run_evolution, GAConfig, GeneticAlgorithm};
pub use instance::CityMap;
pub use population::Population;
pub use solution::Solution;
