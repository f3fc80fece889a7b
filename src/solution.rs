//! Result of an evolution run.
//!
//! A [`Solution`] carries the fittest surviving genome together with the
//! run's bookkeeping: why it stopped, how long it took and the per-generation
//! history.

use serde::{Deserialize, Serialize};

use crate::genome::Genome;

/// Why an evolution run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The generation cap was reached
    MaxGenerations,
    /// Best-ever fitness did not improve for `stagnation_limit` generations
    Stagnation,
    /// The cancellation flag was raised
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::MaxGenerations => "max generations",
            StopReason::Stagnation => "stagnation",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Snapshot taken at the end of each generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number
    pub generation: usize,
    pub best_fitness_ever: f64,
    /// Best fitness in the population after replacement
    pub current_best_fitness: f64,
    /// Fitness of the child inserted this generation
    pub child_fitness: f64,
    pub stagnation: usize,
}

/// Outcome of a genetic algorithm run
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    /// Fittest member of the final population
    pub best: Genome,
    /// Open-route length of `best`
    pub distance: f64,
    pub fitness: f64,
    /// Highest fitness observed in any generation
    pub best_fitness_ever: f64,
    /// Length of the worst route in the initial population
    pub worst_initial_distance: f64,
    /// Completed generations
    pub generations: usize,
    pub stop_reason: StopReason,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    pub history: Vec<GenerationStats>,
}

impl Solution {
    /// Visiting order of the best genome
    pub fn tour(&self) -> &[usize] {
        self.best.path()
    }

    /// Relative improvement of the best route over the worst initial route
    pub fn improvement(&self) -> f64 {
        if self.worst_initial_distance <= 0.0 || !self.worst_initial_distance.is_finite() {
            return 0.0;
        }
        (self.worst_initial_distance - self.distance) / self.worst_initial_distance
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Distance: {:.4}", self.distance)?;
        writeln!(f, "  Fitness: {:.6}", self.fitness)?;
        writeln!(f, "  Best fitness ever: {:.6}", self.best_fitness_ever)?;
        writeln!(f, "  Generations: {} ({})", self.generations, self.stop_reason)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour())
    }
}
