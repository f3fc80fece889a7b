//! Benchmarking module for the genetic solver.
//!
//! Runs the engine repeatedly on one city map with different seeds,
//! collects per-run results, and aggregates them into statistics.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Median, Min};

use crate::error::Result;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use crate::instance::CityMap;
use crate::solution::StopReason;

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Map name
    pub map: String,
    /// Number of cities in the route
    pub cities: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Open-route length of the best genome
    pub distance: f64,
    pub fitness: f64,
    /// Completed generations
    pub generations: usize,
    pub stop_reason: StopReason,
    /// Computation time in seconds
    pub time: f64,
    /// Best route as space-separated city ids
    pub tour: String,
}

/// Aggregated statistics over all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub num_runs: usize,
    pub mean_distance: f64,
    pub std_distance: f64,
    pub best_distance: f64,
    pub worst_distance: f64,
    pub median_distance: f64,
    pub mean_generations: f64,
    /// Largest generation count of any run
    pub most_generations: f64,
    /// Runs that stopped on stagnation rather than the generation cap
    pub stagnated_runs: usize,
    pub mean_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs; run `i` uses seed `base_seed + i`, wrapping at `u64::MAX`
    pub num_runs: usize,
    /// First seed
    pub base_seed: u64,
    /// Run in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 10,
            base_seed: 0,
            parallel: true,
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
    started_at: chrono::DateTime<chrono::Local>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            started_at: chrono::Local::now(),
        }
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(self.config.num_runs as u64);
        let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} runs {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    /// Execute one seeded run
    fn run_once(cities: &CityMap, ga_config: &GAConfig, seed: u64) -> Result<RunResult> {
        let config = ga_config.clone().with_seed(Some(seed));
        let solution = GeneticAlgorithm::new(cities, config)?.run()?;

        Ok(RunResult {
            map: cities.name.clone(),
            cities: solution.best.len(),
            seed,
            distance: solution.distance,
            fitness: solution.fitness,
            generations: solution.generations,
            stop_reason: solution.stop_reason,
            time: solution.computation_time,
            tour: solution.tour().iter().map(|c| c.to_string()).collect::<Vec<_>>().join(" "),
        })
    }

    /// Run the engine `num_runs` times on `cities`.
    ///
    /// Runs are independent; in parallel mode they share the map read-only
    /// and each owns its own population and RNG.
    pub fn run(&mut self, cities: &CityMap, ga_config: &GAConfig) -> Result<()> {
        log::info!(
            "Benchmarking {} runs on map '{}' ({} cities, parallel: {})",
            self.config.num_runs,
            cities.name,
            ga_config.genome_length,
            self.config.parallel
        );
        self.started_at = chrono::Local::now();

        let seeds: Vec<u64> = (0..self.config.num_runs as u64).map(|i| self.config.base_seed.wrapping_add(i)).collect();
        let bar = self.progress_bar();

        let results: Result<Vec<RunResult>> = if self.config.parallel {
            seeds
                .par_iter()
                .map(|&seed| {
                    let result = Self::run_once(cities, ga_config, seed);
                    bar.inc(1);
                    result
                })
                .collect()
        } else {
            seeds
                .iter()
                .map(|&seed| {
                    let result = Self::run_once(cities, ga_config, seed);
                    bar.inc(1);
                    result
                })
                .collect()
        };

        bar.finish_with_message("done");
        let mut results = results?;
        results.sort_by_key(|r| r.seed);
        self.results.extend(results);
        Ok(())
    }

    /// Compute statistics across all recorded runs
    pub fn compute_statistics(&self) -> Option<RunStatistics> {
        if self.results.is_empty() {
            return None;
        }

        let distances = Data::new(self.results.iter().map(|r| r.distance).collect::<Vec<f64>>());
        let generations = Data::new(self.results.iter().map(|r| r.generations as f64).collect::<Vec<f64>>());
        let times: Vec<f64> = self.results.iter().map(|r| r.time).collect();
        let total_time: f64 = times.iter().sum();

        let std_distance = if self.results.len() > 1 {
            distances.std_dev().unwrap_or(0.0)
        } else {
            0.0
        };

        Some(RunStatistics {
            num_runs: self.results.len(),
            mean_distance: distances.mean().unwrap_or(f64::NAN),
            std_distance,
            best_distance: distances.min(),
            worst_distance: distances.max(),
            median_distance: distances.median(),
            mean_generations: generations.mean().unwrap_or(f64::NAN),
            most_generations: generations.max(),
            stagnated_runs: self
                .results
                .iter()
                .filter(|r| r.stop_reason == StopReason::Stagnation)
                .count(),
            mean_time: total_time / times.len() as f64,
            total_time,
        })
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        if let Some(stats) = self.compute_statistics() {
            writer.serialize(stats)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Open-route TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Started: {}\n\n", self.started_at.format("%Y-%m-%d %H:%M:%S")));

        report.push_str("Runs:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<8} {:>12} {:>12} {:>16} {:>10}\n",
            "Seed", "Distance", "Generations", "Stop", "Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for r in &self.results {
            report.push_str(&format!(
                "{:<8} {:>12.4} {:>12} {:>16} {:>10.4}\n",
                r.seed,
                r.distance,
                r.generations,
                r.stop_reason.to_string(),
                r.time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        match self.compute_statistics() {
            Some(stats) => {
                report.push_str("\nSummary:\n");
                report.push_str(&format!(
                    "  Distance: mean {:.4} | std {:.4} | best {:.4} | worst {:.4} | median {:.4}\n",
                    stats.mean_distance,
                    stats.std_distance,
                    stats.best_distance,
                    stats.worst_distance,
                    stats.median_distance
                ));
                report.push_str(&format!(
                    "  Generations: mean {:.2} | max {:.0} | stagnated {}/{}\n",
                    stats.mean_generations, stats.most_generations, stats.stagnated_runs, stats.num_runs
                ));
                report.push_str(&format!(
                    "  Time: mean {:.4}s | total {:.4}s\n",
                    stats.mean_time, stats.total_time
                ));
            }
            None => report.push_str("\nNo runs recorded.\n"),
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }
}
