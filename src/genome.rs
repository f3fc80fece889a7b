//! Genome representation and fitness evaluation.

use rand::Rng;
use serde::Serialize;

use crate::error::{GaError, Result};
use crate::instance::CityMap;
use crate::permutation::{self, InitStrategy};

/// Fitness of an open route: the reciprocal of its total length.
///
/// A route of total length exactly 0 (a single city, or only coincident
/// cities) evaluates to `f64::INFINITY`; this is not guarded.
pub fn fitness(path: &[usize], cities: &CityMap) -> f64 {
    1.0 / cities.path_length(path)
}

/// A candidate visiting order together with its cached fitness
/// Only constructed through [`Genome::new`] and the operators, so the path is
/// always a permutation and the fitness matches it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Genome {
    /// City ids in visiting order; a permutation of `0..len`
    path: Vec<usize>,
    /// Reciprocal of the open-route length (higher is better)
    fitness: f64,
}

impl Genome {
    /// Build a genome from a path, validating that it is a permutation of
    /// `0..path.len()` whose ids all exist in `cities`.
    pub fn new(path: Vec<usize>, cities: &CityMap) -> Result<Self> {
        if path.len() > cities.len() {
            return Err(GaError::InvalidPath(format!(
                "path of length {} exceeds the {} available cities",
                path.len(),
                cities.len()
            )));
        }
        if !permutation::is_permutation(&path) {
            return Err(GaError::InvalidPath(format!("{:?} is not a permutation", path)));
        }
        Ok(Self::evaluated(path, cities))
    }

    /// Build a genome from a path already known to be valid
    pub(crate) fn evaluated(path: Vec<usize>, cities: &CityMap) -> Self {
        let fitness = fitness(&path, cities);
        Genome { path, fitness }
    }

    /// Draw a uniformly random genome of `length` cities
    pub fn random<R: Rng + ?Sized>(
        length: usize,
        strategy: InitStrategy,
        cities: &CityMap,
        rng: &mut R,
    ) -> Result<Self> {
        let path = permutation::random_permutation(length, strategy, rng)?;
        Self::new(path, cities)
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Total route length implied by the cached fitness
    pub fn distance(&self) -> f64 {
        1.0 / self.fitness
    }

    /// Independent copy with its own path storage
    pub fn deep_copy(&self) -> Genome {
        self.clone()
    }

    /// Swap two path positions and refresh the cached fitness
    pub fn swap_positions(&mut self, i: usize, j: usize, cities: &CityMap) {
        self.path.swap(i, j);
        self.evaluate(cities);
    }

    /// Recompute the cached fitness from the current path
    pub fn evaluate(&mut self, cities: &CityMap) {
        self.fitness = fitness(&self.path, cities);
    }

    pub fn is_valid(&self) -> bool {
        permutation::is_permutation(&self.path)
    }
}
