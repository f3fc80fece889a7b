//! Permutation enumeration and uniform random orderings.
//!
//! [`PermutationSet`] materialises every ordering of an index sequence using
//! Heap's algorithm. Drawing a uniform index into the set yields a uniformly
//! random permutation, at O(N!) time and memory. [`InitStrategy::Shuffle`] is
//! the Fisher–Yates alternative that avoids the enumeration entirely.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GaError, Result};

/// Largest `n` for which `n!` fits in a `usize` on 64-bit targets.
pub const MAX_FACTORIAL_INPUT: usize = 20;

/// Checked `n!`. Fails with [`GaError::ResourceExhausted`] on overflow.
pub fn factorial(n: usize) -> Result<usize> {
    (1..=n).try_fold(1usize, |acc, k| acc.checked_mul(k)).ok_or_else(|| GaError::ResourceExhausted {
        what: "permutation table",
        requested: format!("{}!", n),
    })
}

/// How initial genomes draw their random ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// Enumerate all N! orderings once, then index into them
    #[default]
    Enumerate,
    /// Fisher–Yates shuffle of the identity ordering
    Shuffle,
}

/// Every ordering of a fixed index sequence, stored contiguously.
#[derive(Debug, Clone)]
pub struct PermutationSet {
    width: usize,
    count: usize,
    data: Vec<usize>,
}

impl PermutationSet {
    /// Enumerate all orderings of `indices`.
    ///
    /// Storage for `N! * N` entries is reserved up front; if that
    /// reservation cannot be satisfied the call fails instead of aborting.
    pub fn of_indices(indices: &[usize]) -> Result<Self> {
        let width = indices.len();
        let count = factorial(width)?;
        let total = count.checked_mul(width).ok_or_else(|| GaError::ResourceExhausted {
            what: "permutation table",
            requested: format!("{}! x {}", width, width),
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(total).map_err(|_| GaError::ResourceExhausted {
            what: "permutation table",
            requested: total.to_string(),
        })?;

        if width > 0 {
            let mut working = indices.to_vec();
            heap_permute(&mut working, width, &mut data);
        }

        log::trace!("Enumerated {} permutations of width {}", count, width);
        Ok(PermutationSet { width, count, data })
    }

    /// All orderings of `0..n`
    pub fn of_range(n: usize) -> Result<Self> {
        let indices: Vec<usize> = (0..n).collect();
        Self::of_indices(&indices)
    }

    /// Number of permutations (N!)
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length of each permutation (N)
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, index: usize) -> Option<&[usize]> {
        if index >= self.count {
            return None;
        }
        let start = index * self.width;
        Some(&self.data[start..start + self.width])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.count).filter_map(move |i| self.get(i))
    }

    /// Uniformly pick one stored permutation and return an owned copy
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let index = rng.gen_range(0..self.count);
        self.get(index).map(|p| p.to_vec()).unwrap_or_default()
    }
}

/// Heap's algorithm: permute `a[..size]`, emitting a copy of the whole
/// sequence each time the active length reaches 1.
fn heap_permute(a: &mut [usize], size: usize, out: &mut Vec<usize>) {
    if size == 1 {
        out.extend_from_slice(a);
        return;
    }

    for i in 0..size {
        heap_permute(a, size - 1, out);
        if size % 2 == 0 {
            a.swap(i, size - 1);
        } else {
            a.swap(0, size - 1);
        }
    }
}

/// Draw a single uniformly random ordering of `0..n`.
pub fn random_permutation<R: Rng + ?Sized>(n: usize, strategy: InitStrategy, rng: &mut R) -> Result<Vec<usize>> {
    match strategy {
        InitStrategy::Enumerate => Ok(PermutationSet::of_range(n)?.sample(rng)),
        InitStrategy::Shuffle => {
            let mut path: Vec<usize> = (0..n).collect();
            path.shuffle(rng);
            Ok(path)
        }
    }
}

/// Check that `path` contains each of `0..path.len()` exactly once
pub fn is_permutation(path: &[usize]) -> bool {
    let mut seen = vec![false; path.len()];
    for &city in path {
        match seen.get_mut(city) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
