//! Growable population container.
//!
//! Members live in a dense array and are referred to by index. Removal is a
//! swap-remove, so an index is only meaningful until the next removal.

use ordered_float::OrderedFloat;

use crate::error::{GaError, Result};
use crate::genome::Genome;

/// Ordered collection of genomes with explicit, geometrically growing capacity
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Genome>,
    /// Logical capacity; always `>= members.len()`
    capacity: usize,
    /// Capacity adopted when growing from zero
    min_capacity: usize,
}

impl Population {
    /// Empty population that will grow to `min_capacity` on first append
    pub fn new(min_capacity: usize) -> Self {
        Population {
            members: Vec::new(),
            capacity: 0,
            min_capacity: min_capacity.max(1),
        }
    }

    /// Empty population with storage for `capacity` members reserved up front
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut population = Self::new(capacity);
        population.grow_to(capacity.max(1))?;
        Ok(population)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Genome> {
        self.members.get(index)
    }

    pub fn members(&self) -> &[Genome] {
        &self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Genome> {
        self.members.iter()
    }

    fn grow_to(&mut self, new_capacity: usize) -> Result<()> {
        let additional = new_capacity.saturating_sub(self.members.len());
        self.members.try_reserve_exact(additional).map_err(|_| GaError::ResourceExhausted {
            what: "population storage",
            requested: new_capacity.to_string(),
        })?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Store a deep copy of `genome`, doubling capacity when full
    pub fn append(&mut self, genome: &Genome) -> Result<()> {
        if self.members.len() == self.capacity {
            let new_capacity = if self.capacity == 0 {
                self.min_capacity
            } else {
                self.capacity.checked_mul(2).ok_or_else(|| GaError::ResourceExhausted {
                    what: "population storage",
                    requested: format!("2 x {}", self.capacity),
                })?
            };
            log::trace!("Growing population capacity {} -> {}", self.capacity, new_capacity);
            self.grow_to(new_capacity)?;
        }

        self.members.push(genome.deep_copy());
        Ok(())
    }

    /// Remove the member at `index`, moving the last member into its slot.
    /// Out-of-range indices are a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Genome> {
        if index >= self.members.len() {
            return None;
        }
        Some(self.members.swap_remove(index))
    }

    /// Index of the lowest-fitness member (first one on ties)
    pub fn find_weakest(&self) -> Option<usize> {
        self.members
            .iter()
            .enumerate()
            .min_by_key(|(_, g)| OrderedFloat(g.fitness()))
            .map(|(i, _)| i)
    }

    /// Index of the highest-fitness member (first one on ties)
    pub fn find_best(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, genome) in self.members.iter().enumerate() {
            match best {
                Some(b) if genome.fitness() <= self.members[b].fitness() => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn best(&self) -> Option<&Genome> {
        self.find_best().and_then(|i| self.get(i))
    }

    pub fn weakest(&self) -> Option<&Genome> {
        self.find_weakest().and_then(|i| self.get(i))
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Genome;
    type IntoIter = std::slice::Iter<'a, Genome>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
