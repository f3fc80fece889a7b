//! Genetic operators for path genomes.
//!
//! - [`select_parents`]: deterministic elitism, the two fittest members
//! - [`order_crossover`]: segment-preserving order crossover (OX)
//! - [`swap_mutation`]: probabilistic exchange of two distinct positions
//! - [`replace_worst`]: unconditional eviction of the weakest member

use rand::Rng;

use crate::error::{GaError, Result};
use crate::genome::Genome;
use crate::instance::CityMap;
use crate::population::Population;

/// Deep copies of the two fittest members, best first.
///
/// Ties keep the earliest index: equal fitness never displaces a leader.
/// This is plain elitism rather than a stochastic scheme such as
/// tournament or roulette selection.
pub fn select_parents(population: &Population) -> Result<(Genome, Genome)> {
    let members = population.members();
    if members.len() < 2 {
        return Err(GaError::PopulationTooSmall { required: 2, actual: members.len() });
    }

    let (mut first, mut second) = (0usize, 1usize);
    if members[second].fitness() > members[first].fitness() {
        std::mem::swap(&mut first, &mut second);
    }

    for (i, genome) in members.iter().enumerate().skip(2) {
        if genome.fitness() > members[first].fitness() {
            second = first;
            first = i;
        } else if genome.fitness() > members[second].fitness() {
            second = i;
        }
    }

    log::trace!("Selected parents {} and {}", first, second);
    Ok((members[first].deep_copy(), members[second].deep_copy()))
}

/// Order crossover with a random inclusive segment `[start, end]`.
pub fn order_crossover<R: Rng + ?Sized>(
    parent_a: &Genome,
    parent_b: &Genome,
    cities: &CityMap,
    rng: &mut R,
) -> Result<Genome> {
    let n = parent_a.len();
    if n != parent_b.len() {
        return Err(GaError::LengthMismatch { left: n, right: parent_b.len() });
    }
    if n == 0 {
        return Err(GaError::InvalidPath("cannot recombine empty parents".to_string()));
    }

    let mut start = rng.gen_range(0..n);
    let mut end = rng.gen_range(0..n);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    log::trace!("Crossover segment [{}, {}]", start, end);
    order_crossover_segment(parent_a, parent_b, start, end, cities)
}

/// Order crossover with a fixed segment.
///
/// Positions `start..=end` are copied from `parent_a`. The remaining slots,
/// first those before `start` and then those after `end`, are filled in
/// order with the cities of `parent_b` not already placed.
pub fn order_crossover_segment(
    parent_a: &Genome,
    parent_b: &Genome,
    start: usize,
    end: usize,
    cities: &CityMap,
) -> Result<Genome> {
    let n = parent_a.len();
    if n != parent_b.len() {
        return Err(GaError::LengthMismatch { left: n, right: parent_b.len() });
    }
    if start > end || end >= n {
        return Err(GaError::InvalidPath(format!(
            "segment [{}, {}] out of bounds for length {}", start, end, n
        )));
    }

    let a = parent_a.path();
    let b = parent_b.path();

    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];

    for i in start..=end {
        child[i] = a[i];
        used[a[i]] = true;
    }

    let mut donor = b.iter().copied().filter(|&city| !used[city]);
    for i in (0..start).chain(end + 1..n) {
        child[i] = donor.next().ok_or_else(|| {
            GaError::InvalidPath("parents are not permutations of the same cities".to_string())
        })?;
    }

    Ok(Genome::evaluated(child, cities))
}

/// With probability `rate`, swap two distinct random positions in place.
///
/// Returns whether a swap happened. Genomes shorter than two cities are
/// left untouched.
pub fn swap_mutation<R: Rng + ?Sized>(
    genome: &mut Genome,
    rate: f64,
    cities: &CityMap,
    rng: &mut R,
) -> bool {
    let n = genome.len();
    if n < 2 || rng.gen::<f64>() >= rate {
        return false;
    }

    let (mut i, mut j) = (rng.gen_range(0..n), rng.gen_range(0..n));
    while i == j {
        i = rng.gen_range(0..n);
        j = rng.gen_range(0..n);
    }

    log::trace!("Mutation swaps positions {} and {}", i, j);
    genome.swap_positions(i, j, cities);
    true
}

/// Evict the weakest member, then append a copy of `genome`.
///
/// The child goes in even if it is worse than the member it replaces.
/// Returns the evicted genome, or `None` if the population was empty.
pub fn replace_worst(population: &mut Population, genome: &Genome) -> Result<Option<Genome>> {
    let evicted = population.find_weakest().and_then(|i| population.remove(i));
    population.append(genome)?;
    Ok(evicted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line_map(n: usize) -> CityMap {
        let points: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
        CityMap::from_points(&points)
    }

    fn genome(path: &[usize], cities: &CityMap) -> Genome {
        Genome::new(path.to_vec(), cities).unwrap()
    }

    fn population_of(paths: &[&[usize]], cities: &CityMap) -> Population {
        let mut population = Population::with_capacity(paths.len()).unwrap();
        for path in paths {
            population.append(&genome(path, cities)).unwrap();
        }
        population
    }

    #[test]
    fn test_select_parents_picks_two_fittest() {
        let cities = line_map(4);
        // lengths: 5, 3, 6, 4
        let population = population_of(
            &[&[0, 2, 1, 3], &[0, 1, 2, 3], &[0, 3, 1, 2], &[1, 0, 2, 3]],
            &cities,
        );

        let (first, second) = select_parents(&population).unwrap();
        assert_eq!(first.path(), &[0, 1, 2, 3]);
        assert_eq!(second.path(), &[1, 0, 2, 3]);
    }

    #[test]
    fn test_select_parents_tie_prefers_lower_index() {
        let cities = line_map(4);
        // Indices 1 and 3 share the best length (3).
        let population = population_of(
            &[&[0, 2, 1, 3], &[3, 2, 1, 0], &[0, 3, 1, 2], &[0, 1, 2, 3]],
            &cities,
        );

        let (first, second) = select_parents(&population).unwrap();
        assert_eq!(first.path(), &[3, 2, 1, 0]);
        assert_eq!(second.path(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_select_parents_returns_copies() {
        let cities = line_map(3);
        let population = population_of(&[&[0, 1, 2], &[2, 1, 0]], &cities);

        let (mut first, _) = select_parents(&population).unwrap();
        first.swap_positions(0, 2, &cities);
        assert_eq!(population.get(0).unwrap().path(), &[0, 1, 2]);
    }

    #[test]
    fn test_select_parents_requires_two_members() {
        let cities = line_map(3);
        let population = population_of(&[&[0, 1, 2]], &cities);

        assert!(matches!(
            select_parents(&population),
            Err(GaError::PopulationTooSmall { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_crossover_with_fixed_segment() {
        let cities = line_map(8);
        let a = genome(&[0, 1, 2, 3, 4, 5, 6, 7], &cities);
        let b = genome(&[7, 6, 5, 4, 3, 2, 1, 0], &cities);

        let child = order_crossover_segment(&a, &b, 2, 4, &cities).unwrap();
        // Segment [2,3,4] from a; b's remaining order 7,6,5,1,0 fills
        // positions 0,1 then 5,6,7.
        assert_eq!(child.path(), &[7, 6, 2, 3, 4, 5, 1, 0]);
        assert!((child.fitness() - crate::genome::fitness(child.path(), &cities)).abs() < 1e-12);
    }

    #[test]
    fn test_crossover_full_segment_copies_parent_a() {
        let cities = line_map(5);
        let a = genome(&[4, 0, 3, 1, 2], &cities);
        let b = genome(&[0, 1, 2, 3, 4], &cities);

        let child = order_crossover_segment(&a, &b, 0, 4, &cities).unwrap();
        assert_eq!(child.path(), a.path());
    }

    #[test]
    fn test_crossover_rejects_mismatched_parents() {
        let cities = line_map(5);
        let a = genome(&[0, 1, 2, 3], &cities);
        let b = genome(&[0, 1, 2, 3, 4], &cities);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert!(matches!(
            order_crossover(&a, &b, &cities, &mut rng),
            Err(GaError::LengthMismatch { left: 4, right: 5 })
        ));
        assert!(order_crossover_segment(&a, &a, 3, 4, &cities).is_err());
    }

    #[test]
    fn test_mutation_rate_zero_is_noop() {
        let cities = line_map(6);
        let mut g = genome(&[0, 1, 2, 3, 4, 5], &cities);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..50 {
            assert!(!swap_mutation(&mut g, 0.0, &cities, &mut rng));
        }
        assert_eq!(g.path(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mutation_rate_one_swaps_exactly_two_positions() {
        let cities = line_map(6);
        let original = genome(&[0, 1, 2, 3, 4, 5], &cities);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        for _ in 0..50 {
            let mut g = original.clone();
            assert!(swap_mutation(&mut g, 1.0, &cities, &mut rng));
            let changed = g.path().iter().zip(original.path()).filter(|(x, y)| x != y).count();
            assert_eq!(changed, 2);
            assert!(g.is_valid());
            assert!((g.fitness() - crate::genome::fitness(g.path(), &cities)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mutation_single_city_is_noop() {
        let cities = line_map(1);
        let mut g = genome(&[0], &cities);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        assert!(!swap_mutation(&mut g, 1.0, &cities, &mut rng));
    }

    #[test]
    fn test_replace_worst_evicts_global_minimum() {
        let cities = line_map(4);
        // lengths: 5, 3, 6, 4
        let mut population = population_of(
            &[&[0, 2, 1, 3], &[0, 1, 2, 3], &[0, 3, 1, 2], &[1, 0, 2, 3]],
            &cities,
        );
        let weakest_fitness = population.weakest().unwrap().fitness();
        let child = genome(&[2, 1, 0, 3], &cities);

        let evicted = replace_worst(&mut population, &child).unwrap().unwrap();
        assert_eq!(evicted.path(), &[0, 3, 1, 2]);
        assert_eq!(evicted.fitness(), weakest_fitness);
        assert_eq!(population.len(), 4);
        assert!(population.iter().all(|g| g.fitness() >= evicted.fitness()));
        assert!(population.iter().any(|g| g.path() == child.path()));
    }

    #[test]
    fn test_replace_worst_accepts_weaker_child() {
        let cities = line_map(4);
        let mut population = population_of(&[&[0, 1, 2, 3], &[3, 2, 1, 0], &[1, 0, 2, 3]], &cities);
        // Length 6, worse than every member.
        let child = genome(&[0, 3, 1, 2], &cities);

        replace_worst(&mut population, &child).unwrap();
        assert_eq!(population.len(), 3);
        assert_eq!(population.weakest().unwrap().path(), &[0, 3, 1, 2]);
    }

    #[test]
    fn test_replace_worst_on_empty_population_appends() {
        let cities = line_map(3);
        let mut population = Population::new(2);

        let evicted = replace_worst(&mut population, &genome(&[0, 1, 2], &cities)).unwrap();
        assert!(evicted.is_none());
        assert_eq!(population.len(), 1);
    }

    fn parents_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, u64)> {
        (2usize..9).prop_flat_map(|n| {
            let base: Vec<usize> = (0..n).collect();
            (Just(base.clone()).prop_shuffle(), Just(base).prop_shuffle(), any::<u64>())
        })
    }

    proptest! {
        #[test]
        fn prop_crossover_yields_permutation_and_keeps_segment((a, b, seed) in parents_strategy()) {
            let n = a.len();
            let cities = line_map(n);
            let pa = genome(&a, &cities);
            let pb = genome(&b, &cities);

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let child = order_crossover(&pa, &pb, &cities, &mut rng).unwrap();
            prop_assert!(child.is_valid());
            prop_assert_eq!(child.len(), n);

            let start = (seed as usize) % n;
            let end = start + (seed as usize / n) % (n - start);
            let fixed = order_crossover_segment(&pa, &pb, start, end, &cities).unwrap();
            prop_assert!(fixed.is_valid());
            prop_assert_eq!(&fixed.path()[start..=end], &a[start..=end]);
        }

        #[test]
        fn prop_mutation_preserves_permutation((a, _b, seed) in parents_strategy()) {
            let cities = line_map(a.len());
            let mut g = genome(&a, &cities);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            swap_mutation(&mut g, 1.0, &cities, &mut rng);
            prop_assert!(g.is_valid());
        }
    }
}
