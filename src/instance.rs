//! Module for generating, parsing and representing city maps.
//!
//! A [`CityMap`] is the read-only coordinate context shared by every fitness
//! evaluation. It is built once before evolution starts (randomly, from a point
//! list, or from a TSP-LIB style file) and never mutated afterwards.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GaError, Result};

/// Upper bound (exclusive) of randomly generated coordinates
pub const COORDINATE_RANGE: f64 = 10.0;

/// A city located in the Euclidean plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl City {
    pub fn new(x: f64, y: f64) -> Self {
        City { x, y }
    }

    /// Euclidean distance to another city
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Fixed table of cities indexed by city id
#[derive(Debug, Clone, Serialize)]
pub struct CityMap {
    /// Name of the map
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Cities, indexed by id
    cities: Vec<City>,
    /// Precomputed distance matrix
    #[serde(skip)]
    distance_matrix: Vec<Vec<f64>>,
}

impl CityMap {
    /// Build a map from explicit coordinates
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let cities: Vec<City> = points.iter().map(|&(x, y)| City::new(x, y)).collect();
        Self::from_cities("points", "", cities)
    }

    /// Generate `n` cities with coordinates drawn uniformly from `[0, COORDINATE_RANGE)`
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let cities = (0..n)
            .map(|_| City::new(rng.gen_range(0.0..COORDINATE_RANGE), rng.gen_range(0.0..COORDINATE_RANGE)))
            .collect();
        Self::from_cities("random", &format!("{} uniformly random cities", n), cities)
    }

    fn from_cities(name: &str, comment: &str, cities: Vec<City>) -> Self {
        let distance_matrix = Self::compute_distance_matrix(&cities);
        CityMap {
            name: name.to_string(),
            comment: comment.to_string(),
            cities,
            distance_matrix,
        }
    }

    /// Parse a map from a TSP-LIB style file.
    ///
    /// Only the `NODE_COORD_SECTION` is required; `NAME:`, `COMMENT:` and
    /// `DIMENSION:` headers are honoured when present.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| GaError::Instance(format!("Cannot open file: {}", e)))?;
        let reader = BufReader::new(file);

        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut in_coords = false;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if let Some(rest) = line.strip_prefix("NAME:") {
                name = rest.trim().to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix("COMMENT:") {
                comment = rest.trim().to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix("DIMENSION:") {
                let value = rest.trim().parse()
                    .map_err(|_| GaError::Instance(format!("Invalid dimension: {}", rest.trim())))?;
                dimension = Some(value);
                continue;
            }
            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") || line.contains(':') {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(GaError::Instance(format!("Malformed coordinate line: {}", line)));
                }
                let id: usize = parts[0].parse()
                    .map_err(|_| GaError::Instance(format!("Invalid node id: {}", parts[0])))?;
                let x: f64 = parts[1].parse()
                    .map_err(|_| GaError::Instance(format!("Invalid x coordinate: {}", parts[1])))?;
                let y: f64 = parts[2].parse()
                    .map_err(|_| GaError::Instance(format!("Invalid y coordinate: {}", parts[2])))?;
                coords.push((id, x, y));
            }
        }

        if coords.is_empty() {
            return Err(GaError::Instance("No NODE_COORD_SECTION entries found".to_string()));
        }
        if let Some(expected) = dimension {
            if expected != coords.len() {
                return Err(GaError::Instance(format!(
                    "DIMENSION is {} but {} coordinates were read", expected, coords.len()
                )));
            }
        }

        // File ids are 1-indexed; internal ids follow file order.
        coords.sort_by_key(|(id, _, _)| *id);
        let cities = coords.into_iter().map(|(_, x, y)| City::new(x, y)).collect();

        let mut map = Self::from_cities(&name, &comment, cities);
        if map.name.is_empty() {
            map.name = path.as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }
        Ok(map)
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    matrix[i][j] = cities[i].distance_to(&cities[j]);
                }
            }
        }

        matrix
    }

    /// Number of cities
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, id: usize) -> Option<&City> {
        self.cities.get(id)
    }

    /// Get the distance between two cities
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Total length of an open route: N-1 edges, no edge back to the start.
    pub fn path_length(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|w| self.distance(w[0], w[1])).sum()
    }

    /// Get statistics about the map
    pub fn statistics(&self) -> MapStatistics {
        let n = self.len();
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance(i, j));
            }
        }

        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);
        let coincident_pairs = distances.iter().filter(|&&d| d == 0.0).count();

        MapStatistics {
            name: self.name.clone(),
            num_cities: n,
            avg_distance,
            min_distance: if distances.is_empty() { 0.0 } else { min_distance },
            max_distance,
            coincident_pairs,
        }
    }
}

/// Statistics about a city map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapStatistics {
    pub name: String,
    pub num_cities: usize,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Pairs of cities sharing the same coordinates
    pub coincident_pairs: usize,
}

impl std::fmt::Display for MapStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Map: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.num_cities)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)?;
        write!(f, "  Coincident pairs: {}", self.coincident_pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io::Write;

    #[test]
    fn test_distance_calculation() {
        let map = CityMap::from_points(&[(0.0, 0.0), (3.0, 4.0)]);

        assert!((map.distance(0, 1) - 5.0).abs() < 1e-10);
        assert!((map.distance(1, 0) - 5.0).abs() < 1e-10);
        assert_eq!(map.distance(0, 0), 0.0);
    }

    #[test]
    fn test_path_length_is_open_route() {
        let map = CityMap::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);

        // Three edges only; the closing edge (0,10)->(0,0) is not counted.
        assert!((map.path_length(&[0, 1, 2, 3]) - 30.0).abs() < 1e-10);
        assert_eq!(map.path_length(&[2]), 0.0);
        assert_eq!(map.path_length(&[]), 0.0);
    }

    #[test]
    fn test_random_cities_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let map = CityMap::random(8, &mut rng);

        assert_eq!(map.len(), 8);
        for city in map.cities() {
            assert!((0.0..COORDINATE_RANGE).contains(&city.x));
            assert!((0.0..COORDINATE_RANGE).contains(&city.y));
        }
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("tsp_genetic_map_{}.tsp", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "NAME: square").unwrap();
            writeln!(file, "COMMENT: unit test").unwrap();
            writeln!(file, "DIMENSION: 3").unwrap();
            writeln!(file, "EDGE_WEIGHT_TYPE: EUC_2D").unwrap();
            writeln!(file, "NODE_COORD_SECTION").unwrap();
            writeln!(file, "2 3.0 4.0").unwrap();
            writeln!(file, "1 0.0 0.0").unwrap();
            writeln!(file, "3 3.0 0.0").unwrap();
            writeln!(file, "EOF").unwrap();
        }

        let map = CityMap::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(map.name, "square");
        assert_eq!(map.len(), 3);
        assert_eq!(map.city(0), Some(&City::new(0.0, 0.0)));
        assert!((map.distance(0, 1) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_from_file_dimension_mismatch() {
        let path = std::env::temp_dir().join(format!("tsp_genetic_bad_{}.tsp", std::process::id()));
        std::fs::write(&path, "DIMENSION: 4\nNODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n").unwrap();

        let result = CityMap::from_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(GaError::Instance(_))));
    }

    #[test]
    fn test_statistics_counts_coincident_pairs() {
        let map = CityMap::from_points(&[(1.0, 1.0), (1.0, 1.0), (4.0, 5.0)]);
        let stats = map.statistics();

        assert_eq!(stats.num_cities, 3);
        assert_eq!(stats.coincident_pairs, 1);
        assert!((stats.max_distance - 5.0).abs() < 1e-10);
    }
}
