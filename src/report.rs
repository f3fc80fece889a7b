//! Text tables for genomes and populations.
//!
//! These are `Display` adapters: the engine never writes anything itself, the
//! caller decides where a table goes (stdout, a trace file, a log line).

use std::fmt;

use crate::genome::Genome;
use crate::instance::CityMap;
use crate::population::Population;

const ROW_RULE: &str = "+-------------------------+";
const END_RULE: &str = "----------------------------";

/// Renders one genome as a coordinate table in visiting order
pub struct GenomeTable<'a> {
    pub genome: &'a Genome,
    pub cities: &'a CityMap,
    pub title: &'a str,
}

impl<'a> GenomeTable<'a> {
    pub fn new(genome: &'a Genome, cities: &'a CityMap, title: &'a str) -> Self {
        GenomeTable { genome, cities, title }
    }
}

impl fmt::Display for GenomeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.title)?;
        writeln!(f, "length: {}", self.genome.len())?;
        writeln!(f, "fitness: {:.6}", self.genome.fitness())?;
        writeln!(f, "{}", ROW_RULE)?;
        writeln!(f, "|Cities:    x   |     y   |")?;
        writeln!(f, "{}", ROW_RULE)?;
        for (position, &id) in self.genome.path().iter().enumerate() {
            // Paths are validated against the map, so the lookup only misses
            // when a table is paired with the wrong map.
            match self.cities.city(id) {
                Some(city) => writeln!(f, "|City_{}:  {:.2}  |   {:.2}  |", position + 1, city.x, city.y)?,
                None => writeln!(f, "|City_{}:  ?     |   ?     |", position + 1)?,
            }
            writeln!(f, "{}", ROW_RULE)?;
        }
        writeln!(f, "{}", END_RULE)
    }
}

/// Renders every member of a population with [`GenomeTable`]
pub struct PopulationTable<'a> {
    pub population: &'a Population,
    pub cities: &'a CityMap,
    pub title: &'a str,
}

impl<'a> PopulationTable<'a> {
    pub fn new(population: &'a Population, cities: &'a CityMap, title: &'a str) -> Self {
        PopulationTable { population, cities, title }
    }
}

impl fmt::Display for PopulationTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " {} :", self.title)?;
        for genome in self.population {
            write!(f, "{}", GenomeTable::new(genome, self.cities, "member"))?;
        }
        Ok(())
    }
}
