//! Visualization utilities for evolved routes.
//!
//! Generates SVG drawings of open routes and plain-text exports for external
//! plotting.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::instance::CityMap;
use crate::solution::{GenerationStats, Solution};

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// City radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 8.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an SVG of the map and the route of `solution`.
    ///
    /// The route is open: the last city is not joined back to the first.
    pub fn generate_svg(&self, cities: &CityMap, solution: &Solution) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(cities);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .city {{ fill: #3498db; stroke: #2c3e50; stroke-width: 2; }}
    .start {{ fill: #2ecc71; stroke: #27ae60; stroke-width: 2; }}
    .end {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<defs>
<marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth">
<path d="M0,0 L0,6 L9,3 z" fill="#34495e"/>
</marker>
</defs>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Map: {} | Distance: {:.2} | Generations: {} ({})</text>
"##,
            self.margin, cities.name, solution.distance, solution.generations, solution.stop_reason
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        let tour = solution.tour();
        for pair in tour.windows(2) {
            let (Some(from), Some(to)) = (cities.city(pair[0]), cities.city(pair[1])) else {
                continue;
            };
            let (x1, y1) = transform(from.x, from.y);
            let (x2, y2) = transform(to.x, to.y);

            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="edge" marker-end="url(#arrow)"/>
"#,
                x1, y1, x2, y2
            ));
        }

        let first = tour.first().copied();
        let last = tour.last().copied();
        for (id, city) in cities.cities().iter().enumerate() {
            let (x, y) = transform(city.x, city.y);

            let class = if Some(id) == first {
                "start"
            } else if Some(id) == last {
                "end"
            } else {
                "city"
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y,
                self.node_radius,
                class,
                x,
                y - self.node_radius - 3.0,
                id
            ));
        }

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(
            r##"<rect x="{}" y="{}" width="15" height="15" class="start"/>
<text x="{}" y="{}" class="label">Start</text>
<rect x="{}" y="{}" width="15" height="15" class="end"/>
<text x="{}" y="{}" class="label">End</text>
"##,
            self.margin,
            legend_y,
            self.margin + 20.0,
            legend_y + 12.0,
            self.margin + 80.0,
            legend_y,
            self.margin + 100.0,
            legend_y + 12.0
        ));

        svg.push_str("</svg>");
        svg
    }

    /// Plot best-ever and current best distance per generation
    pub fn generate_convergence_svg(&self, history: &[GenerationStats]) -> String {
        let width = self.width;
        let height = 300.0;
        let margin = 50.0;
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .best {{ stroke: #2ecc71; stroke-width: 2; fill: none; }}
    .current {{ stroke: #3498db; stroke-width: 1; stroke-dasharray: 5,5; fill: none; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<text x="{}" y="25" class="title">Convergence - {} generations</text>
<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            width,
            height,
            width,
            height,
            margin,
            history.len(),
            margin,
            height - margin,
            width - margin,
            height - margin,
            margin,
            margin,
            margin,
            height - margin
        ));

        let distances: Vec<(f64, f64)> = history
            .iter()
            .map(|s| (1.0 / s.best_fitness_ever, 1.0 / s.current_best_fitness))
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .collect();

        if !distances.is_empty() {
            let max_d = distances.iter().map(|&(a, b)| a.max(b)).fold(0.0, f64::max).max(f64::EPSILON);
            let x_scale = (width - 2.0 * margin) / distances.len().max(2).saturating_sub(1) as f64;
            let y_scale = (height - 2.0 * margin) / max_d;

            let polyline = |select: fn(&(f64, f64)) -> f64| -> String {
                distances
                    .iter()
                    .enumerate()
                    .map(|(i, d)| {
                        format!("{:.2},{:.2}", margin + i as f64 * x_scale, height - margin - select(d) * y_scale)
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            };

            svg.push_str(&format!(
                r##"<polyline points="{}" class="current"/>
<polyline points="{}" class="best"/>
"##,
                polyline(|d| d.1),
                polyline(|d| d.0)
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Get coordinate bounds
    fn get_bounds(&self, cities: &CityMap) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for city in cities.cities() {
            min_x = min_x.min(city.x);
            max_x = max_x.max(city.x);
            min_y = min_y.min(city.y);
            max_y = max_y.max(city.y);
        }

        if cities.is_empty() {
            return (0.0, 1.0, 0.0, 1.0);
        }
        (min_x, max_x, min_y, max_y)
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, cities: &CityMap, solution: &Solution) -> String {
        let mut data = String::new();

        data.push_str("# Open-route TSP Solution Data\n");
        data.push_str(&format!("# Map: {}\n", cities.name));
        data.push_str(&format!("# Distance: {:.4}\n", solution.distance));
        data.push_str(&format!("# Generations: {}\n\n", solution.generations));

        data.push_str("# Cities: id, x, y\n");
        for (id, city) in cities.cities().iter().enumerate() {
            data.push_str(&format!("{},{},{}\n", id, city.x, city.y));
        }

        data.push_str("\n# Route: sequence of city ids\n");
        let tour_str: Vec<String> = solution.tour().iter().map(|n| n.to_string()).collect();
        data.push_str(&tour_str.join(","));
        data.push('\n');

        data.push_str("\n# History: generation, best_fitness_ever, current_best_fitness, stagnation\n");
        for stats in &solution.history {
            data.push_str(&format!(
                "{},{},{},{}\n",
                stats.generation, stats.best_fitness_ever, stats.current_best_fitness, stats.stagnation
            ));
        }

        data
    }
}
