//! Open-route TSP genetic solver - Command Line Interface

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tsp_genetic::benchmark::{Benchmark, BenchmarkConfig};
use tsp_genetic::error::Result;
use tsp_genetic::genome::Genome;
use tsp_genetic::heuristics::genetic::{GAConfig, GeneticAlgorithm};
use tsp_genetic::instance::CityMap;
use tsp_genetic::permutation::{InitStrategy, PermutationSet};
use tsp_genetic::report::{GenomeTable, PopulationTable};
use tsp_genetic::visualization::Visualizer;

use std::cell::RefCell;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tsp-genetic")]
#[command(version = "1.0")]
#[command(about = "Genetic algorithm for the open-route Euclidean TSP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a route for one city map
    Solve {
        #[command(flatten)]
        map: MapArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Write the solution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write every generation's child and the final population as tables
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Generate SVG visualizations with this path prefix
        #[arg(long)]
        visualize: Option<PathBuf>,

        /// Print the final population
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the solver repeatedly with different seeds
    Benchmark {
        #[command(flatten)]
        map: MapArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Run sequentially instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Enumerate all permutations of 0..n
    Permutations {
        /// Number of elements
        #[arg(short, long)]
        n: usize,

        /// Print every permutation
        #[arg(long)]
        print: bool,
    },
}

#[derive(Args)]
struct MapArgs {
    /// Number of random cities
    #[arg(short, long, default_value = "8")]
    cities: usize,

    /// Load cities from a TSPLIB-style file instead
    #[arg(short, long)]
    instance: Option<PathBuf>,

    /// Seed for random city generation
    #[arg(long, default_value = "42")]
    map_seed: u64,
}

#[derive(Args)]
struct GaArgs {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Cities per route (defaults to the whole map)
    #[arg(long)]
    length: Option<usize>,

    /// Maximum number of generations
    #[arg(short, long)]
    generations: Option<usize>,

    /// Mutation rate in [0, 1]
    #[arg(short, long)]
    mutation_rate: Option<f64>,

    /// Generations without improvement before stopping
    #[arg(long)]
    stagnation: Option<usize>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Initial population strategy
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Strategy {
    /// Enumerate all N! orderings, then sample
    Enumerate,
    /// Fisher-Yates shuffle
    Shuffle,
}

impl From<Strategy> for InitStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Enumerate => InitStrategy::Enumerate,
            Strategy::Shuffle => InitStrategy::Shuffle,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { map, ga, output, trace, visualize, verbose } => {
            solve(&map, &ga, output.as_deref(), trace.as_deref(), visualize.as_deref(), verbose)
        }
        Commands::Benchmark { map, ga, runs, output, sequential } => run_benchmark(&map, &ga, runs, &output, sequential),
        Commands::Permutations { n, print } => list_permutations(n, print),
    };

    if let Err(e) = outcome {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_map(args: &MapArgs) -> Result<CityMap> {
    match &args.instance {
        Some(path) => {
            println!("Loading cities from {:?}...", path);
            CityMap::from_file(path)
        }
        None => {
            let mut rng = ChaCha8Rng::seed_from_u64(args.map_seed);
            Ok(CityMap::random(args.cities, &mut rng))
        }
    }
}

fn build_config(args: &GaArgs, cities: &CityMap) -> Result<GAConfig> {
    let mut config = match &args.config {
        Some(path) => GAConfig::from_json_file(path)?,
        None => GAConfig::default().with_genome_length(cities.len()),
    };

    if let Some(n) = args.population {
        config.population_size = n;
    }
    if let Some(n) = args.length {
        config.genome_length = n;
    }
    if let Some(n) = args.generations {
        config.max_generations = n;
    }
    if let Some(rate) = args.mutation_rate {
        config.mutation_rate = rate;
    }
    if let Some(n) = args.stagnation {
        config.stagnation_limit = n;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(strategy) = args.strategy {
        config.init_strategy = strategy.into();
    }

    config.validate()?;
    Ok(config)
}

fn solve(
    map_args: &MapArgs,
    ga_args: &GaArgs,
    output: Option<&Path>,
    trace: Option<&Path>,
    visualize: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let cities = load_map(map_args)?;
    let config = build_config(ga_args, &cities)?;

    println!("{}", cities.statistics());
    println!(
        "Evolving {} genomes of {} cities for up to {} generations...",
        config.population_size, config.genome_length, config.max_generations
    );

    let children: RefCell<Vec<(usize, Genome)>> = RefCell::new(Vec::new());
    let mut ga = GeneticAlgorithm::new(&cities, config)?;
    if trace.is_some() {
        ga = ga.with_observer(|stats, child| children.borrow_mut().push((stats.generation, child.clone())));
    }
    let solution = ga.run()?;

    println!("\n========== Results ==========");
    print!("{}", solution);
    println!("Improvement over worst initial route: {:.2}%", solution.improvement() * 100.0);
    println!("\n{}", GenomeTable::new(&solution.best, &cities, "best"));

    if verbose {
        println!("{}", PopulationTable::new(ga.population(), &cities, "final population"));
    }

    if let Some(path) = trace {
        let mut text = String::new();
        for (generation, child) in children.borrow().iter() {
            let title = format!("child (generation {})", generation);
            text.push_str(&GenomeTable::new(child, &cities, &title).to_string());
        }
        text.push_str(&PopulationTable::new(ga.population(), &cities, "final population").to_string());
        std::fs::write(path, text)?;
        println!("Trace saved to {:?}", path);
    }

    if let Some(path) = output {
        std::fs::write(path, solution.to_json()?)?;
        println!("Solution saved to {:?}", path);
    }

    if let Some(prefix) = visualize {
        let viz = Visualizer::new();
        let route_path = prefix.with_extension("svg");
        viz.save_svg(&viz.generate_svg(&cities, &solution), &route_path)?;
        println!("Route saved to {:?}", route_path);

        let convergence_path = prefix.with_extension("convergence.svg");
        viz.save_svg(&viz.generate_convergence_svg(&solution.history), &convergence_path)?;
        println!("Convergence plot saved to {:?}", convergence_path);

        let data_path = prefix.with_extension("dat");
        std::fs::write(&data_path, viz.export_plot_data(&cities, &solution))?;
        println!("Plot data saved to {:?}", data_path);
    }

    Ok(())
}

fn run_benchmark(map_args: &MapArgs, ga_args: &GaArgs, runs: usize, output: &Path, sequential: bool) -> Result<()> {
    let cities = load_map(map_args)?;
    let config = build_config(ga_args, &cities)?;

    std::fs::create_dir_all(output)?;

    let mut benchmark = Benchmark::new(BenchmarkConfig {
        num_runs: runs,
        base_seed: config.seed.unwrap_or(0),
        parallel: !sequential,
        show_progress: true,
        output_dir: output.to_string_lossy().into_owned(),
    });
    benchmark.run(&cities, &config)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn list_permutations(n: usize, print: bool) -> Result<()> {
    let permutations = PermutationSet::of_range(n)?;
    println!("Number of permutations of {} elements: {}", n, permutations.len());

    if print {
        for (i, p) in permutations.iter().enumerate() {
            println!("{:>8}: {:?}", i, p);
        }
    }
    Ok(())
}
