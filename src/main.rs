use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use manabase_solver::config::{SolverConfig, WeightProfile};
use manabase_solver::solver::mana_sim::run_castability_simulation_with;
use manabase_solver::solver::{parse_deck_file, save_solution_to_file, Allocation, Deck, LandPool, Solution, Solver};
use manabase_solver::{LandCatalog, WeightConfig};
use std::path::Path;

#[derive(Parser)]
#[command(name = "manabase")]
#[command(about = "Mana base optimizer for Magic: The Gathering decks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Deck file to use
    #[arg(short, long, default_value = "deck.txt", global = true)]
    deck: String,

    /// Land catalog
    #[arg(short, long, default_value = "lands.json", global = true)]
    lands: String,

    /// Solver settings (JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Weight profile (JSON)
    #[arg(short, long, global = true)]
    weights: Option<String>,

    /// Comma-separated land names to use instead of the lands viable for the deck
    #[arg(long, global = true)]
    pool: Option<String>,

    /// Print the search trace
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the best land allocation (default)
    Solve {
        /// Save the solution as JSON under solutions/
        #[arg(long)]
        save: bool,
    },

    /// Score a given allocation
    Evaluate {
        /// Allocation such as "9 Island, 8 Mountain"
        #[arg(short, long)]
        allocation: String,
    },

    /// Cross-check castability by sampling games
    Simulate {
        /// Number of games to sample
        #[arg(short, long, default_value = "10000")]
        games: usize,

        /// Seed for reproducibility
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Allocation to simulate; solves for one when omitted
        #[arg(short, long)]
        allocation: Option<String>,
    },

    /// List the land categories available to the deck
    Pool,
}

/// Everything loaded from disk before a command runs
struct Setup {
    deck: Deck,
    pool: LandPool,
    config: SolverConfig,
    weights: WeightConfig,
}

fn main() {
    let cli = Cli::parse();
    let setup = load(&cli);

    match cli.command {
        Some(Commands::Solve { save }) => run_solve(&setup, &cli.deck, cli.verbose, save),
        Some(Commands::Evaluate { allocation }) => run_evaluate(&setup, &allocation),
        Some(Commands::Simulate { games, seed, allocation }) => {
            run_simulate(&setup, games, seed, allocation.as_deref())
        }
        Some(Commands::Pool) => print_pool(&setup),
        None => run_solve(&setup, &cli.deck, cli.verbose, false),
    }
}

fn fail(message: String) -> ! {
    eprintln!("✗ {}", message);
    std::process::exit(1);
}

fn load(cli: &Cli) -> Setup {
    let catalog = match LandCatalog::from_file(&cli.lands) {
        Ok(catalog) => {
            eprintln!("✓ Loaded {} lands from {}", catalog.land_count(), cli.lands);
            catalog
        }
        Err(e) => fail(format!("Failed to load lands: {}", e)),
    };

    let deck = match parse_deck_file(&cli.deck) {
        Ok(deck) => {
            eprintln!(
                "✓ Loaded {} ({} spells, {} lands, {} cards)",
                cli.deck,
                deck.requirements.len(),
                deck.land_count,
                deck.size
            );
            deck
        }
        Err(e) => fail(format!("Failed to parse deck file '{}': {}", cli.deck, e)),
    };

    let config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)
            .unwrap_or_else(|e| fail(format!("Failed to load config '{}': {}", path, e))),
        None => SolverConfig::default(),
    };

    let weights = match &cli.weights {
        Some(path) => WeightProfile::from_file(path)
            .and_then(|profile| profile.to_weight_config())
            .unwrap_or_else(|e| fail(format!("Failed to load weights '{}': {}", path, e))),
        None => WeightConfig::default(),
    };

    let pool = match &cli.pool {
        Some(names) => {
            let names: Vec<&str> = names.split(',').filter(|n| !n.trim().is_empty()).collect();
            catalog
                .pool_of(&names, deck.land_count)
                .unwrap_or_else(|e| fail(format!("Failed to build land pool: {}", e)))
        }
        None => catalog.pool_for(deck.colors(), deck.land_count),
    };
    Setup { deck, pool, config, weights }
}

fn solve_or_exit(setup: &Setup) -> Solution {
    let solver = Solver::new(setup.config.clone());
    solver
        .solve(&setup.deck, &setup.weights, &setup.pool)
        .unwrap_or_else(|e| fail(format!("Failed to solve: {}", e)))
}

fn run_solve(setup: &Setup, deck_file: &str, verbose: bool, save: bool) {
    println!("\n=== Mana Base Solver ===\n");
    println!("Deck: {} ({} cards, {} lands)", deck_file, setup.deck.size, setup.deck.land_count);
    println!("Colors: {}", setup.deck.colors());
    println!("Land categories: {}", setup.pool.len());
    println!();

    let start = std::time::Instant::now();
    let solution = solve_or_exit(setup);
    let elapsed = start.elapsed();

    if verbose {
        println!("=== Search Trace ===\n");
        for step in solution.trace() {
            println!(
                "  [{:3}] {:<40} score {:.4} ({} evaluations)",
                step.step, step.description, step.score, step.evaluations
            );
        }
        println!();
    }

    println!("=== Best Allocation ===\n");
    print!("{}", solution);
    println!("\nCompleted in {:.2?}", elapsed);

    if save {
        match save_solution_to_file(&solution, Path::new("solutions")) {
            Ok(path) => println!("\nSolution saved to: {}", path.display()),
            Err(e) => eprintln!("\n✗ Failed to save solution: {}", e),
        }
    }
}

fn run_evaluate(setup: &Setup, allocation: &str) {
    let allocation = Allocation::parse(&setup.pool, allocation)
        .unwrap_or_else(|e| fail(format!("Failed to parse allocation: {}", e)));
    let solver = Solver::new(setup.config.clone());
    let solution = solver
        .evaluate(&setup.deck, &setup.weights, allocation)
        .unwrap_or_else(|e| fail(format!("Failed to evaluate: {}", e)));

    println!("\n=== Allocation Report ===\n");
    print!("{}", solution);
}

fn run_simulate(setup: &Setup, games: usize, seed: u64, allocation: Option<&str>) {
    let allocation = match allocation {
        Some(text) => Allocation::parse(&setup.pool, text)
            .unwrap_or_else(|e| fail(format!("Failed to parse allocation: {}", e))),
        None => solve_or_exit(setup).allocation().clone(),
    };

    println!("\n=== Castability Simulation ===\n");
    println!("Lands: {}", allocation);

    let bar = ProgressBar::new(games as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} games ({eta})") {
        bar.set_style(style);
    }
    let results = run_castability_simulation_with(
        &setup.deck,
        &allocation,
        &setup.config,
        games,
        seed,
        || bar.inc(1),
    )
    .unwrap_or_else(|e| fail(format!("Simulation failed: {}", e)));
    bar.finish_and_clear();

    let solver = Solver::new(setup.config.clone());
    let exact = solver
        .evaluate(&setup.deck, &setup.weights, allocation)
        .unwrap_or_else(|e| fail(format!("Failed to evaluate: {}", e)));

    println!("Games: {} | Seed: {}\n", results.num_games, results.seed);
    println!("{:<16} {:>9} {:>9} {:>8}", "Requirement", "Sampled", "Exact", "Diff");
    println!("{}", "-".repeat(45));
    for (i, requirement) in results.requirements.iter().enumerate() {
        let sampled = results.success_rate(i);
        let analytic = exact.probability_of(requirement).unwrap_or(0.0);
        println!(
            "{:<16} {:>8.1}% {:>8.1}% {:>+7.1}%",
            requirement.to_string(),
            sampled * 100.0,
            analytic * 100.0,
            (sampled - analytic) * 100.0
        );
    }
}

fn print_pool(setup: &Setup) {
    println!("\n=== Land Pool ({} colors) ===\n", setup.deck.colors());
    println!("{:<4} {:<48} {:<6} {:<12} {:>4}", "#", "Category", "Makes", "Entry", "Cap");
    println!("{}", "-".repeat(78));
    for (i, category) in setup.pool.categories().iter().enumerate() {
        let entry = match category.condition() {
            Some(condition) => format!("{:?}", condition),
            None => format!("{:?}", category.entry),
        };
        println!(
            "{:<4} {:<48} {:<6} {:<12} {:>4}{}",
            i,
            category.name,
            category.produces.to_string(),
            entry,
            category.cap,
            if category.painful { " (pain)" } else { "" }
        );
    }
    println!("\nTotal capacity: {} for a budget of {}", setup.pool.total_capacity(), setup.deck.land_count);
}
