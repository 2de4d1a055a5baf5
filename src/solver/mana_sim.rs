//! Monte Carlo cross-check of the analytic castability numbers.

use crate::card::types::{ColorSet, Requirement};
use crate::config::SolverConfig;
use crate::rng::ShuffleRng;
use crate::solver::allocation::Allocation;
use crate::solver::deck::Deck;
use crate::solver::probability::{covers_demand, ProbabilityEngine, SourceTiming};
use crate::solver::SolveError;
use rayon::prelude::*;
use std::fmt;

pub struct SimulationResults {
    pub num_games: usize,
    pub seed: u64,
    /// Distinct requirements in first-appearance order
    pub requirements: Vec<Requirement>,
    pub successes: Vec<usize>,
}

impl SimulationResults {
    pub fn success_rate(&self, index: usize) -> f64 {
        if self.num_games == 0 {
            return 0.0;
        }
        self.successes[index] as f64 / self.num_games as f64
    }

    pub fn rate_of(&self, requirement: &Requirement) -> Option<f64> {
        self.requirements
            .iter()
            .position(|r| r == requirement)
            .map(|i| self.success_rate(i))
    }
}

impl fmt::Display for SimulationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games: {} | Seed: {}", self.num_games, self.seed)?;
        writeln!(f, "{:<16} {:>8} {:>10}", "Requirement", "Cast%", "Games")?;
        writeln!(f, "{}", "-".repeat(36))?;
        for (i, requirement) in self.requirements.iter().enumerate() {
            writeln!(
                f,
                "{:<16} {:>7.1}% {:>10}",
                requirement.to_string(),
                self.success_rate(i) * 100.0,
                self.successes[i]
            )?;
        }
        Ok(())
    }
}

/// How each requirement reads a shuffled library
struct Check {
    requirement: Requirement,
    /// Per category: produced subset of the requirement's colors and timing
    sources: Vec<(ColorSet, SourceTiming)>,
    early: usize,
    seen: usize,
}

impl Check {
    fn new(requirement: Requirement, allocation: &Allocation, engine: &ProbabilityEngine) -> Self {
        let colors = requirement.cost.colors();
        let sources = (0..allocation.categories().len())
            .map(|i| {
                let signature = allocation.categories()[i].produces.intersection(colors);
                (signature, engine.source_timing(allocation, i, requirement.turn))
            })
            .collect();
        Check {
            requirement,
            sources,
            early: engine.early_seen(requirement.turn),
            seen: engine.cards_seen(requirement.turn),
        }
    }

    fn castable(&self, library: &[Option<usize>]) -> bool {
        let pips = self.requirement.cost.colored_pips();
        if pips == 0 {
            return true;
        }
        if pips > self.requirement.turn {
            return false;
        }
        let mut usable: Vec<(ColorSet, u32)> = Vec::new();
        for (position, card) in library.iter().take(self.seen).enumerate() {
            let Some(category) = card else { continue };
            let (signature, timing) = self.sources[*category];
            let counts = match timing {
                SourceTiming::Ready => true,
                SourceTiming::Delayed => position < self.early,
                SourceTiming::Inert => false,
            };
            if counts && !signature.is_empty() {
                usable.push((signature, 1));
            }
        }
        covers_demand(&self.requirement.cost.color_demands(), &usable)
    }
}

fn run_game(checks: &[Check], library: &[Option<usize>], base_seed: u64, game: usize) -> Vec<bool> {
    let mut rng = ShuffleRng::for_game(base_seed, game);
    let mut library = library.to_vec();
    rng.shuffle(&mut library);
    checks.iter().map(|check| check.castable(&library)).collect()
}

/// Sample `num_games` shuffles and count how often each requirement is castable on time
pub fn run_castability_simulation(
    deck: &Deck,
    allocation: &Allocation,
    config: &SolverConfig,
    num_games: usize,
    seed: u64,
) -> Result<SimulationResults, SolveError> {
    run_castability_simulation_with(deck, allocation, config, num_games, seed, || {})
}

/// Same as [`run_castability_simulation`], calling `on_game` after every game
pub fn run_castability_simulation_with<F>(
    deck: &Deck,
    allocation: &Allocation,
    config: &SolverConfig,
    num_games: usize,
    seed: u64,
    on_game: F,
) -> Result<SimulationResults, SolveError>
where
    F: Fn() + Sync,
{
    if allocation.total() != deck.land_count {
        return Err(SolveError::InvalidAllocation(format!(
            "{} lands allocated for a budget of {}",
            allocation.total(),
            deck.land_count
        )));
    }

    let engine = ProbabilityEngine::new(deck, config);
    let mut requirements: Vec<Requirement> = Vec::new();
    for requirement in &deck.requirements {
        requirement.validate()?;
        if !requirements.contains(requirement) {
            requirements.push(*requirement);
        }
    }
    let checks: Vec<Check> = requirements
        .iter()
        .map(|r| Check::new(*r, allocation, &engine))
        .collect();

    let mut library: Vec<Option<usize>> = Vec::with_capacity(deck.size);
    for (index, (_, count)) in allocation.iter().enumerate() {
        library.extend(std::iter::repeat(Some(index)).take(count));
    }
    library.resize(deck.size, None);

    let games: Vec<Vec<bool>> = (0..num_games)
        .into_par_iter()
        .map(|game| {
            let outcome = run_game(&checks, &library, seed, game);
            on_game();
            outcome
        })
        .collect();

    let mut successes = vec![0; requirements.len()];
    for outcome in &games {
        for (i, castable) in outcome.iter().enumerate() {
            if *castable {
                successes[i] += 1;
            }
        }
    }

    Ok(SimulationResults { num_games, seed, requirements, successes })
}
