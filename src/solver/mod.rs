pub mod allocation;
pub mod deck;
pub mod mana_sim;
pub mod optimize;
pub mod probability;
pub mod solution;
pub mod weights;

use thiserror::Error;

pub use allocation::{Allocation, LandCategory, LandPool, Move};
pub use deck::{parse_deck, parse_deck_file, Deck, DeckError};
pub use optimize::{solve, SearchStep, Solver};
pub use probability::{probability_of_casting, ProbabilityEngine, SourceTiming};
pub use solution::{save_solution_to_file, CardProbability, Solution};
pub use weights::{CurveWeights, WeightConfig, WeightPolicy};

/// Errors raised by the optimization core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid requirement {requirement}: {reason}")]
    InvalidRequirement { requirement: String, reason: String },
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
    #[error("Infeasible land budget: pool caps allow {available} lands but the deck needs {required}")]
    InfeasibleBudget { available: usize, required: usize },
    #[error("Deck has no requirements to optimize against")]
    EmptyDeck,
    #[error("Invalid weight {weight} for requirement {requirement}")]
    InvalidWeight { requirement: String, weight: f64 },
}
