pub mod card;
pub mod config;
pub mod rng;
pub mod solver;

pub use card::{
    parse_mana_cost, parse_requirement, ColorSet, LandCard, LandCatalog, ManaColor, ManaCost,
    Requirement,
};
pub use config::{DrawPolicy, SolverConfig};
pub use solver::{
    probability_of_casting, solve, Allocation, CurveWeights, Deck, LandCategory, LandPool,
    ProbabilityEngine, Solution, SolveError, Solver, WeightConfig, WeightPolicy,
};
