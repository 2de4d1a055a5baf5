pub mod cost;
pub mod database;
pub mod types;

pub use cost::{parse_mana_cost, parse_requirement, CostParseError};
pub use database::{CardDatabaseError, LandCatalog};
pub use types::{
    ColorSet, Condition, Entry, LandCard, LandSubtype, ManaColor, ManaCost, Requirement,
};
