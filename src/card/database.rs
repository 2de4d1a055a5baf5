use crate::card::types::{ColorSet, LandCard, ManaColor};
use crate::solver::allocation::LandPool;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardDatabaseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Land not found: {0}")]
    LandNotFound(String),
    #[error("Invalid land data: {0}")]
    InvalidLand(String),
}

/// Format land table loaded from JSON
pub struct LandCatalog {
    lands: BTreeMap<String, LandCard>,
}

impl LandCatalog {
    /// Load lands from a JSON file
    pub fn from_file(path: &str) -> Result<Self, CardDatabaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CardDatabaseError> {
        let lands_vec: Vec<LandCard> = serde_json::from_str(content)?;
        Self::from_lands(lands_vec)
    }

    pub fn from_lands(lands_vec: Vec<LandCard>) -> Result<Self, CardDatabaseError> {
        let mut lands = BTreeMap::new();
        for land in lands_vec {
            if land.produces.is_empty() && !land.any_color {
                return Err(CardDatabaseError::InvalidLand(format!(
                    "{} produces no mana",
                    land.name
                )));
            }
            if lands.contains_key(&land.name) {
                return Err(CardDatabaseError::InvalidLand(format!(
                    "{} listed twice",
                    land.name
                )));
            }
            lands.insert(land.name.clone(), land);
        }
        Ok(LandCatalog { lands })
    }

    /// Get a land by name
    pub fn get_land(&self, name: &str) -> Result<&LandCard, CardDatabaseError> {
        self.lands
            .get(name)
            .ok_or_else(|| CardDatabaseError::LandNotFound(name.to_string()))
    }

    pub fn land_count(&self) -> usize {
        self.lands.len()
    }

    /// Lands worth considering for a deck of the given colors.
    ///
    /// A land is viable when it makes two or more of the deck's colors, or is
    /// a basic making one of them. Lands making three or more colors are left
    /// out of one- and two-color decks.
    pub fn viable_lands(&self, colors: ColorSet) -> Vec<&LandCard> {
        let deck_colors = colors.len();
        self.lands
            .values()
            .filter(|land| {
                let produced = land.produced_colors();
                let real_colors = produced
                    .iter()
                    .filter(|c| *c != ManaColor::Colorless)
                    .count();
                if deck_colors <= 2 && real_colors > 2 {
                    return false;
                }
                let shared = produced.intersection(colors).len();
                shared >= 2 || (shared >= 1 && land.is_basic())
            })
            .collect()
    }

    /// Group the viable lands for `colors` into a pool of land categories
    pub fn pool_for(&self, colors: ColorSet, land_count: usize) -> LandPool {
        let viable: Vec<LandCard> = self.viable_lands(colors).into_iter().cloned().collect();
        LandPool::from_lands(&viable, land_count)
    }

    /// Build a pool from an explicit list of land names
    pub fn pool_of(&self, names: &[&str], land_count: usize) -> Result<LandPool, CardDatabaseError> {
        let mut lands = Vec::with_capacity(names.len());
        for name in names {
            lands.push(self.get_land(name.trim())?.clone());
        }
        Ok(LandPool::from_lands(&lands, land_count))
    }
}
