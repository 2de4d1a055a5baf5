//! Solver and weight settings loaded from JSON files.

use crate::card::types::Requirement;
use crate::solver::weights::{CurveWeights, WeightConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },
    #[error("Invalid override '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },
}

/// How many cards a player has seen by a given turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawPolicy {
    pub opening_hand: usize,
    pub on_the_draw: bool,
}

impl Default for DrawPolicy {
    fn default() -> Self {
        DrawPolicy { opening_hand: 7, on_the_draw: false }
    }
}

impl DrawPolicy {
    /// Cards seen by the end of the draw step of `turn`; turn 0 is the opening hand
    pub fn cards_seen(&self, turn: u32) -> usize {
        let draws = turn.saturating_sub(1) as usize;
        let extra = usize::from(self.on_the_draw && turn > 0);
        self.opening_hand + draws + extra
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub draw: DrawPolicy,
    /// Allocations scored before the search gives up, seed included
    pub max_evaluations: usize,
    pub parallel: bool,
    /// Probability of seeing enablers above which a conditional land counts as untapped
    pub conditional_threshold: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            draw: DrawPolicy::default(),
            max_evaluations: 20_000,
            parallel: true,
            conditional_threshold: 0.75,
        }
    }
}

impl SolverConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.draw.opening_hand == 0 {
            return Err(invalid("draw.opening_hand", "must be at least 1"));
        }
        if self.max_evaluations == 0 {
            return Err(invalid("max_evaluations", "must be at least 1"));
        }
        if !(self.conditional_threshold > 0.0 && self.conditional_threshold <= 1.0) {
            return Err(invalid("conditional_threshold", "must be in (0, 1]"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting { field: field.to_string(), reason: reason.to_string() }
}

/// Persisted weight settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightProfile {
    pub turn_decay: f64,
    pub pip_bonus: f64,
    pub pain_penalty: f64,
    /// Keyed by requirement notation, e.g. "T2 1U"
    pub overrides: BTreeMap<String, f64>,
}

impl Default for WeightProfile {
    fn default() -> Self {
        let curve = CurveWeights::default();
        WeightProfile {
            turn_decay: curve.turn_decay,
            pip_bonus: curve.pip_bonus,
            pain_penalty: 0.0,
            overrides: BTreeMap::new(),
        }
    }
}

impl WeightProfile {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_weight_config(&self) -> Result<WeightConfig, ConfigError> {
        if !(self.turn_decay > 0.0 && self.turn_decay.is_finite()) {
            return Err(invalid("turn_decay", "must be positive"));
        }
        if !(self.pip_bonus >= 0.0 && self.pip_bonus.is_finite()) {
            return Err(invalid("pip_bonus", "must not be negative"));
        }
        if !(self.pain_penalty >= 0.0 && self.pain_penalty.is_finite()) {
            return Err(invalid("pain_penalty", "must not be negative"));
        }

        let mut config = WeightConfig::new(CurveWeights {
            turn_decay: self.turn_decay,
            pip_bonus: self.pip_bonus,
        })
        .with_pain_penalty(self.pain_penalty);

        for (key, weight) in &self.overrides {
            let requirement: Requirement = key.parse().map_err(|e| ConfigError::InvalidOverride {
                key: key.clone(),
                reason: format!("{}", e),
            })?;
            config = config.with_override(requirement, *weight);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_seen_on_the_play_and_draw() {
        let play = DrawPolicy::default();
        assert_eq!(play.cards_seen(1), 7);
        assert_eq!(play.cards_seen(2), 8);
        assert_eq!(play.cards_seen(6), 12);

        let draw = DrawPolicy { on_the_draw: true, ..DrawPolicy::default() };
        assert_eq!(draw.cards_seen(0), 7);
        assert_eq!(draw.cards_seen(1), 8);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SolverConfig::from_json(r#"{"max_evaluations": 500}"#).expect("valid config");
        assert_eq!(config.max_evaluations, 500);
        assert_eq!(config.draw.opening_hand, 7);
        assert!(config.parallel);
    }

    #[test]
    fn test_config_validation() {
        assert!(SolverConfig::from_json(r#"{"max_evaluations": 0}"#).is_err());
        assert!(SolverConfig::from_json(r#"{"conditional_threshold": 1.5}"#).is_err());
        assert!(SolverConfig::from_json(r#"{"draw": {"opening_hand": 0}}"#).is_err());
    }

    #[test]
    fn test_weight_profile_overrides() {
        let profile: WeightProfile =
            serde_json::from_str(r#"{"pain_penalty": 0.1, "overrides": {"T2 1U": 3.0}}"#)
                .expect("valid profile");
        let config = profile.to_weight_config().expect("valid weights");
        let req: Requirement = "T2 1U".parse().expect("valid requirement");
        assert_eq!(config.weight(&req), 3.0);
        assert_eq!(config.pain_penalty(), 0.1);

        let bad: WeightProfile =
            serde_json::from_str(r#"{"overrides": {"T2 1X": 1.0}}"#).expect("valid json");
        assert!(matches!(bad.to_weight_config(), Err(ConfigError::InvalidOverride { .. })));
    }
}
