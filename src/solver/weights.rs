use crate::card::types::Requirement;
use crate::solver::SolveError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Importance of casting a requirement on time
pub trait WeightPolicy: Send + Sync {
    fn weight(&self, requirement: &Requirement) -> f64;
}

impl<F> WeightPolicy for F
where
    F: Fn(&Requirement) -> f64 + Send + Sync,
{
    fn weight(&self, requirement: &Requirement) -> f64 {
        self(requirement)
    }
}

/// Favors early turns and color-heavy costs:
/// `turn_decay^(turn - 1) * (1 + pip_bonus * colored_pips)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveWeights {
    pub turn_decay: f64,
    pub pip_bonus: f64,
}

impl Default for CurveWeights {
    fn default() -> Self {
        CurveWeights { turn_decay: 0.9, pip_bonus: 0.5 }
    }
}

impl WeightPolicy for CurveWeights {
    fn weight(&self, requirement: &Requirement) -> f64 {
        let decay = self.turn_decay.powi(requirement.turn.saturating_sub(1) as i32);
        decay * (1.0 + self.pip_bonus * requirement.cost.colored_pips() as f64)
    }
}

#[derive(Clone)]
pub struct WeightConfig {
    policy: Arc<dyn WeightPolicy>,
    overrides: BTreeMap<Requirement, f64>,
    pain_penalty: f64,
}

impl WeightConfig {
    pub fn new<P: WeightPolicy + 'static>(policy: P) -> Self {
        WeightConfig {
            policy: Arc::new(policy),
            overrides: BTreeMap::new(),
            pain_penalty: 0.0,
        }
    }

    /// Every requirement counts the same
    pub fn uniform() -> Self {
        Self::new(|_: &Requirement| 1.0)
    }

    pub fn with_override(mut self, requirement: Requirement, weight: f64) -> Self {
        self.overrides.insert(requirement, weight);
        self
    }

    /// Score lost per painful land in the allocation
    pub fn with_pain_penalty(mut self, penalty: f64) -> Self {
        self.pain_penalty = penalty;
        self
    }

    pub fn weight(&self, requirement: &Requirement) -> f64 {
        match self.overrides.get(requirement) {
            Some(weight) => *weight,
            None => self.policy.weight(requirement),
        }
    }

    pub fn pain_penalty(&self) -> f64 {
        self.pain_penalty
    }

    /// Weights for `requirements`, in order; each must be positive and finite
    pub fn weights_for(&self, requirements: &[Requirement]) -> Result<Vec<f64>, SolveError> {
        requirements
            .iter()
            .map(|requirement| {
                let weight = self.weight(requirement);
                if weight > 0.0 && weight.is_finite() {
                    Ok(weight)
                } else {
                    Err(SolveError::InvalidWeight { requirement: requirement.to_string(), weight })
                }
            })
            .collect()
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::new(CurveWeights::default())
    }
}

impl fmt::Debug for WeightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightConfig")
            .field("overrides", &self.overrides)
            .field("pain_penalty", &self.pain_penalty)
            .finish_non_exhaustive()
    }
}
