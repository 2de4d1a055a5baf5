//! Steepest-ascent search over land allocations.

use crate::card::types::{ManaColor, Requirement};
use crate::config::SolverConfig;
use crate::solver::allocation::{proportional_seed, Allocation, LandPool, Move};
use crate::solver::deck::Deck;
use crate::solver::probability::ProbabilityEngine;
use crate::solver::solution::{CardProbability, Solution};
use crate::solver::weights::WeightConfig;
use crate::solver::SolveError;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// One accepted move of the search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStep {
    pub step: usize,
    #[serde(rename = "move")]
    pub mv: Move,
    pub description: String,
    pub score: f64,
    pub evaluations: usize,
}

/// Score of one allocation, with probabilities in deck order
struct Scored {
    probabilities: Vec<f64>,
    score: f64,
}

/// Everything fixed for the duration of one search
struct Objective<'a> {
    engine: ProbabilityEngine,
    deck: &'a Deck,
    weights: Vec<f64>,
    pain_penalty: f64,
    /// Distinct requirements and, per deck slot, the index of its distinct requirement
    distinct: Vec<Requirement>,
    slots: Vec<usize>,
    parallel: bool,
}

impl<'a> Objective<'a> {
    fn new(deck: &'a Deck, weight_config: &WeightConfig, config: &SolverConfig) -> Result<Self, SolveError> {
        if deck.requirements.is_empty() {
            return Err(SolveError::EmptyDeck);
        }
        for requirement in &deck.requirements {
            requirement.validate()?;
        }
        let weights = weight_config.weights_for(&deck.requirements)?;

        let mut index: BTreeMap<Requirement, usize> = BTreeMap::new();
        let mut distinct = Vec::new();
        let slots = deck
            .requirements
            .iter()
            .map(|requirement| {
                *index.entry(*requirement).or_insert_with(|| {
                    distinct.push(*requirement);
                    distinct.len() - 1
                })
            })
            .collect();

        Ok(Objective {
            engine: ProbabilityEngine::new(deck, config),
            deck,
            weights,
            pain_penalty: weight_config.pain_penalty(),
            distinct,
            slots,
            parallel: config.parallel,
        })
    }

    fn score(&self, allocation: &Allocation) -> Result<Scored, SolveError> {
        let per_requirement: Vec<f64> = if self.parallel {
            self.distinct
                .par_iter()
                .map(|r| self.engine.probability_of_casting(r, allocation))
                .collect::<Result<_, _>>()?
        } else {
            self.distinct
                .iter()
                .map(|r| self.engine.probability_of_casting(r, allocation))
                .collect::<Result<_, _>>()?
        };

        let probabilities: Vec<f64> = self.slots.iter().map(|&i| per_requirement[i]).collect();
        let mut score = 0.0;
        for (weight, probability) in self.weights.iter().zip(&probabilities) {
            score += weight * probability;
        }
        score -= self.pain_penalty * allocation.painful_lands() as f64;
        Ok(Scored { probabilities, score })
    }

    /// Weighted pip demand per color
    fn color_demand(&self) -> BTreeMap<ManaColor, f64> {
        let mut demand = BTreeMap::new();
        for (requirement, weight) in self.deck.requirements.iter().zip(&self.weights) {
            for (color, pips) in requirement.cost.color_demands() {
                *demand.entry(color).or_insert(0.0) += weight * pips as f64;
            }
        }
        demand
    }

    fn solution(
        &self,
        allocation: Allocation,
        scored: Scored,
        evaluations: usize,
        converged: bool,
        trace: Vec<SearchStep>,
    ) -> Solution {
        let probabilities = self
            .deck
            .requirements
            .iter()
            .zip(&self.weights)
            .zip(scored.probabilities)
            .map(|((requirement, weight), probability)| CardProbability {
                requirement: *requirement,
                probability,
                weight: *weight,
            })
            .collect();
        Solution::new(allocation, probabilities, scored.score, evaluations, converged, trace)
    }
}

/// Hill-climbing mana base optimizer
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Deterministic starting allocation for `deck` over `pool`
    pub fn seed(&self, deck: &Deck, weights: &WeightConfig, pool: &LandPool) -> Result<Allocation, SolveError> {
        let objective = Objective::new(deck, weights, &self.config)?;
        proportional_seed(pool, &objective.color_demand(), deck.land_count)
    }

    pub fn solve(&self, deck: &Deck, weights: &WeightConfig, pool: &LandPool) -> Result<Solution, SolveError> {
        let objective = Objective::new(deck, weights, &self.config)?;
        let seed = proportional_seed(pool, &objective.color_demand(), deck.land_count)?;
        self.climb(&objective, seed)
    }

    /// Search starting from a given allocation instead of the proportional seed
    pub fn solve_from(&self, deck: &Deck, weights: &WeightConfig, seed: Allocation) -> Result<Solution, SolveError> {
        let objective = Objective::new(deck, weights, &self.config)?;
        self.check_budget(deck, &seed)?;
        self.climb(&objective, seed)
    }

    /// Score an allocation without searching
    pub fn evaluate(&self, deck: &Deck, weights: &WeightConfig, allocation: Allocation) -> Result<Solution, SolveError> {
        let objective = Objective::new(deck, weights, &self.config)?;
        self.check_budget(deck, &allocation)?;
        let scored = objective.score(&allocation)?;
        Ok(objective.solution(allocation, scored, 1, true, Vec::new()))
    }

    fn check_budget(&self, deck: &Deck, allocation: &Allocation) -> Result<(), SolveError> {
        if allocation.total() != deck.land_count {
            return Err(SolveError::InvalidAllocation(format!(
                "{} lands allocated for a budget of {}",
                allocation.total(),
                deck.land_count
            )));
        }
        Ok(())
    }

    fn climb(&self, objective: &Objective<'_>, seed: Allocation) -> Result<Solution, SolveError> {
        let max_evaluations = self.config.max_evaluations.max(1);
        let mut current = seed;
        let mut current_scored = objective.score(&current)?;
        let mut evaluations = 1;
        let mut trace = Vec::new();

        let converged = loop {
            let mut best: Option<(Move, Allocation, Scored)> = None;
            let mut exhausted = false;

            for (mv, candidate) in current.neighbors() {
                if evaluations >= max_evaluations {
                    exhausted = true;
                    break;
                }
                let scored = objective.score(&candidate)?;
                evaluations += 1;
                let to_beat = best.as_ref().map_or(current_scored.score, |(_, _, b)| b.score);
                if scored.score > to_beat {
                    best = Some((mv, candidate, scored));
                }
            }

            if let Some((mv, next, scored)) = best {
                trace.push(SearchStep {
                    step: trace.len() + 1,
                    mv,
                    description: current.describe_move(mv),
                    score: scored.score,
                    evaluations,
                });
                current = next;
                current_scored = scored;
                if exhausted {
                    break false;
                }
            } else {
                break !exhausted;
            }
        };

        Ok(objective.solution(current, current_scored, evaluations, converged, trace))
    }
}

/// Optimize with the default configuration
pub fn solve(deck: &Deck, weights: &WeightConfig, pool: &LandPool) -> Result<Solution, SolveError> {
    Solver::default().solve(deck, weights, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::allocation::LandCategory;

    fn deck(size: usize, lands: usize, requirements: &[&str]) -> Deck {
        let requirements = requirements.iter().map(|s| s.parse().expect("valid requirement")).collect();
        Deck::new(requirements, size, lands).expect("valid deck")
    }

    fn islands_and_mountains(cap: usize) -> LandPool {
        LandPool::new(vec![
            LandCategory::basic("Island", ManaColor::Blue, cap),
            LandCategory::basic("Mountain", ManaColor::Red, cap),
        ])
    }

    #[test]
    fn test_empty_deck_is_rejected() {
        let d = deck(60, 17, &[]);
        let result = solve(&d, &WeightConfig::default(), &islands_and_mountains(17));
        assert_eq!(result.err(), Some(SolveError::EmptyDeck));
    }

    #[test]
    fn test_infeasible_budget() {
        let d = deck(60, 17, &["T2 U"]);
        let result = solve(&d, &WeightConfig::default(), &islands_and_mountains(4));
        assert_eq!(result.err(), Some(SolveError::InfeasibleBudget { available: 8, required: 17 }));
    }

    #[test]
    fn test_invalid_weight() {
        let d = deck(60, 17, &["T2 U"]);
        let weights = WeightConfig::new(|_: &Requirement| -1.0);
        let result = solve(&d, &weights, &islands_and_mountains(17));
        assert!(matches!(result, Err(SolveError::InvalidWeight { .. })));
    }

    #[test]
    fn test_mono_color_deck_plays_only_its_color() {
        let d = deck(60, 17, &["T1 R", "T3 RR", "T5 RRR"]);
        let solution = solve(&d, &WeightConfig::default(), &islands_and_mountains(17)).expect("solvable");
        assert_eq!(solution.allocation().count_of("Mountain"), 17);
        assert!(solution.converged());
    }

    #[test]
    fn test_trace_scores_strictly_increase() {
        let d = deck(60, 17, &["T2 U", "T6 RRR"]);
        let pool = islands_and_mountains(17);
        let seed = Allocation::new(&pool, vec![0, 17]).expect("valid");
        let solution = Solver::default()
            .solve_from(&d, &WeightConfig::default(), seed)
            .expect("solvable");
        assert!(!solution.trace().is_empty());
        for pair in solution.trace().windows(2) {
            assert!(pair[1].score > pair[0].score);
        }
        assert!(solution.converged());
    }

    #[test]
    fn test_equal_moves_keep_the_first_in_scan_order() {
        let d = deck(60, 17, &["T1 U"]);
        let pool = LandPool::new(vec![
            LandCategory::basic("Mountain", ManaColor::Red, 17),
            LandCategory::basic("Island B", ManaColor::Blue, 17),
            LandCategory::basic("Island A", ManaColor::Blue, 17),
        ]);
        assert_eq!(pool.index_of("Island A"), Some(0));
        assert_eq!(pool.index_of("Mountain"), Some(2));

        let seed = Allocation::new(&pool, vec![0, 0, 17]).expect("valid");
        let solution = Solver::default()
            .solve_from(&d, &WeightConfig::default(), seed)
            .expect("solvable");

        // Mountain -> Island A and Mountain -> Island B always tie
        let first = Move { from: 2, to: 0 };
        assert_eq!(solution.trace()[0].mv, first);
        assert!(solution.trace().iter().all(|step| step.mv == first));
        assert_eq!(solution.allocation().count_of("Island A"), 17);
        assert_eq!(solution.allocation().count_of("Island B"), 0);
        assert!(solution.converged());
    }

    #[test]
    fn test_evaluation_cap_returns_best_so_far() {
        let d = deck(60, 17, &["T2 U", "T6 RRR"]);
        let pool = islands_and_mountains(17);
        let seed = Allocation::new(&pool, vec![0, 17]).expect("valid");
        let config = SolverConfig { max_evaluations: 3, ..SolverConfig::default() };
        let solution = Solver::new(config)
            .solve_from(&d, &WeightConfig::default(), seed)
            .expect("cap is not an error");
        assert!(!solution.converged());
        assert_eq!(solution.evaluations(), 3);
        assert_eq!(solution.allocation().total(), 17);
    }

    #[test]
    fn test_solve_from_rejects_wrong_total() {
        let d = deck(60, 17, &["T2 U"]);
        let pool = islands_and_mountains(17);
        let seed = Allocation::new(&pool, vec![10, 0]).expect("valid counts");
        assert!(matches!(
            Solver::default().solve_from(&d, &WeightConfig::default(), seed),
            Err(SolveError::InvalidAllocation(_))
        ));
    }

    #[test]
    fn test_parallel_and_sequential_scoring_agree() {
        let d = deck(60, 17, &["T1 U", "T2 UR", "T3 1RR", "T4 UURR"]);
        let pool = islands_and_mountains(17);
        let parallel = solve(&d, &WeightConfig::default(), &pool).expect("solvable");
        let config = SolverConfig { parallel: false, ..SolverConfig::default() };
        let sequential = Solver::new(config)
            .solve(&d, &WeightConfig::default(), &pool)
            .expect("solvable");
        assert_eq!(parallel.allocation(), sequential.allocation());
        assert_eq!(parallel.score().to_bits(), sequential.score().to_bits());
    }
}
