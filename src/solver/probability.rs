//! Exact probability that a requirement is castable by its turn.
//!
//! Lands are grouped by the subset of the requirement's colors they make and
//! by whether they are usable when drawn late. A table over the draw windows
//! counts every way of drawing those groups; each terminal state is checked
//! with Hall's condition so dual lands are shared correctly between colors.

use crate::card::types::{ColorSet, Condition, Entry, ManaColor, Requirement};
use crate::config::{DrawPolicy, SolverConfig};
use crate::solver::allocation::Allocation;
use crate::solver::deck::Deck;
use crate::solver::SolveError;
use std::collections::BTreeMap;

/// When a drawn land can pay for a spell cast on the requirement's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTiming {
    /// Usable the turn it is drawn
    Ready,
    /// Usable only if drawn by the previous turn
    Delayed,
    /// Makes none of the needed mana
    Inert,
}

/// Pascal's triangle up to a fixed row
#[derive(Debug, Clone)]
pub struct Binomials {
    rows: Vec<Vec<f64>>,
}

impl Binomials {
    pub fn new(max_n: usize) -> Self {
        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(max_n + 1);
        for n in 0..=max_n {
            let mut row = vec![1.0; n + 1];
            for k in 1..n {
                row[k] = rows[n - 1][k - 1] + rows[n - 1][k];
            }
            rows.push(row);
        }
        Binomials { rows }
    }

    pub fn choose(&self, n: usize, k: usize) -> f64 {
        if k > n {
            return 0.0;
        }
        self.rows.get(n).map_or(0.0, |row| row[k])
    }

    /// Hypergeometric P(at least `needed` successes in `draws` cards)
    pub fn at_least(&self, population: usize, successes: usize, draws: usize, needed: usize) -> f64 {
        if needed == 0 {
            return 1.0;
        }
        let draws = draws.min(population);
        let successes = successes.min(population);
        let total = self.choose(population, draws);
        if total == 0.0 {
            return 0.0;
        }
        let hits: f64 = (needed..=successes.min(draws))
            .map(|i| self.choose(successes, i) * self.choose(population - successes, draws - i))
            .sum();
        (hits / total).min(1.0)
    }
}

/// True when `sources` can pay every pip in `demands`.
///
/// Each source pays one pip of any color in its set. By Hall's theorem this
/// holds exactly when every subset of demanded colors is covered by at least
/// as many sources producing one of them as it has pips.
pub fn covers_demand(demands: &[(ManaColor, u32)], sources: &[(ColorSet, u32)]) -> bool {
    let subsets = 1u32 << demands.len();
    (1..subsets).all(|mask| {
        let mut colors = ColorSet::EMPTY;
        let mut needed = 0u32;
        for (i, (color, pips)) in demands.iter().enumerate() {
            if mask & (1 << i) != 0 {
                colors.insert(*color);
                needed += *pips;
            }
        }
        let available: u32 = sources
            .iter()
            .filter(|(produces, _)| produces.intersects(colors))
            .map(|(_, count)| count)
            .sum();
        available >= needed
    })
}

type State = (usize, usize, Vec<u32>);

/// Reusable castability calculator for one deck and configuration
#[derive(Debug, Clone)]
pub struct ProbabilityEngine {
    deck_size: usize,
    land_count: usize,
    draw: DrawPolicy,
    conditional_threshold: f64,
    binomials: Binomials,
}

impl ProbabilityEngine {
    pub fn new(deck: &Deck, config: &SolverConfig) -> Self {
        ProbabilityEngine {
            deck_size: deck.size,
            land_count: deck.land_count,
            draw: config.draw,
            conditional_threshold: config.conditional_threshold,
            binomials: Binomials::new(deck.size),
        }
    }

    /// Cards seen by `turn`, capped at the deck size
    pub fn cards_seen(&self, turn: u32) -> usize {
        self.draw.cards_seen(turn).min(self.deck_size)
    }

    /// Cards seen by the turn before `turn`; nothing is seen before turn 1
    pub fn early_seen(&self, turn: u32) -> usize {
        if turn <= 1 {
            0
        } else {
            self.cards_seen(turn - 1)
        }
    }

    /// Resolve how category `index` of `allocation` behaves on `turn`.
    ///
    /// Check lands, snarls, tangos and filters switch between timings all at
    /// once when their enabler chance crosses `conditional_threshold`. Adding
    /// one of them can therefore lower a castability probability; only
    /// unconditional categories make the engine monotone in source counts.
    pub fn source_timing(&self, allocation: &Allocation, index: usize, turn: u32) -> SourceTiming {
        let category = &allocation.categories()[index];
        let condition = match category.entry {
            Entry::Untapped => return SourceTiming::Ready,
            Entry::Tapped => return SourceTiming::Delayed,
            Entry::Conditional(condition) => condition,
        };

        let colored = category.produces.intersection(ManaColor::WUBRG.into_iter().collect());
        let others = allocation.iter().enumerate().filter(|(j, _)| *j != index);

        let (enablers, window, needed): (usize, usize, usize) = match condition {
            Condition::ControlsBasicType | Condition::RevealsBasicType => {
                let enablers = others
                    .filter(|(_, (c, _))| c.basic_types.intersects(category.produces))
                    .map(|(_, (_, n))| n)
                    .sum::<usize>();
                let window = if condition == Condition::RevealsBasicType {
                    self.cards_seen(turn)
                } else {
                    self.early_seen(turn)
                };
                (enablers, window, 1)
            }
            Condition::ControlsTwoBasics => {
                if turn <= 2 {
                    return SourceTiming::Delayed;
                }
                let enablers = others
                    .filter(|(_, (c, _))| c.is_basic)
                    .map(|(_, (_, n))| n)
                    .sum::<usize>();
                (enablers, self.early_seen(turn), 2)
            }
            Condition::FilterEnabler => {
                if turn <= 1 {
                    return SourceTiming::Inert;
                }
                let enablers = others
                    .filter(|(_, (c, _))| {
                        c.condition() != Some(Condition::FilterEnabler) && c.produces_any(colored)
                    })
                    .map(|(_, (_, n))| n)
                    .sum::<usize>();
                (enablers, self.early_seen(turn), 1)
            }
        };

        let chance = self.binomials.at_least(self.deck_size, enablers, window, needed);
        if chance >= self.conditional_threshold {
            SourceTiming::Ready
        } else if condition == Condition::FilterEnabler {
            SourceTiming::Inert
        } else {
            SourceTiming::Delayed
        }
    }

    /// Probability that `requirement` can be cast by its turn with `allocation`
    pub fn probability_of_casting(
        &self,
        requirement: &Requirement,
        allocation: &Allocation,
    ) -> Result<f64, SolveError> {
        requirement.validate()?;
        if allocation.total() != self.land_count {
            return Err(SolveError::InvalidAllocation(format!(
                "{} lands allocated for a budget of {}",
                allocation.total(),
                self.land_count
            )));
        }

        let pips = requirement.cost.colored_pips();
        if pips == 0 {
            return Ok(1.0);
        }
        if pips > requirement.turn {
            return Ok(0.0);
        }
        Ok(self.joint_probability(requirement, allocation))
    }

    fn joint_probability(&self, requirement: &Requirement, allocation: &Allocation) -> f64 {
        let turn = requirement.turn;
        let demands = requirement.cost.color_demands();
        let colors = requirement.cost.colors();
        let pips = requirement.cost.colored_pips();
        let early = self.early_seen(turn);
        let late = self.cards_seen(turn) - early;

        let mut groups: BTreeMap<(ColorSet, bool), usize> = BTreeMap::new();
        let mut sources = 0;
        for (index, (category, count)) in allocation.iter().enumerate() {
            let signature = category.produces.intersection(colors);
            if count == 0 || signature.is_empty() {
                continue;
            }
            let delayed = match self.source_timing(allocation, index, turn) {
                SourceTiming::Ready => false,
                SourceTiming::Delayed => true,
                SourceTiming::Inert => continue,
            };
            *groups.entry((signature, delayed)).or_insert(0) += count;
            sources += count;
        }

        let mut signatures: Vec<ColorSet> = groups.keys().map(|(s, _)| *s).collect();
        signatures.dedup();

        let mut states: BTreeMap<State, f64> = BTreeMap::new();
        states.insert((0, 0, vec![0; signatures.len()]), 1.0);

        for (&(signature, delayed), &count) in &groups {
            let slot = signatures.iter().position(|s| *s == signature).unwrap_or(0);
            let mut next: BTreeMap<State, f64> = BTreeMap::new();
            for ((used_early, used_late, usable), ways) in &states {
                for x in 0..=count.min(early - used_early) {
                    let drawn_early = self.binomials.choose(count, x);
                    for y in 0..=(count - x).min(late - used_late) {
                        let gained = if delayed { x } else { x + y };
                        let mut usable = usable.clone();
                        usable[slot] = (usable[slot] + gained as u32).min(pips);
                        let ways = ways * drawn_early * self.binomials.choose(count - x, y);
                        *next.entry((used_early + x, used_late + y, usable)).or_insert(0.0) += ways;
                    }
                }
            }
            states = next;
        }

        let blanks = self.deck_size - sources;
        let (mut hit, mut miss) = (0.0, 0.0);
        for ((used_early, used_late, usable), ways) in states {
            let early_blanks = early - used_early;
            let late_blanks = late - used_late;
            let fill = match blanks.checked_sub(early_blanks) {
                Some(rest) => self.binomials.choose(blanks, early_blanks) * self.binomials.choose(rest, late_blanks),
                None => 0.0,
            };
            if fill == 0.0 {
                continue;
            }
            let available: Vec<(ColorSet, u32)> = signatures.iter().copied().zip(usable).collect();
            if covers_demand(&demands, &available) {
                hit += ways * fill;
            } else {
                miss += ways * fill;
            }
        }

        if hit + miss == 0.0 {
            0.0
        } else {
            hit / (hit + miss)
        }
    }
}

/// Probability of casting `requirement` on time with the default draw rules
pub fn probability_of_casting(
    requirement: &Requirement,
    allocation: &Allocation,
    deck: &Deck,
) -> Result<f64, SolveError> {
    ProbabilityEngine::new(deck, &SolverConfig::default()).probability_of_casting(requirement, allocation)
}
