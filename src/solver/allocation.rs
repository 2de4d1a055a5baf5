//! Land categories, pools and allocations over them.
//!
//! An allocation assigns a count to every category of a pool. Allocations
//! are values: moving a land from one category to another produces a new
//! allocation, which is what the search explores.

use crate::card::types::{ColorSet, Condition, Entry, LandCard, ManaColor};
use crate::solver::SolveError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lands that are interchangeable for probability purposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandCategory {
    pub name: String,
    pub lands: Vec<String>,
    pub produces: ColorSet,
    pub entry: Entry,
    pub basic_types: ColorSet,
    pub is_basic: bool,
    pub painful: bool,
    pub cap: usize,
}

impl LandCategory {
    pub fn new(name: &str, produces: ColorSet, entry: Entry, cap: usize) -> Self {
        LandCategory {
            name: name.to_string(),
            lands: vec![name.to_string()],
            produces,
            entry,
            basic_types: ColorSet::EMPTY,
            is_basic: false,
            painful: false,
            cap,
        }
    }

    /// Basic land of one color, carrying its basic land type
    pub fn basic(name: &str, color: ManaColor, cap: usize) -> Self {
        let colors = ColorSet::EMPTY.with(color);
        LandCategory {
            basic_types: if color == ManaColor::Colorless { ColorSet::EMPTY } else { colors },
            is_basic: true,
            ..LandCategory::new(name, colors, Entry::Untapped, cap)
        }
    }

    pub fn painful(mut self) -> Self {
        self.painful = true;
        self
    }

    pub fn from_land(land: &LandCard, land_count: usize) -> Self {
        LandCategory {
            name: land.name.clone(),
            lands: vec![land.name.clone()],
            produces: land.produced_colors(),
            entry: land.entry,
            basic_types: land.basic_land_types(),
            is_basic: land.is_basic(),
            painful: land.painful,
            cap: land.copy_limit(land_count),
        }
    }

    pub fn produces_any(&self, colors: ColorSet) -> bool {
        self.produces.intersects(colors)
    }

    pub fn condition(&self) -> Option<Condition> {
        match self.entry {
            Entry::Conditional(condition) => Some(condition),
            _ => None,
        }
    }

    fn same_kind(&self, other: &LandCategory) -> bool {
        self.produces == other.produces
            && self.entry == other.entry
            && self.basic_types == other.basic_types
            && self.is_basic == other.is_basic
            && self.painful == other.painful
    }

    /// Documented pool order: fewest produced colors first, then color bits
    /// in WUBRGC order, then untapped before conditional before tapped, then name.
    fn order_key(&self) -> (usize, u8, u8, &str) {
        (self.produces.len(), self.produces.bits(), self.entry.rank(), &self.name)
    }
}

/// The land categories available to a deck, in a fixed order
#[derive(Debug, Clone)]
pub struct LandPool {
    categories: Arc<[LandCategory]>,
}

impl LandPool {
    pub fn new(mut categories: Vec<LandCategory>) -> Self {
        categories.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        LandPool { categories: categories.into() }
    }

    /// Group catalog lands into categories; caps add up within a category
    pub fn from_lands(lands: &[LandCard], land_count: usize) -> Self {
        let mut categories: Vec<LandCategory> = Vec::new();
        for land in lands {
            let category = LandCategory::from_land(land, land_count);
            match categories.iter_mut().find(|c| c.same_kind(&category)) {
                Some(existing) => {
                    existing.lands.push(land.name.clone());
                    existing.lands.sort();
                    existing.name = existing.lands.join(" / ");
                    existing.cap += category.cap;
                }
                None => categories.push(category),
            }
        }
        LandPool::new(categories)
    }

    pub fn categories(&self) -> &[LandCategory] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total_capacity(&self) -> usize {
        self.categories.iter().map(|c| c.cap).sum()
    }

    /// Index of the category named `name`, or containing a land named `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|c| c.name == name)
            .or_else(|| self.categories.iter().position(|c| c.lands.iter().any(|l| l == name)))
    }
}

/// Transfer of one land slot between two categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

/// Land counts per category of a pool
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    categories: Arc<[LandCategory]>,
    counts: Vec<usize>,
}

impl Allocation {
    pub fn new(pool: &LandPool, counts: Vec<usize>) -> Result<Self, SolveError> {
        if counts.len() != pool.len() {
            return Err(SolveError::InvalidAllocation(format!(
                "{} counts given for {} categories",
                counts.len(),
                pool.len()
            )));
        }
        for (category, count) in pool.categories().iter().zip(&counts) {
            if *count > category.cap {
                return Err(SolveError::InvalidAllocation(format!(
                    "{} {} exceeds the limit of {}",
                    count, category.name, category.cap
                )));
            }
        }
        Ok(Allocation { categories: pool.categories.clone(), counts })
    }

    /// Build from (name, count) pairs; unnamed categories get zero
    pub fn from_named(pool: &LandPool, named: &[(&str, usize)]) -> Result<Self, SolveError> {
        let mut counts = vec![0; pool.len()];
        for (name, count) in named {
            let index = pool.index_of(name).ok_or_else(|| {
                SolveError::InvalidAllocation(format!("{} is not in the land pool", name))
            })?;
            counts[index] += count;
        }
        Allocation::new(pool, counts)
    }

    /// Parse "9 Island, 8 Mountain"
    pub fn parse(pool: &LandPool, text: &str) -> Result<Self, SolveError> {
        let mut named = Vec::new();
        for item in text.split([',', '\n']).map(str::trim).filter(|s| !s.is_empty()) {
            let (count, name) = item.split_once(' ').ok_or_else(|| {
                SolveError::InvalidAllocation(format!("expected 'COUNT NAME', got '{}'", item))
            })?;
            let count: usize = count.parse().map_err(|_| {
                SolveError::InvalidAllocation(format!("'{}' is not a valid number", count))
            })?;
            named.push((name.trim(), count));
        }
        Allocation::from_named(pool, &named)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn categories(&self) -> &[LandCategory] {
        &self.categories
    }

    pub fn count_of(&self, name: &str) -> usize {
        self.categories
            .iter()
            .zip(&self.counts)
            .filter(|(c, _)| c.name == name || c.lands.iter().any(|l| l == name))
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LandCategory, usize)> {
        self.categories.iter().zip(self.counts.iter().copied())
    }

    /// Lands that produce any of `colors`
    pub fn sources_of(&self, colors: ColorSet) -> usize {
        self.iter()
            .filter(|(c, _)| c.produces_any(colors))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn painful_lands(&self) -> usize {
        self.iter().filter(|(c, _)| c.painful).map(|(_, count)| count).sum()
    }

    /// The allocation after `mv`, or `None` if it would leave the caps
    pub fn apply(&self, mv: Move) -> Option<Allocation> {
        if mv.from == mv.to
            || mv.from >= self.counts.len()
            || mv.to >= self.counts.len()
            || self.counts[mv.from] == 0
            || self.counts[mv.to] >= self.categories[mv.to].cap
        {
            return None;
        }
        let mut counts = self.counts.clone();
        counts[mv.from] -= 1;
        counts[mv.to] += 1;
        Some(Allocation { categories: self.categories.clone(), counts })
    }

    /// Every single-slot move, in lexicographic (from, to) order
    pub fn neighbors(&self) -> Neighbors<'_> {
        Neighbors { allocation: self, from: 0, to: 0 }
    }

    pub fn describe_move(&self, mv: Move) -> String {
        format!("{} -> {}", self.categories[mv.from].name, self.categories[mv.to].name)
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<_> = self.iter().filter(|(_, count)| *count > 0).collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
        let parts: Vec<String> = items
            .iter()
            .map(|(category, count)| format!("{} {}", count, category.name))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl Serialize for Allocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nonzero: Vec<_> = self.iter().filter(|(_, count)| *count > 0).collect();
        let mut map = serializer.serialize_map(Some(nonzero.len()))?;
        for (category, count) in nonzero {
            map.serialize_entry(&category.name, &count)?;
        }
        map.end()
    }
}

/// Lazy, restartable sequence of neighbor allocations
#[derive(Clone)]
pub struct Neighbors<'a> {
    allocation: &'a Allocation,
    from: usize,
    to: usize,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = (Move, Allocation);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.allocation.counts.len();
        while self.from < n {
            if self.to >= n {
                self.from += 1;
                self.to = 0;
                continue;
            }
            let mv = Move { from: self.from, to: self.to };
            self.to += 1;
            if let Some(next) = self.allocation.apply(mv) {
                return Some((mv, next));
            }
        }
        None
    }
}

/// Split `budget` proportionally to `scores` with largest remainders,
/// never exceeding `caps`. Categories whose share reaches their cap are
/// pinned there and the rest re-apportioned. Ties go to the lower index.
pub fn apportion(budget: usize, scores: &[f64], caps: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; scores.len()];
    let mut remaining = budget;
    let mut active: Vec<usize> = (0..scores.len())
        .filter(|&i| scores[i] > 0.0 && caps[i] > 0)
        .collect();

    while remaining > 0 && !active.is_empty() {
        let total: f64 = active.iter().map(|&i| scores[i]).sum();
        let quotas: Vec<(usize, f64)> = active
            .iter()
            .map(|&i| (i, remaining as f64 * scores[i] / total))
            .collect();

        let pinned: Vec<usize> = quotas
            .iter()
            .filter(|(i, q)| *q >= caps[*i] as f64)
            .map(|(i, _)| *i)
            .collect();
        if !pinned.is_empty() {
            for &i in &pinned {
                counts[i] = caps[i];
                remaining = remaining.saturating_sub(caps[i]);
            }
            active.retain(|i| !pinned.contains(i));
            continue;
        }

        let mut remainders = Vec::with_capacity(active.len());
        let mut placed = 0;
        for (i, q) in quotas {
            let floor = q.floor() as usize;
            counts[i] = floor;
            placed += floor;
            remainders.push((i, q - floor as f64));
        }
        remaining -= placed.min(remaining);
        remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (i, _) in remainders.into_iter().take(remaining) {
            counts[i] += 1;
        }
        break;
    }
    counts
}

/// Deterministic starting allocation proportional to each color's weighted pip demand.
///
/// Untapped mono-colored categories share the budget by their color's
/// demand. When the pool has none, every category making a deck color is
/// weighted by the demand it can serve. Whatever cannot be placed that way
/// fills remaining capacity in pool order, deck-color producers first.
pub fn proportional_seed(
    pool: &LandPool,
    demand: &BTreeMap<ManaColor, f64>,
    budget: usize,
) -> Result<Allocation, SolveError> {
    let available = pool.total_capacity();
    if available < budget {
        return Err(SolveError::InfeasibleBudget { available, required: budget });
    }

    let deck_colors: ColorSet = demand.iter().filter(|(_, d)| **d > 0.0).map(|(c, _)| *c).collect();
    let caps: Vec<usize> = pool.categories().iter().map(|c| c.cap).collect();

    let mono_scores: Vec<f64> = pool
        .categories()
        .iter()
        .map(|category| {
            let served = category.produces.intersection(deck_colors);
            if category.entry == Entry::Untapped && served.len() == 1 {
                served.iter().map(|c| demand[&c]).sum::<f64>()
            } else {
                0.0
            }
        })
        .collect();

    let scores = if mono_scores.iter().any(|s| *s > 0.0) {
        mono_scores
    } else {
        pool.categories()
            .iter()
            .map(|category| {
                category
                    .produces
                    .intersection(deck_colors)
                    .iter()
                    .map(|c| demand[&c])
                    .sum::<f64>()
            })
            .collect()
    };

    let mut counts = apportion(budget, &scores, &caps);
    let mut remaining = budget - counts.iter().sum::<usize>();

    let producers = (0..pool.len()).filter(|&i| pool.categories()[i].produces_any(deck_colors));
    let others = (0..pool.len()).filter(|&i| !pool.categories()[i].produces_any(deck_colors));
    for i in producers.chain(others) {
        if remaining == 0 {
            break;
        }
        let room = (caps[i] - counts[i]).min(remaining);
        counts[i] += room;
        remaining -= room;
    }

    Allocation::new(pool, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_basics(cap: usize) -> LandPool {
        LandPool::new(vec![
            LandCategory::basic("Mountain", ManaColor::Red, cap),
            LandCategory::basic("Island", ManaColor::Blue, cap),
        ])
    }

    #[test]
    fn test_pool_order_is_documented_order() {
        let pool = LandPool::new(vec![
            LandCategory::new("Tapped UR", ColorSet::EMPTY.with(ManaColor::Blue).with(ManaColor::Red), Entry::Tapped, 4),
            LandCategory::basic("Mountain", ManaColor::Red, 17),
            LandCategory::new("Untapped UR", ColorSet::EMPTY.with(ManaColor::Blue).with(ManaColor::Red), Entry::Untapped, 4),
            LandCategory::basic("Island", ManaColor::Blue, 17),
        ]);
        let names: Vec<&str> = pool.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Island", "Mountain", "Untapped UR", "Tapped UR"]);
    }

    #[test]
    fn test_from_lands_merges_equivalent_lands() {
        let json = r#"[
            {"name": "Creeping Tar Pit", "subtype": "creature", "produces": ["U", "B"], "entry": "tapped"},
            {"name": "Restless Reef", "subtype": "restless", "produces": ["U", "B"], "entry": "tapped"},
            {"name": "Island", "subtype": "basic", "produces": ["U"], "basic_types": ["U"]}
        ]"#;
        let lands: Vec<LandCard> = serde_json::from_str(json).expect("valid lands");
        let pool = LandPool::from_lands(&lands, 20);
        assert_eq!(pool.len(), 2);
        let duals = &pool.categories()[1];
        assert_eq!(duals.cap, 8);
        assert_eq!(duals.name, "Creeping Tar Pit / Restless Reef");
        assert_eq!(pool.index_of("Restless Reef"), Some(1));
        assert_eq!(pool.categories()[0].cap, 20);
    }

    #[test]
    fn test_allocation_rejects_counts_over_cap() {
        let pool = two_basics(10);
        assert!(Allocation::new(&pool, vec![11, 0]).is_err());
        assert!(Allocation::new(&pool, vec![1]).is_err());
        let alloc = Allocation::new(&pool, vec![7, 10]).expect("within caps");
        assert_eq!(alloc.total(), 17);
    }

    #[test]
    fn test_parse_allocation() {
        let pool = two_basics(17);
        let alloc = Allocation::parse(&pool, "9 Island, 8 Mountain").expect("valid allocation");
        assert_eq!(alloc.count_of("Island"), 9);
        assert_eq!(alloc.count_of("Mountain"), 8);
        assert_eq!(alloc.to_string(), "9 Island, 8 Mountain");
        assert!(Allocation::parse(&pool, "9 Forest").is_err());
        assert!(Allocation::parse(&pool, "nine Island").is_err());
    }

    #[test]
    fn test_neighbors_preserve_total_and_caps() {
        let pool = LandPool::new(vec![
            LandCategory::basic("Island", ManaColor::Blue, 17),
            LandCategory::basic("Mountain", ManaColor::Red, 17),
            LandCategory::new("Shivan Reef", ColorSet::EMPTY.with(ManaColor::Blue).with(ManaColor::Red), Entry::Untapped, 4),
        ]);
        let alloc = Allocation::new(&pool, vec![9, 4, 4]).expect("valid");
        let neighbors: Vec<_> = alloc.neighbors().collect();
        for (_, next) in &neighbors {
            assert_eq!(next.total(), 17);
            assert!(next.iter().all(|(c, n)| n <= c.cap));
        }
        let moves: Vec<Move> = neighbors.iter().map(|(mv, _)| *mv).collect();
        // Shivan Reef is at its cap, so nothing moves into it
        assert_eq!(
            moves,
            vec![Move { from: 0, to: 1 }, Move { from: 1, to: 0 }, Move { from: 2, to: 0 }, Move { from: 2, to: 1 }]
        );
    }

    #[test]
    fn test_neighbors_are_restartable() {
        let pool = two_basics(17);
        let alloc = Allocation::new(&pool, vec![8, 9]).expect("valid");
        let first: Vec<Move> = alloc.neighbors().map(|(mv, _)| mv).collect();
        let second: Vec<Move> = alloc.neighbors().map(|(mv, _)| mv).collect();
        assert_eq!(first, second);
        assert_eq!(alloc.counts(), &[8, 9], "neighbors never touch the original");
    }

    #[test]
    fn test_apportion_respects_caps_and_budget() {
        let counts = apportion(17, &[1.0, 3.0], &[17, 17]);
        assert_eq!(counts.iter().sum::<usize>(), 17);
        assert!(counts[1] > counts[0]);

        let capped = apportion(17, &[1.0, 9.0], &[17, 4]);
        assert_eq!(capped, vec![13, 4]);

        let short = apportion(10, &[1.0, 1.0], &[3, 3]);
        assert_eq!(short, vec![3, 3]);
    }

    #[test]
    fn test_apportion_ties_go_to_lower_index() {
        assert_eq!(apportion(3, &[1.0, 1.0], &[10, 10]), vec![2, 1]);
    }

    #[test]
    fn test_seed_fills_budget_and_detects_infeasible_pool() {
        let pool = two_basics(17);
        let mut demand = BTreeMap::new();
        demand.insert(ManaColor::Blue, 1.0);
        demand.insert(ManaColor::Red, 3.0);
        let seed = proportional_seed(&pool, &demand, 17).expect("feasible");
        assert_eq!(seed.total(), 17);
        assert!(seed.count_of("Mountain") > seed.count_of("Island"));

        let small = two_basics(5);
        assert_eq!(
            proportional_seed(&small, &demand, 17),
            Err(SolveError::InfeasibleBudget { available: 10, required: 17 })
        );
    }

    #[test]
    fn test_seed_uses_duals_when_no_basics() {
        let ub = ColorSet::EMPTY.with(ManaColor::Blue).with(ManaColor::Black);
        let pool = LandPool::new(vec![
            LandCategory::new("Tapped UB", ub, Entry::Tapped, 10),
            LandCategory::new("Wastes", ColorSet::EMPTY.with(ManaColor::Colorless), Entry::Untapped, 20),
        ]);
        let mut demand = BTreeMap::new();
        demand.insert(ManaColor::Blue, 2.0);
        let seed = proportional_seed(&pool, &demand, 12).expect("feasible");
        assert_eq!(seed.count_of("Tapped UB"), 10);
        assert_eq!(seed.count_of("Wastes"), 2);
    }
}
