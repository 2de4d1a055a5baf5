use crate::card::types::Requirement;
use crate::solver::allocation::Allocation;
use crate::solver::optimize::SearchStep;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

fn as_notation<S: Serializer>(requirement: &Requirement, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(requirement)
}

/// Castability of one requirement under the chosen allocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardProbability {
    #[serde(serialize_with = "as_notation")]
    pub requirement: Requirement,
    pub probability: f64,
    pub weight: f64,
}

/// Result of a search
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    allocation: Allocation,
    probabilities: Vec<CardProbability>,
    score: f64,
    evaluations: usize,
    converged: bool,
    trace: Vec<SearchStep>,
}

impl Solution {
    pub fn new(
        allocation: Allocation,
        probabilities: Vec<CardProbability>,
        score: f64,
        evaluations: usize,
        converged: bool,
        trace: Vec<SearchStep>,
    ) -> Self {
        Solution { allocation, probabilities, score, evaluations, converged, trace }
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// One entry per deck requirement, in deck order
    pub fn probabilities(&self) -> &[CardProbability] {
        &self.probabilities
    }

    pub fn probability_of(&self, requirement: &Requirement) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|p| p.requirement == *requirement)
            .map(|p| p.probability)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// False when the evaluation cap stopped the search
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn trace(&self) -> &[SearchStep] {
        &self.trace
    }

    /// Weight-averaged castability, 0 to 1
    pub fn weighted_castability(&self) -> f64 {
        let total: f64 = self.probabilities.iter().map(|p| p.weight).sum();
        if total == 0.0 {
            return 0.0;
        }
        self.probabilities.iter().map(|p| p.weight * p.probability).sum::<f64>() / total
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lands ({}): {}", self.allocation.total(), self.allocation)?;
        writeln!(f, "Score: {:.4} | Weighted castability: {:.1}%", self.score, self.weighted_castability() * 100.0)?;
        writeln!(
            f,
            "Evaluations: {} ({})",
            self.evaluations,
            if self.converged { "local optimum" } else { "evaluation cap reached" }
        )?;
        writeln!(f)?;
        writeln!(f, "{:<16} {:>8} {:>8}", "Requirement", "Weight", "P(cast)")?;
        writeln!(f, "{}", "-".repeat(34))?;

        // Repeated requirements are listed once, with their copy count
        let mut seen: Vec<(&CardProbability, usize)> = Vec::new();
        for p in &self.probabilities {
            match seen.iter_mut().find(|(q, _)| q.requirement == p.requirement) {
                Some((_, copies)) => *copies += 1,
                None => seen.push((p, 1)),
            }
        }
        for (p, copies) in seen {
            let label = if copies > 1 {
                format!("{}x {}", copies, p.requirement)
            } else {
                p.requirement.to_string()
            };
            writeln!(f, "{:<16} {:>8.3} {:>7.1}%", label, p.weight, p.probability * 100.0)?;
        }
        Ok(())
    }
}

/// Write `solution` as JSON under `dir`, named by the current local time
pub fn save_solution_to_file(solution: &Solution, dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("solution_{}.json", stamp));
    let json = serde_json::to_string_pretty(solution)?;
    std::fs::write(&path, json)?;
    Ok(path)
}
