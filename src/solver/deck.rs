use crate::card::cost::CostParseError;
use crate::card::types::{ColorSet, Requirement};
use thiserror::Error;

/// Largest deck accepted
pub const MAX_DECK_SIZE: usize = 250;

pub const DEFAULT_DECK_SIZE: usize = 60;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("Invalid deck size: {0}")]
    InvalidSize(String),
    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),
}

/// The spells a mana base has to support, plus the deck's size and land budget
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub requirements: Vec<Requirement>,
    pub size: usize,
    pub land_count: usize,
}

impl Deck {
    pub fn new(requirements: Vec<Requirement>, size: usize, land_count: usize) -> Result<Self, DeckError> {
        if size == 0 || size > MAX_DECK_SIZE {
            return Err(DeckError::InvalidSize(format!(
                "{} cards, expected 1 to {}",
                size, MAX_DECK_SIZE
            )));
        }
        if land_count > size {
            return Err(DeckError::InvalidSize(format!(
                "{} lands do not fit in {} cards",
                land_count, size
            )));
        }
        if let Some(requirement) = requirements.iter().find(|r| r.turn == 0) {
            return Err(DeckError::InvalidRequirement(format!("{} has no turn", requirement.cost)));
        }
        Ok(Deck { requirements, size, land_count })
    }

    /// Deck using the recommended land count for its curve
    pub fn with_recommended_lands(requirements: Vec<Requirement>, size: usize) -> Result<Self, DeckError> {
        let land_count = recommended_land_count(&requirements, size);
        Self::new(requirements, size, land_count)
    }

    pub fn non_land_count(&self) -> usize {
        self.size - self.land_count
    }

    /// Colors demanded by any requirement, colorless included
    pub fn colors(&self) -> ColorSet {
        self.requirements
            .iter()
            .fold(ColorSet::EMPTY, |acc, r| acc.union(r.cost.colors()))
    }

    pub fn average_mana_value(&self) -> f64 {
        average_mana_value(&self.requirements)
    }
}

fn average_mana_value(requirements: &[Requirement]) -> f64 {
    if requirements.is_empty() {
        return 0.0;
    }
    let total: u32 = requirements.iter().map(|r| r.cost.total_value()).sum();
    total as f64 / requirements.len() as f64
}

/// Land count suggested by the average mana value, scaled to the deck size
pub fn recommended_land_count(requirements: &[Requirement], size: usize) -> usize {
    let per_sixty = 19.59 + 1.90 * average_mana_value(requirements);
    let scaled = (per_sixty * size as f64 / 60.0).round() as usize;
    scaled.min(size)
}

/// Parse a deck file
pub fn parse_deck_file(path: &str) -> Result<Deck, DeckError> {
    let content = std::fs::read_to_string(path)?;
    parse_deck(&content)
}

/// Parse deck text.
/// Format: "size N", "lands N", then "[COUNT] [TURN] COST" per line,
/// e.g. "4 T2 1U" or "2RRR". Supports comments with # or //
pub fn parse_deck(content: &str) -> Result<Deck, DeckError> {
    let mut size = None;
    let mut lands = None;
    let mut requirements = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line_no = line_num + 1;
        let without_comment = line.split('#').next().unwrap_or("");
        let trimmed = without_comment.split("//").next().unwrap_or("").trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        match tokens[0].to_ascii_lowercase().as_str() {
            "size" | "lands" => {
                if tokens.len() != 2 {
                    return Err(DeckError::InvalidFormat {
                        line: line_no,
                        reason: format!("Expected format: '{} COUNT'", tokens[0]),
                    });
                }
                let value: usize = tokens[1].parse().map_err(|_| DeckError::InvalidFormat {
                    line: line_no,
                    reason: format!("'{}' is not a valid number", tokens[1]),
                })?;
                if tokens[0].eq_ignore_ascii_case("size") {
                    size = Some(value);
                } else {
                    lands = Some(value);
                }
                continue;
            }
            _ => {}
        }

        let (count, notation) = if tokens.len() > 1 && tokens[0].chars().all(|c| c.is_ascii_digit()) {
            let count: usize = tokens[0].parse().map_err(|_| DeckError::InvalidFormat {
                line: line_no,
                reason: format!("'{}' is not a valid number", tokens[0]),
            })?;
            (count, tokens[1..].join(" "))
        } else {
            (1, tokens.join(" "))
        };

        let requirement: Requirement = notation.parse().map_err(|e: CostParseError| DeckError::InvalidFormat {
            line: line_no,
            reason: e.to_string(),
        })?;

        if requirements.len() + count > MAX_DECK_SIZE {
            return Err(DeckError::InvalidFormat {
                line: line_no,
                reason: format!("more than {} spells", MAX_DECK_SIZE),
            });
        }
        requirements.extend(std::iter::repeat(requirement).take(count));
    }

    let size = size.unwrap_or(DEFAULT_DECK_SIZE);
    match lands {
        Some(land_count) => Deck::new(requirements, size, land_count),
        None => Deck::with_recommended_lands(requirements, size),
    }
}
