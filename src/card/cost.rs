//! Mana-cost notation: "2RR", "{2}{R}{R}", "T4 1UU".

use crate::card::types::{ManaColor, ManaCost, Requirement};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CostParseError {
    #[error("Empty mana cost")]
    Empty,
    #[error("Unknown mana symbol '{symbol}' in '{notation}'")]
    UnknownSymbol { symbol: char, notation: String },
    #[error("Generic cost too large in '{0}'")]
    GenericOverflow(String),
    #[error("Invalid turn '{0}'")]
    InvalidTurn(String),
}

/// Parse a mana cost such as "2RR", "RRB", "C" or "{1}{W}{U}"
pub fn parse_mana_cost(notation: &str) -> Result<ManaCost, CostParseError> {
    let trimmed = notation.trim();
    if trimmed.is_empty() {
        return Err(CostParseError::Empty);
    }

    let mut cost = ManaCost::default();
    let mut generic: Option<u32> = None;

    for c in trimmed.chars() {
        match c {
            '{' | '}' => continue,
            '0'..='9' => {
                let digit = c.to_digit(10).unwrap_or(0);
                let value = generic
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| CostParseError::GenericOverflow(trimmed.to_string()))?;
                generic = Some(value);
            }
            _ => match ManaColor::from_char(c) {
                Some(color) => cost.add_pip(color),
                None => {
                    return Err(CostParseError::UnknownSymbol {
                        symbol: c,
                        notation: trimmed.to_string(),
                    })
                }
            },
        }
    }

    cost.generic = generic.unwrap_or(0);
    Ok(cost)
}

/// Parse a cost and attach the turn it must be cast by.
/// Without an explicit turn the requirement is "on curve": its mana value, at least 1.
pub fn parse_requirement(notation: &str, turn: Option<u32>) -> Result<Requirement, CostParseError> {
    let cost = parse_mana_cost(notation)?;
    let turn = match turn {
        Some(0) => return Err(CostParseError::InvalidTurn("0".to_string())),
        Some(turn) => turn,
        None => cost.total_value().max(1),
    };
    Ok(Requirement { cost, turn })
}

fn parse_turn_token(token: &str) -> Option<Result<u32, CostParseError>> {
    let digits = token.strip_prefix('T').or_else(|| token.strip_prefix('t'))?;
    Some(
        digits
            .parse::<u32>()
            .ok()
            .filter(|turn| *turn > 0)
            .ok_or_else(|| CostParseError::InvalidTurn(token.to_string())),
    )
}

impl FromStr for Requirement {
    type Err = CostParseError;

    /// Accepts "1U", "T2 1U" and "1U T2"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut turn = None;
        let mut cost = None;
        for token in s.split_whitespace() {
            match parse_turn_token(token) {
                Some(parsed) => turn = Some(parsed?),
                None => {
                    if cost.is_some() {
                        return Err(CostParseError::UnknownSymbol {
                            symbol: ' ',
                            notation: s.trim().to_string(),
                        });
                    }
                    cost = Some(token);
                }
            }
        }
        let cost = cost.ok_or(CostParseError::Empty)?;
        parse_requirement(cost, turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generic_and_colors() {
        let cost = parse_mana_cost("2RR").expect("valid cost");
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.red, 2);
        assert_eq!(cost.colored_pips(), 2);
    }

    #[test]
    fn test_parse_braces_and_multi_digit() {
        let cost = parse_mana_cost("{10}{U}{B}").expect("valid cost");
        assert_eq!(cost.generic, 10);
        assert_eq!(cost.blue, 1);
        assert_eq!(cost.black, 1);
    }

    #[test]
    fn test_parse_colorless_pip() {
        let cost = parse_mana_cost("CCWWUU").expect("valid cost");
        assert_eq!(cost.colorless, 2);
        assert_eq!(cost.white, 2);
        assert_eq!(cost.blue, 2);
        assert_eq!(cost.generic, 0);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_mana_cost("  "), Err(CostParseError::Empty));
        assert!(matches!(
            parse_mana_cost("2X"),
            Err(CostParseError::UnknownSymbol { symbol: 'X', .. })
        ));
        assert!(matches!(
            parse_mana_cost("99999999999"),
            Err(CostParseError::GenericOverflow(_))
        ));
    }

    #[test]
    fn test_turn_defaults_to_mana_value() {
        assert_eq!(parse_requirement("2RRR", None).expect("valid").turn, 5);
        assert_eq!(parse_requirement("U", None).expect("valid").turn, 1);
        assert_eq!(parse_requirement("0", None).expect("valid").turn, 1);
        assert_eq!(parse_requirement("2RRR", Some(6)).expect("valid").turn, 6);
        assert!(parse_requirement("U", Some(0)).is_err());
    }

    #[test]
    fn test_requirement_from_str_round_trips_display() {
        let req: Requirement = "T2 1U".parse().expect("valid requirement");
        assert_eq!(req.turn, 2);
        assert_eq!(req.cost.blue, 1);
        assert_eq!(req.to_string(), "T2 1U");

        let trailing: Requirement = "1U t3".parse().expect("valid requirement");
        assert_eq!(trailing.turn, 3);

        assert!("T0 U".parse::<Requirement>().is_err());
        assert!("1U 2R".parse::<Requirement>().is_err());
    }
}
