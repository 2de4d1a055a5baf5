use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Mana colors in Magic: The Gathering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManaColor {
    #[serde(rename = "W")]
    White,
    #[serde(rename = "U")]
    Blue,
    #[serde(rename = "B")]
    Black,
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "G")]
    Green,
    #[serde(rename = "C")]
    Colorless,
}

impl ManaColor {
    /// Canonical WUBRGC order
    pub const ALL: [ManaColor; 6] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
        ManaColor::Colorless,
    ];

    /// The five colors an "any color" land can make
    pub const WUBRG: [ManaColor; 5] = [
        ManaColor::White,
        ManaColor::Blue,
        ManaColor::Black,
        ManaColor::Red,
        ManaColor::Green,
    ];

    /// Convert to the single character representation
    pub fn to_char(&self) -> char {
        match self {
            ManaColor::White => 'W',
            ManaColor::Blue => 'U',
            ManaColor::Black => 'B',
            ManaColor::Red => 'R',
            ManaColor::Green => 'G',
            ManaColor::Colorless => 'C',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(ManaColor::White),
            'U' => Some(ManaColor::Blue),
            'B' => Some(ManaColor::Black),
            'R' => Some(ManaColor::Red),
            'G' => Some(ManaColor::Green),
            'C' => Some(ManaColor::Colorless),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ManaColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Set of mana colors, stored as a bit per color in WUBRGC order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const EMPTY: ColorSet = ColorSet(0);

    pub fn contains(&self, color: ManaColor) -> bool {
        self.0 & color.bit() != 0
    }

    pub fn insert(&mut self, color: ManaColor) {
        self.0 |= color.bit();
    }

    pub fn with(mut self, color: ManaColor) -> Self {
        self.insert(color);
        self
    }

    pub fn intersects(&self, other: ColorSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(&self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 & other.0)
    }

    pub fn union(&self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Raw bits, used for the documented category ordering
    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ManaColor> + '_ {
        ManaColor::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<ManaColor> for ColorSet {
    fn from_iter<I: IntoIterator<Item = ManaColor>>(iter: I) -> Self {
        let mut set = ColorSet::EMPTY;
        for color in iter {
            set.insert(color);
        }
        set
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in self.iter() {
            write!(f, "{}", color)?;
        }
        Ok(())
    }
}

impl Serialize for ColorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Mana cost for a card: generic amount plus pips per color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManaCost {
    #[serde(default)]
    pub white: u32,
    #[serde(default)]
    pub blue: u32,
    #[serde(default)]
    pub black: u32,
    #[serde(default)]
    pub red: u32,
    #[serde(default)]
    pub green: u32,
    #[serde(default)]
    pub colorless: u32,
    #[serde(default)]
    pub generic: u32,
}

impl ManaCost {
    pub fn total_value(&self) -> u32 {
        self.white + self.blue + self.black + self.red + self.green + self.colorless + self.generic
    }

    pub fn pips(&self, color: ManaColor) -> u32 {
        match color {
            ManaColor::White => self.white,
            ManaColor::Blue => self.blue,
            ManaColor::Black => self.black,
            ManaColor::Red => self.red,
            ManaColor::Green => self.green,
            ManaColor::Colorless => self.colorless,
        }
    }

    pub fn add_pip(&mut self, color: ManaColor) {
        match color {
            ManaColor::White => self.white += 1,
            ManaColor::Blue => self.blue += 1,
            ManaColor::Black => self.black += 1,
            ManaColor::Red => self.red += 1,
            ManaColor::Green => self.green += 1,
            ManaColor::Colorless => self.colorless += 1,
        }
    }

    /// Total pips that need a specific color (or colorless) source
    pub fn colored_pips(&self) -> u32 {
        self.total_value() - self.generic
    }

    /// Colors this cost demands, with their pip counts, in WUBRGC order
    pub fn color_demands(&self) -> Vec<(ManaColor, u32)> {
        ManaColor::ALL
            .into_iter()
            .map(|c| (c, self.pips(c)))
            .filter(|(_, pips)| *pips > 0)
            .collect()
    }

    pub fn colors(&self) -> ColorSet {
        self.color_demands().into_iter().map(|(c, _)| c).collect()
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 || self.colored_pips() == 0 {
            write!(f, "{}", self.generic)?;
        }
        for (color, pips) in self.color_demands() {
            for _ in 0..pips {
                write!(f, "{}", color)?;
            }
        }
        Ok(())
    }
}

/// A spell's mana cost and the turn by which it must be castable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Requirement {
    pub cost: ManaCost,
    pub turn: u32,
}

impl Requirement {
    pub fn new(cost: ManaCost, turn: u32) -> Result<Self, crate::solver::SolveError> {
        let requirement = Requirement { cost, turn };
        requirement.validate()?;
        Ok(requirement)
    }

    pub fn validate(&self) -> Result<(), crate::solver::SolveError> {
        if self.turn < 1 {
            return Err(crate::solver::SolveError::InvalidRequirement {
                requirement: self.to_string(),
                reason: "turn must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} {}", self.turn, self.cost)
    }
}

/// Land cycles from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandSubtype {
    Basic,
    Check,
    Snarl,
    Filter,
    Bicycle,
    Creature,
    Restless,
    Tapland,
    Pain,
    Tango,
    Utility,
}

/// What has to be true for a conditional land to enter untapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// You control a land with a matching basic land type
    ControlsBasicType,
    /// You reveal a land with a matching basic land type from hand
    RevealsBasicType,
    /// You control two or more basic lands
    ControlsTwoBasics,
    /// Colored mana needs another land of its colors to filter through
    FilterEnabler,
}

/// How a land enters the battlefield
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entry {
    #[default]
    Untapped,
    Conditional(Condition),
    Tapped,
}

impl Entry {
    /// Rank used by the category ordering: untapped, conditional, tapped
    pub fn rank(&self) -> u8 {
        match self {
            Entry::Untapped => 0,
            Entry::Conditional(_) => 1,
            Entry::Tapped => 2,
        }
    }
}

/// Land card as described by the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandCard {
    pub name: String,
    pub subtype: LandSubtype,
    #[serde(default)]
    pub produces: Vec<ManaColor>,
    #[serde(default)]
    pub any_color: bool,
    #[serde(default)]
    pub entry: Entry,
    #[serde(default)]
    pub basic_types: Vec<ManaColor>,
    #[serde(default)]
    pub painful: bool,
    /// Copy limit; `None` means 4, or unlimited for basics
    #[serde(default)]
    pub max: Option<usize>,
}

impl LandCard {
    pub fn is_basic(&self) -> bool {
        self.subtype == LandSubtype::Basic
    }

    pub fn produced_colors(&self) -> ColorSet {
        let produced: ColorSet = self.produces.iter().copied().collect();
        if self.any_color {
            produced.union(ManaColor::WUBRG.into_iter().collect())
        } else {
            produced
        }
    }

    pub fn basic_land_types(&self) -> ColorSet {
        self.basic_types.iter().copied().collect()
    }

    /// Copy limit given the deck's land budget
    pub fn copy_limit(&self, land_count: usize) -> usize {
        match self.max {
            Some(max) => max,
            None if self.is_basic() => land_count,
            None => 4,
        }
    }
}
