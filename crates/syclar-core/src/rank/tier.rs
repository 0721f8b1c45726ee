//! Prestige tiers ("classes") of the hero rank.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One of the seven ordered prestige bands, lowest (`F`) to highest (`S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    F,
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Tier {
    /// All tiers in ascending prestige.
    pub const ALL: [Tier; 7] = [
        Tier::F,
        Tier::E,
        Tier::D,
        Tier::C,
        Tier::B,
        Tier::A,
        Tier::S,
    ];

    pub const LOWEST: Tier = Tier::F;
    pub const HIGHEST: Tier = Tier::S;

    /// Position in the prestige order (0 for `F`, 6 for `S`).
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Tier> {
        Self::ALL.get(index).copied()
    }

    /// The tier directly above, if any.
    pub fn next(self) -> Option<Tier> {
        Self::from_index(self.index() + 1)
    }

    /// The tier directly below, if any.
    pub fn prev(self) -> Option<Tier> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::F => "F",
            Tier::E => "E",
            Tier::D => "D",
            Tier::C => "C",
            Tier::B => "B",
            Tier::A => "A",
            Tier::S => "S",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "class".into(),
                message: format!("unknown tier '{s}' (expected one of F, E, D, C, B, A, S)"),
            })
    }
}
