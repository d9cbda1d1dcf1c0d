//! The three opponent personas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A fixed opponent behaviour profile, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Plays plausible-looking inaccuracies on purpose.
    Novice,
    /// Solid, occasionally drifts into second-best positional choices.
    Club,
    /// Near-best play with a sliver of variety.
    Master,
}

impl Persona {
    /// All personas in strength order.
    pub const ALL: [Persona; 3] = [Persona::Novice, Persona::Club, Persona::Master];

    /// Dense index for per-persona tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Persona::Novice => "novice",
            Persona::Club => "club",
            Persona::Master => "master",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Persona {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "novice" | "easy" | "weak" => Ok(Persona::Novice),
            "club" | "medium" => Ok(Persona::Club),
            "master" | "hard" | "strong" => Ok(Persona::Master),
            _ => Err(ConfigError::UnknownPersona {
                name: s.to_string(),
            }),
        }
    }
}
