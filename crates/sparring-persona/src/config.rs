//! Named per-persona thresholds.
//!
//! All scores are centipawns on the ordered scale of
//! [`Score::value`](sparring_core::Score::value); material is in whole pawns.
//!
//! | Persona | Danger floor | Material deficit | Recovery | Depth  | Skill |
//! |---------|--------------|------------------|----------|--------|-------|
//! | Novice  | -200         | 3                | -80      | 3..=6  | 2     |
//! | Club    | -300         | 4                | -150     | 6..=10 | 10    |
//! | Master  | -450         | 5                | -450     | 12..=16| 20    |

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persona::Persona;

/// How a persona picks among lines when it is not in danger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum SelectionStyle {
    /// Uniform pick among lines trailing the best by `min_drop..=max_drop`.
    Blunder { min_drop: i32, max_drop: i32 },
    /// Mostly a tight band below the best, sometimes a wider one.
    Banded {
        primary_probability: f64,
        primary_max_drop: i32,
        wide_max_drop: i32,
        absolute_ceiling: i32,
    },
    /// The best line, rarely a near-equal alternative.
    Precise {
        substitute_probability: f64,
        max_drop: i32,
    },
}

/// Inclusive search-depth range for normal play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min: u8,
    pub max: u8,
}

/// Thresholds and engine settings for one persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Best score at or below this puts the persona in danger.
    pub danger_floor_cp: i32,
    /// Being this many pawns down (or more) puts the persona in danger.
    pub danger_material_deficit: i32,
    /// Rescue mode ends only once the best score is above this.
    pub recovery_cp: i32,
    pub selection: SelectionStyle,
    /// Engine `Skill Level` option (0..=20) for normal play.
    pub skill_level: u8,
    /// Number of candidate lines requested from the engine.
    pub multipv: u8,
    pub depth: DepthRange,
}

impl PersonaConfig {
    /// Built-in settings for `persona`.
    pub fn defaults(persona: Persona) -> Self {
        match persona {
            Persona::Novice => Self {
                danger_floor_cp: -200,
                danger_material_deficit: 3,
                recovery_cp: -80,
                selection: SelectionStyle::Blunder {
                    min_drop: 50,
                    max_drop: 250,
                },
                skill_level: 2,
                multipv: 5,
                depth: DepthRange { min: 3, max: 6 },
            },
            Persona::Club => Self {
                danger_floor_cp: -300,
                danger_material_deficit: 4,
                recovery_cp: -150,
                selection: SelectionStyle::Banded {
                    primary_probability: 0.8,
                    primary_max_drop: 60,
                    wide_max_drop: 180,
                    absolute_ceiling: 250,
                },
                skill_level: 10,
                multipv: 4,
                depth: DepthRange { min: 6, max: 10 },
            },
            Persona::Master => Self {
                danger_floor_cp: -450,
                danger_material_deficit: 5,
                recovery_cp: -450,
                selection: SelectionStyle::Precise {
                    substitute_probability: 0.1,
                    max_drop: 15,
                },
                skill_level: 20,
                multipv: 3,
                depth: DepthRange { min: 12, max: 16 },
            },
        }
    }

    /// Check the settings are internally consistent for `persona`.
    ///
    /// Novice and Club must keep their recovery threshold strictly above the
    /// danger floor; Master may exit rescue as soon as it leaves danger.
    pub fn validate(&self, persona: Persona) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { persona, reason };

        match persona {
            Persona::Novice | Persona::Club if self.recovery_cp <= self.danger_floor_cp => {
                return Err(invalid(format!(
                    "recovery threshold {} must be above danger floor {}",
                    self.recovery_cp, self.danger_floor_cp
                )));
            }
            Persona::Master if self.recovery_cp < self.danger_floor_cp => {
                return Err(invalid(format!(
                    "recovery threshold {} is below danger floor {}",
                    self.recovery_cp, self.danger_floor_cp
                )));
            }
            _ => {}
        }
        if self.danger_material_deficit <= 0 {
            return Err(invalid("material deficit must be positive".to_string()));
        }
        if self.depth.min == 0 || self.depth.min > self.depth.max {
            return Err(invalid(format!(
                "depth range {}..={} is empty or starts at zero",
                self.depth.min, self.depth.max
            )));
        }
        if self.multipv == 0 {
            return Err(invalid("multipv must be at least 1".to_string()));
        }
        if self.skill_level > crate::params::MAX_SKILL_LEVEL {
            return Err(invalid(format!("skill level {} above 20", self.skill_level)));
        }

        match self.selection {
            SelectionStyle::Blunder { min_drop, max_drop } => {
                if min_drop < 0 || min_drop > max_drop {
                    return Err(invalid(format!(
                        "blunder window {min_drop}..={max_drop} is empty"
                    )));
                }
            }
            SelectionStyle::Banded {
                primary_probability,
                primary_max_drop,
                wide_max_drop,
                absolute_ceiling,
            } => {
                if !(0.0..=1.0).contains(&primary_probability) {
                    return Err(invalid("primary probability outside 0..=1".to_string()));
                }
                if primary_max_drop < 0
                    || primary_max_drop > wide_max_drop
                    || primary_max_drop > absolute_ceiling
                {
                    return Err(invalid(format!(
                        "bands {primary_max_drop}/{wide_max_drop} inconsistent with ceiling {absolute_ceiling}"
                    )));
                }
            }
            SelectionStyle::Precise {
                substitute_probability,
                max_drop,
            } => {
                if !(0.0..=1.0).contains(&substitute_probability) {
                    return Err(invalid("substitute probability outside 0..=1".to_string()));
                }
                if max_drop < 0 {
                    return Err(invalid("substitute drop must not be negative".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Settings for all three personas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfigs {
    pub novice: PersonaConfig,
    pub club: PersonaConfig,
    pub master: PersonaConfig,
}

impl Default for PersonaConfigs {
    fn default() -> Self {
        Self {
            novice: PersonaConfig::defaults(Persona::Novice),
            club: PersonaConfig::defaults(Persona::Club),
            master: PersonaConfig::defaults(Persona::Master),
        }
    }
}

impl PersonaConfigs {
    pub fn get(&self, persona: Persona) -> &PersonaConfig {
        match persona {
            Persona::Novice => &self.novice,
            Persona::Club => &self.club,
            Persona::Master => &self.master,
        }
    }

    pub fn get_mut(&mut self, persona: Persona) -> &mut PersonaConfig {
        match persona {
            Persona::Novice => &mut self.novice,
            Persona::Club => &mut self.club,
            Persona::Master => &mut self.master,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Persona::ALL
            .iter()
            .try_for_each(|&persona| self.get(persona).validate(persona))
    }
}
