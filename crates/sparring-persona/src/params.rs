//! Engine strength and search-depth settings sent before each search.

use rand::Rng;

use crate::config::{DepthRange, PersonaConfig};
use crate::state::PersonaState;

/// Highest `Skill Level` the engine accepts.
pub const MAX_SKILL_LEVEL: u8 = 20;

/// Fixed depth searched whenever a persona is defending.
pub const RESCUE_DEPTH: u8 = 22;

/// Options for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    /// `Skill Level` option, `0..=MAX_SKILL_LEVEL`.
    pub skill_level: u8,
    /// Number of ranked lines to request.
    pub multipv: u8,
    /// Fixed search depth in plies.
    pub depth: u8,
}

impl EngineParams {
    /// Whether these are the maximal rescue settings.
    pub fn is_rescue(&self) -> bool {
        self.skill_level == MAX_SKILL_LEVEL && self.depth == RESCUE_DEPTH
    }
}

/// True when the previous decision left the persona defending.
fn defending(config: &PersonaConfig, state: &PersonaState) -> bool {
    state.rescue_active
        || state.last_mate_threat_against_me
        || state.last_best_score <= config.danger_floor_cp
}

/// Settings for the next search of a persona in `state`.
pub fn parameters_for<R: Rng + ?Sized>(
    config: &PersonaConfig,
    state: &PersonaState,
    rng: &mut R,
) -> EngineParams {
    if defending(config, state) {
        return EngineParams {
            skill_level: MAX_SKILL_LEVEL,
            multipv: config.multipv,
            depth: RESCUE_DEPTH,
        };
    }

    let DepthRange { min, max } = config.depth;
    let depth = if min >= max { min } else { rng.gen_range(min..=max) };
    EngineParams {
        skill_level: config.skill_level.min(MAX_SKILL_LEVEL),
        multipv: config.multipv,
        depth,
    }
}
