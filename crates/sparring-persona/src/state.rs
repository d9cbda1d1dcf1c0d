//! Per-persona hysteresis state.

use crate::persona::Persona;
use crate::policy::Decision;

/// What a decision asks of the rescue flag once its move has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescueTransition {
    Enter,
    Exit,
    Stay,
}

/// Hysteresis state for one persona, recreated at each new game.
///
/// `rescue_active` is only ever changed through [`PersonaState::apply`], so it
/// can only flip on in danger and only flip off after recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersonaState {
    pub rescue_active: bool,
    pub last_best_score: i32,
    pub last_mate_threat_against_me: bool,
}

impl PersonaState {
    /// Record the outcome of a decision whose move was applied.
    pub fn apply(&mut self, decision: &Decision) {
        match decision.transition {
            RescueTransition::Enter => self.rescue_active = true,
            RescueTransition::Exit => self.rescue_active = false,
            RescueTransition::Stay => {}
        }
        self.last_best_score = decision.best_score;
        self.last_mate_threat_against_me = decision.mate_threat;
    }
}

/// One [`PersonaState`] per persona.
#[derive(Debug, Clone, Default)]
pub struct PersonaTable {
    states: [PersonaState; 3],
}

impl PersonaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, persona: Persona) -> &PersonaState {
        &self.states[persona.index()]
    }

    pub fn get_mut(&mut self, persona: Persona) -> &mut PersonaState {
        &mut self.states[persona.index()]
    }

    /// Fresh state for every persona.
    pub fn reset(&mut self) {
        self.states = Default::default();
    }
}
