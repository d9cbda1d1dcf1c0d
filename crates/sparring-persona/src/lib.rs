//! Opponent personas: move selection over ranked engine lines, rescue-mode
//! hysteresis and the engine parameters each persona searches with.

mod error;

pub mod config;
pub mod jitter;
pub mod params;
pub mod persona;
pub mod policy;
pub mod state;

pub use config::{DepthRange, PersonaConfig, PersonaConfigs, SelectionStyle};
pub use error::ConfigError;
pub use jitter::{Jitter, JitterConfig};
pub use params::{EngineParams, MAX_SKILL_LEVEL, RESCUE_DEPTH, parameters_for};
pub use persona::Persona;
pub use policy::{Decision, decide, in_danger};
pub use state::{PersonaState, PersonaTable, RescueTransition};
