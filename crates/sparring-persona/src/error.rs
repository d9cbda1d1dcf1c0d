//! Persona configuration errors.

use crate::persona::Persona;

/// Errors raised while parsing or validating persona settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A persona name did not match any known persona.
    #[error("unknown persona: {name}")]
    UnknownPersona {
        /// The name as given.
        name: String,
    },

    /// A threshold or range in a persona's settings is inconsistent.
    #[error("invalid {persona} settings: {reason}")]
    Invalid {
        /// The persona whose settings were rejected.
        persona: Persona,
        /// What is wrong with them.
        reason: String,
    },
}
