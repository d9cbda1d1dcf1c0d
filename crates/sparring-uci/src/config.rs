//! Session settings, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "engines": [{ "name": "sf", "path": "/opt/sf/stockfish" }],
//!   "jitter": { "amount_cp": 0 } }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sparring_persona::{JitterConfig, PersonaConfigs};

use crate::error::SessionError;
use crate::transport::EngineCandidate;

/// Default depth for evaluation-display searches.
pub const DEFAULT_ANALYSIS_DEPTH: u8 = 18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fallback chain, tried in order.
    pub engines: Vec<EngineCandidate>,
    pub handshake_timeout_ms: u64,
    pub jitter: JitterConfig,
    pub personas: PersonaConfigs,
    pub analysis_depth: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engines: ["stockfish", "/usr/games/stockfish", "/usr/local/bin/stockfish"]
                .into_iter()
                .map(EngineCandidate::from_path)
                .collect(),
            handshake_timeout_ms: 5_000,
            jitter: JitterConfig::default(),
            personas: PersonaConfigs::default(),
            analysis_depth: DEFAULT_ANALYSIS_DEPTH,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Reject an empty engine chain and inconsistent persona thresholds.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.engines.is_empty() {
            return Err(SessionError::NoEngines);
        }
        self.personas.validate()?;
        Ok(())
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}
