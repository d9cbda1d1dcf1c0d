//! Small random perturbation of centipawn scores.
//!
//! Engines at low depth tend to repeat the same choice from the same
//! position; nudging each stored score by a few centipawns breaks ties
//! differently between games. Mate scores are never touched.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use sparring_core::Score;

/// Default maximum perturbation in centipawns.
pub const DEFAULT_JITTER_CP: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Scores move by at most this many centipawns either way; 0 disables.
    pub amount_cp: i32,
    /// Fixed seed for reproducible games.
    pub seed: Option<u64>,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            amount_cp: DEFAULT_JITTER_CP,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Jitter {
    amount_cp: i32,
    rng: SmallRng,
}

impl Jitter {
    pub fn new(config: &JitterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            amount_cp: config.amount_cp.max(0),
            rng,
        }
    }

    /// A jitter that returns every score unchanged.
    pub fn disabled() -> Self {
        Self::new(&JitterConfig {
            amount_cp: 0,
            seed: Some(0),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.amount_cp > 0
    }

    pub fn apply(&mut self, score: Score) -> Score {
        match score {
            Score::Centipawns(_) if self.is_enabled() => {
                let delta = self.rng.gen_range(-self.amount_cp..=self.amount_cp);
                score.perturbed(delta)
            }
            other => other,
        }
    }
}
