//! Engine scores mapped onto one ordered integer scale.

use std::cmp::Ordering;
use std::fmt;

/// Magnitude assigned to a mate on the ordered scale.
pub const MATE_VALUE: i32 = 1_000_000;

/// Centipawn scores are clamped into `-MAX_CENTIPAWNS..=MAX_CENTIPAWNS` so that
/// they can never collide with the mate band.
pub const MAX_CENTIPAWNS: i32 = 900_000;

/// Mate distances are clamped to this many moves before mapping, keeping
/// every mate inside its band above `MAX_CENTIPAWNS`.
pub const MAX_MATE_DISTANCE: i32 = 10_000;

/// A score reported by the engine, always from the side to move's perspective.
///
/// `Mate(n)` with `n > 0` means the side to move mates in `n`; `n < 0` means
/// it gets mated in `-n`. `Mate(0)` is reported for an already-mated side and
/// is treated as the worst possible loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    /// Advantage in hundredths of a pawn.
    Centipawns(i32),
    /// Forced mate distance in moves.
    Mate(i32),
}

impl Score {
    /// Map the score onto the ordered scale used for all comparisons.
    ///
    /// | Score          | Value                   |
    /// |----------------|-------------------------|
    /// | `Mate(n > 0)`  | `MATE_VALUE - n`        |
    /// | `Centipawns`   | clamped to `±MAX_CENTIPAWNS` |
    /// | `Mate(n <= 0)` | `-MATE_VALUE - n`       |
    ///
    /// `n` is clamped to `MAX_MATE_DISTANCE` moves either way.
    pub const fn value(self) -> i32 {
        match self {
            Score::Centipawns(cp) => {
                if cp > MAX_CENTIPAWNS {
                    MAX_CENTIPAWNS
                } else if cp < -MAX_CENTIPAWNS {
                    -MAX_CENTIPAWNS
                } else {
                    cp
                }
            }
            Score::Mate(n) if n > MAX_MATE_DISTANCE => MATE_VALUE - MAX_MATE_DISTANCE,
            Score::Mate(n) if n > 0 => MATE_VALUE - n,
            Score::Mate(n) if n < -MAX_MATE_DISTANCE => -MATE_VALUE + MAX_MATE_DISTANCE,
            Score::Mate(n) => -MATE_VALUE - n,
        }
    }

    /// True for a forced mate against the side to move.
    pub const fn is_losing_mate(self) -> bool {
        matches!(self, Score::Mate(n) if n <= 0)
    }

    /// True for a forced mate in favour of the side to move.
    pub const fn is_winning_mate(self) -> bool {
        matches!(self, Score::Mate(n) if n > 0)
    }

    /// Add `delta` centipawns; mate scores are returned unchanged.
    pub const fn perturbed(self, delta: i32) -> Score {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(cp.saturating_add(delta)),
            mate => mate,
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Score::Mate(n) if *n > 0 => write!(f, "+M{n}"),
            Score::Mate(n) => write!(f, "-M{}", n.unsigned_abs()),
        }
    }
}
