//! Ranked candidate lines accumulated from multi-line analysis.

use crate::chess_move::CoordinateMove;
use crate::score::Score;

/// One ranked line of engine analysis: its head move and score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLine {
    /// 1-based MultiPV rank; rank 1 is the engine's preferred line.
    pub rank: u32,
    /// First move of the principal variation.
    pub mv: CoordinateMove,
    /// Score from the side to move's perspective.
    pub score: Score,
}

impl CandidateLine {
    pub fn new(rank: u32, mv: CoordinateMove, score: Score) -> CandidateLine {
        CandidateLine { rank, mv, score }
    }

    /// Position of the line on the ordered score scale.
    pub fn value(&self) -> i32 {
        self.score.value()
    }

    pub fn is_losing_mate(&self) -> bool {
        self.score.is_losing_mate()
    }

    /// How far this line trails `best`, in ordered-scale units (never negative).
    pub fn drop_from(&self, best: &CandidateLine) -> i32 {
        (best.value() - self.value()).max(0)
    }
}
