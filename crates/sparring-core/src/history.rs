//! The append-only move log that is the authoritative record of a game.

use crate::position::{STARTING_FEN, repetition_key};

/// One played move and the FEN it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Move text in SAN or coordinate notation.
    pub notation: String,
    /// FEN of the position right after the move was applied.
    pub fen_after: String,
}

/// Ordered record of every move since the game's starting position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistoryLog {
    start_fen: Option<String>,
    records: Vec<MoveRecord>,
}

impl MoveHistoryLog {
    /// Empty log starting from the standard position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty log starting from `fen`.
    pub fn from_fen(fen: impl Into<String>) -> Self {
        Self {
            start_fen: Some(fen.into()),
            records: Vec::new(),
        }
    }

    /// Starting FEN, `None` meaning the standard position.
    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a played move.
    pub fn push(&mut self, notation: impl Into<String>, fen_after: impl Into<String>) {
        self.records.push(MoveRecord {
            notation: notation.into(),
            fen_after: fen_after.into(),
        });
    }

    /// Forget every move and restart from `start_fen`.
    pub fn clear(&mut self, start_fen: Option<String>) {
        self.start_fen = start_fen;
        self.records.clear();
    }

    /// FEN recorded after the last move, or the start position if none.
    pub fn last_fen(&self) -> &str {
        self.records
            .last()
            .map(|r| r.fen_after.as_str())
            .or(self.start_fen.as_deref())
            .unwrap_or(STARTING_FEN)
    }

    /// True when the current position has occurred at least three times.
    pub fn is_threefold(&self) -> bool {
        let current = repetition_key(self.last_fen());
        let start = repetition_key(self.start_fen.as_deref().unwrap_or(STARTING_FEN));
        let mut seen = usize::from(start == current);
        seen += self
            .records
            .iter()
            .filter(|r| repetition_key(&r.fen_after) == current)
            .count();
        seen >= 3
    }
}
