//! Coordinate-notation moves as exchanged with the engine.

use std::fmt;
use std::str::FromStr;

use cozy_chess::{Piece, Square};

use crate::error::PositionError;

/// A move written as origin square, destination square and optional promotion.
///
/// Castling uses the king's two-square step (`e1g1`), as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateMove {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece, if any.
    pub promotion: Option<Piece>,
}

impl CoordinateMove {
    /// Create a non-promoting move.
    pub const fn new(from: Square, to: Square) -> CoordinateMove {
        CoordinateMove {
            from,
            to,
            promotion: None,
        }
    }

    /// Parse coordinate text such as `e2e4` or `a7a8q`.
    ///
    /// Returns `None` for anything else, including the null move `0000`.
    pub fn parse(text: &str) -> Option<CoordinateMove> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from: Square = text[0..2].parse().ok()?;
        let to: Square = text[2..4].parse().ok()?;
        if from == to {
            return None;
        }
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(promotion_piece(c)?),
        };
        Some(CoordinateMove {
            from,
            to,
            promotion,
        })
    }
}

/// Map a UCI promotion character to the piece it names.
fn promotion_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        _ => None,
    }
}

/// Lower-case UCI character for a promotion piece.
pub(crate) fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

impl FromStr for CoordinateMove {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoordinateMove::parse(s).ok_or_else(|| PositionError::UnparsableMove {
            notation: s.to_string(),
        })
    }
}

impl fmt::Display for CoordinateMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", promotion_char(piece))?;
        }
        Ok(())
    }
}
