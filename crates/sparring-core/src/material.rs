//! Material balance in whole-pawn units.

use cozy_chess::{Board, Color, Piece};

/// Piece values in pawns, indexed by [`Piece`] order.
///
/// | Piece  | Value |
/// |--------|-------|
/// | Pawn   | 1     |
/// | Knight | 3     |
/// | Bishop | 3     |
/// | Rook   | 5     |
/// | Queen  | 9     |
/// | King   | 0     |
pub const PIECE_VALUES: [i32; Piece::NUM] = [1, 3, 3, 5, 9, 0];

/// Material balance from `perspective`'s point of view.
///
/// Positive when `perspective` has more material.
pub fn material_balance(board: &Board, perspective: Color) -> i32 {
    let mut balance = 0;
    for &piece in &Piece::ALL {
        let value = PIECE_VALUES[piece as usize];
        let ours = board.colored_pieces(perspective, piece).len() as i32;
        let theirs = board.colored_pieces(!perspective, piece).len() as i32;
        balance += value * (ours - theirs);
    }
    balance
}
