//! Standard algebraic notation for backend moves.

use cozy_chess::{GameStatus, Move, Piece};

use crate::position::Position;

fn piece_letter(piece: Piece) -> Option<char> {
    match piece {
        Piece::Knight => Some('N'),
        Piece::Bishop => Some('B'),
        Piece::Rook => Some('R'),
        Piece::Queen => Some('Q'),
        Piece::King => Some('K'),
        Piece::Pawn => None,
    }
}

/// Render a legal backend move as SAN, including the check or mate suffix.
pub(crate) fn format(pos: &Position, mv: Move) -> String {
    let board = pos.board();
    let Some(moving) = board.piece_on(mv.from) else {
        return mv.to_string();
    };

    let mut text = String::new();
    if pos.is_castle(mv) {
        let kingside = (mv.to.file() as u8) > (mv.from.file() as u8);
        text.push_str(if kingside { "O-O" } else { "O-O-O" });
    } else {
        let capture = board.color_on(mv.to) == Some(!board.side_to_move())
            || (moving == Piece::Pawn && mv.from.file() != mv.to.file());

        match piece_letter(moving) {
            Some(letter) => {
                text.push(letter);
                text.push_str(&disambiguation(pos, mv, moving));
            }
            None if capture => text.push_str(&file_char(mv.from)),
            None => {}
        }
        if capture {
            text.push('x');
        }
        text.push_str(&mv.to.to_string());
        if let Some(promo) = mv.promotion.and_then(piece_letter) {
            text.push('=');
            text.push(promo);
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        text.push('#');
    } else if !after.checkers().is_empty() {
        text.push('+');
    }
    text
}

fn file_char(sq: cozy_chess::Square) -> String {
    sq.to_string()[..1].to_string()
}

fn rank_char(sq: cozy_chess::Square) -> String {
    sq.to_string()[1..].to_string()
}

/// Origin file and/or rank needed to tell `mv` apart from same-piece rivals.
fn disambiguation(pos: &Position, mv: Move, moving: Piece) -> String {
    if moving == Piece::King {
        return String::new();
    }
    let rivals: Vec<Move> = pos
        .backend_moves()
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && pos.board().piece_on(other.from) == Some(moving)
        })
        .collect();
    if rivals.is_empty() {
        return String::new();
    }
    let shares_file = rivals.iter().any(|o| o.from.file() == mv.from.file());
    let shares_rank = rivals.iter().any(|o| o.from.rank() == mv.from.rank());
    match (shares_file, shares_rank) {
        (false, _) => file_char(mv.from),
        (true, false) => rank_char(mv.from),
        (true, true) => mv.from.to_string(),
    }
}

/// Canonical comparison form: annotations and check marks removed,
/// zero-castling spelled with letters.
pub(crate) fn normalize(text: &str) -> Option<String> {
    let core = text
        .trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
        .replace('=', "");
    if core.is_empty() || !core.is_ascii() {
        return None;
    }
    Some(core)
}
