//! PGN export of a move-history log.

use std::fmt::Write;

use cozy_chess::Color;
use tracing::warn;

use crate::history::MoveHistoryLog;
use crate::position::{GameState, Position};

/// Player names and event tag for the exported record.
#[derive(Debug, Clone)]
pub struct PgnHeaders {
    pub event: String,
    pub white: String,
    pub black: String,
}

impl Default for PgnHeaders {
    fn default() -> Self {
        Self {
            event: "Sparring game".to_string(),
            white: "?".to_string(),
            black: "?".to_string(),
        }
    }
}

/// PGN result token for the final position of `history`.
pub fn result_token(history: &MoveHistoryLog, final_position: &Position) -> &'static str {
    match final_position.state() {
        GameState::Checkmate => match final_position.side_to_move() {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        GameState::Stalemate | GameState::FiftyMoves => "1/2-1/2",
        GameState::Ongoing if history.is_threefold() => "1/2-1/2",
        GameState::Ongoing => "*",
    }
}

/// Render `history` as a PGN game with SAN movetext.
///
/// Records that cannot be replayed are left out, matching
/// [`rebuild`](crate::reconstruct::rebuild).
pub fn export(history: &MoveHistoryLog, headers: &PgnHeaders) -> String {
    let mut position = match history.start_fen().map(Position::from_fen) {
        Some(Ok(pos)) => pos,
        _ => Position::startpos(),
    };

    let mut movetext = String::new();
    let mut first = true;
    for record in history.records() {
        let number = position.fullmove_number();
        let white_to_move = position.side_to_move() == Color::White;
        let san = match position.play_notation(&record.notation) {
            Ok((_, san)) => san,
            Err(err) => {
                warn!(notation = %record.notation, error = %err, "record left out of PGN");
                continue;
            }
        };
        if !first {
            movetext.push(' ');
        }
        if white_to_move {
            let _ = write!(movetext, "{number}. ");
        } else if first {
            let _ = write!(movetext, "{number}... ");
        }
        movetext.push_str(&san);
        first = false;
    }

    let result = result_token(history, &position);
    let mut out = String::new();
    let _ = writeln!(out, "[Event \"{}\"]", headers.event);
    let _ = writeln!(out, "[Site \"?\"]");
    let _ = writeln!(out, "[Date \"????.??.??\"]");
    let _ = writeln!(out, "[Round \"-\"]");
    let _ = writeln!(out, "[White \"{}\"]", headers.white);
    let _ = writeln!(out, "[Black \"{}\"]", headers.black);
    let _ = writeln!(out, "[Result \"{result}\"]");
    if let Some(fen) = history.start_fen() {
        let _ = writeln!(out, "[SetUp \"1\"]");
        let _ = writeln!(out, "[FEN \"{fen}\"]");
    }
    out.push('\n');
    if movetext.is_empty() {
        out.push_str(result);
    } else {
        let _ = write!(out, "{movetext} {result}");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::{PgnHeaders, export};
    use crate::history::MoveHistoryLog;
    use crate::position::Position;

    fn played(start: Option<&str>, moves: &[&str]) -> MoveHistoryLog {
        let (mut pos, mut log) = match start {
            Some(fen) => (Position::from_fen(fen).unwrap(), MoveHistoryLog::from_fen(fen)),
            None => (Position::startpos(), MoveHistoryLog::new()),
        };
        for mv in moves {
            pos.play_notation(mv).unwrap();
            log.push(*mv, pos.fen());
        }
        log
    }

    #[test]
    fn exports_numbered_movetext() {
        let log = played(None, &["e2e4", "e7e5", "g1f3"]);
        let pgn = export(&log, &PgnHeaders::default());
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.ends_with("1. e4 e5 2. Nf3 *\n"));
        assert!(!pgn.contains("[SetUp"));
    }

    #[test]
    fn black_to_move_start_uses_ellipsis() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let log = played(Some(fen), &["e5", "Nf3"]);
        let pgn = export(&log, &PgnHeaders::default());
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.ends_with("1... e5 2. Nf3 *\n"));
    }

    #[test]
    fn checkmate_sets_result() {
        let log = played(None, &["f3", "e5", "g4", "Qh4#"]);
        let pgn = export(&log, &PgnHeaders::default());
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1\n"));
    }
}
