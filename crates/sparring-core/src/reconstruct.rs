//! Rebuild game state from the move log instead of trusting cached positions.
//!
//! The log is replayed from its starting FEN. A record that no longer parses or
//! is illegal is skipped with a warning rather than aborting the replay, so a
//! single bad entry never costs the whole game.

use tracing::warn;

use crate::chess_move::CoordinateMove;
use crate::error::ReconstructError;
use crate::history::MoveHistoryLog;
use crate::position::Position;

/// Result of applying an engine move.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    /// Position after the move.
    pub position: Position,
    /// SAN of the applied move.
    pub san: String,
    /// True when the move was only legal against the searched FEN, meaning the
    /// log had diverged from what the engine was shown.
    pub rebased: bool,
}

/// Replay `history` from its starting position.
pub fn rebuild(history: &MoveHistoryLog) -> Position {
    let mut position = match history.start_fen() {
        None => Position::startpos(),
        Some(fen) => match Position::from_fen(fen) {
            Ok(pos) => pos,
            Err(err) => {
                warn!(error = %err, "start FEN rejected, replaying from the standard position");
                Position::startpos()
            }
        },
    };

    for (ply, record) in history.records().iter().enumerate() {
        if let Err(err) = position.play_notation(&record.notation) {
            warn!(ply, notation = %record.notation, error = %err, "skipping unreplayable history record");
        }
    }
    position
}

/// Apply an engine-chosen move.
///
/// The move is tried against `reconstructed` first. If it is illegal there, one
/// fallback attempt is made against a position built straight from
/// `search_fen`, the FEN the engine actually searched.
pub fn apply_returned_move(
    reconstructed: &Position,
    mv: &CoordinateMove,
    search_fen: &str,
) -> Result<AppliedMove, ReconstructError> {
    let mut position = reconstructed.clone();
    if let Ok(san) = position.play(mv) {
        return Ok(AppliedMove {
            position,
            san,
            rebased: false,
        });
    }

    warn!(mv = %mv, fen = %reconstructed.fen(), "engine move illegal in reconstructed position, retrying from search FEN");
    let invalid = || ReconstructError::InvalidMove {
        mv: mv.to_string(),
        search_fen: search_fen.to_string(),
    };
    let mut position = Position::from_fen(search_fen).map_err(|_| invalid())?;
    let san = position.play(mv).map_err(|_| invalid())?;
    Ok(AppliedMove {
        position,
        san,
        rebased: true,
    })
}
