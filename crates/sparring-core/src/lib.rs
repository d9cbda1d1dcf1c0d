//! Game-state primitives for sparring: scores, candidate lines, the
//! legality-oracle wrapper, the move-history log and position reconstruction.

mod candidate;
mod chess_move;
mod error;
mod history;
mod material;
mod position;
mod san;
mod score;

pub mod pgn;
pub mod reconstruct;

pub use candidate::CandidateLine;
pub use chess_move::CoordinateMove;
pub use error::{PositionError, ReconstructError};
pub use history::{MoveHistoryLog, MoveRecord};
pub use material::{PIECE_VALUES, material_balance};
pub use position::{GameState, Position, STARTING_FEN};
pub use score::{MATE_VALUE, MAX_CENTIPAWNS, MAX_MATE_DISTANCE, Score};

pub use cozy_chess::{Color, Piece, Square};
