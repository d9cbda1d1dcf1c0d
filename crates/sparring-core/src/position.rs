//! Thin wrapper over the `cozy-chess` rules backend.
//!
//! Everything chess-rule related (legality, check, mate, FEN) is delegated to
//! `cozy_chess::Board`. This module only translates between the backend's
//! move encoding and the coordinate/SAN notation used everywhere else.

use cozy_chess::{Board, Color, File, GameStatus, Move, Piece, Square};

use crate::chess_move::CoordinateMove;
use crate::error::PositionError;
use crate::material::material_balance;
use crate::san;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Outcome of a position as far as the board alone can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// The side to move has at least one legal move and no draw rule applies.
    Ongoing,
    /// The side to move is checkmated.
    Checkmate,
    /// The side to move has no legal move but is not in check.
    Stalemate,
    /// Drawn by the fifty-move rule.
    FiftyMoves,
}

impl GameState {
    pub fn is_over(self) -> bool {
        !matches!(self, GameState::Ongoing)
    }
}

/// A legal chess position.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self {
            board: Board::default(),
        }
    }

    /// Parse a standard (non-Shredder) FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        Board::from_fen(fen.trim(), false)
            .map(|board| Self { board })
            .map_err(|_| PositionError::InvalidFen {
                fen: fen.to_string(),
            })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Serialize to FEN.
    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn fullmove_number(&self) -> u32 {
        u32::from(self.board.fullmove_number())
    }

    pub fn is_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    /// Material balance in pawns from the side to move's perspective.
    pub fn material_balance(&self) -> i32 {
        material_balance(&self.board, self.board.side_to_move())
    }

    pub fn state(&self) -> GameState {
        match self.board.status() {
            GameStatus::Ongoing => GameState::Ongoing,
            GameStatus::Won => GameState::Checkmate,
            GameStatus::Drawn => {
                if self.has_legal_move() {
                    GameState::FiftyMoves
                } else {
                    GameState::Stalemate
                }
            }
        }
    }

    fn has_legal_move(&self) -> bool {
        self.board.generate_moves(|moves| !moves.is_empty())
    }

    /// All legal moves in the backend's encoding.
    pub(crate) fn backend_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|piece_moves| {
            moves.extend(piece_moves);
            false
        });
        moves
    }

    /// All legal moves in coordinate notation.
    pub fn legal_moves(&self) -> Vec<CoordinateMove> {
        self.backend_moves()
            .into_iter()
            .map(|mv| self.to_coordinate(mv))
            .collect()
    }

    /// Translate a backend move to coordinate notation.
    ///
    /// The backend encodes castling as the king capturing its own rook; the
    /// coordinate form moves the king two files instead.
    pub(crate) fn to_coordinate(&self, mv: Move) -> CoordinateMove {
        if self.is_castle(mv) {
            let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
                File::G
            } else {
                File::C
            };
            return CoordinateMove::new(mv.from, Square::new(file, mv.from.rank()));
        }
        CoordinateMove {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        }
    }

    pub(crate) fn is_castle(&self, mv: Move) -> bool {
        self.board.piece_on(mv.from) == Some(Piece::King)
            && self.board.color_on(mv.to) == Some(self.board.side_to_move())
    }

    /// Look up the legal backend move matching `mv`, if any.
    pub(crate) fn find_move(&self, mv: &CoordinateMove) -> Option<Move> {
        self.backend_moves()
            .into_iter()
            .find(|&candidate| self.to_coordinate(candidate) == *mv)
    }

    pub fn is_legal(&self, mv: &CoordinateMove) -> bool {
        self.find_move(mv).is_some()
    }

    /// SAN for a legal move, or `None` if the move is illegal here.
    pub fn san(&self, mv: &CoordinateMove) -> Option<String> {
        let backend = self.find_move(mv)?;
        Some(san::format(self, backend))
    }

    /// Play a coordinate move. Returns the move's SAN.
    pub fn play(&mut self, mv: &CoordinateMove) -> Result<String, PositionError> {
        let backend = self.find_move(mv).ok_or_else(|| PositionError::IllegalMove {
            notation: mv.to_string(),
            fen: self.fen(),
        })?;
        let text = san::format(self, backend);
        self.board.play_unchecked(backend);
        Ok(text)
    }

    /// Resolve move text in coordinate or SAN notation to a legal move.
    pub fn parse_notation(&self, text: &str) -> Result<CoordinateMove, PositionError> {
        let trimmed = text.trim();
        if let Some(mv) = CoordinateMove::parse(trimmed) {
            return if self.is_legal(&mv) {
                Ok(mv)
            } else {
                Err(PositionError::IllegalMove {
                    notation: trimmed.to_string(),
                    fen: self.fen(),
                })
            };
        }

        let wanted = san::normalize(trimmed).ok_or_else(|| PositionError::UnparsableMove {
            notation: trimmed.to_string(),
        })?;
        self.backend_moves()
            .into_iter()
            .find(|&mv| san::normalize(&san::format(self, mv)).as_deref() == Some(wanted.as_str()))
            .map(|mv| self.to_coordinate(mv))
            .ok_or_else(|| PositionError::IllegalMove {
                notation: trimmed.to_string(),
                fen: self.fen(),
            })
    }

    /// Play move text in coordinate or SAN notation.
    ///
    /// Returns the coordinate form and the SAN of the played move.
    pub fn play_notation(&mut self, text: &str) -> Result<(CoordinateMove, String), PositionError> {
        let mv = self.parse_notation(text)?;
        let san = self.play(&mv)?;
        Ok((mv, san))
    }

    /// Key identifying the position for repetition purposes (FEN without clocks).
    pub fn repetition_key(&self) -> String {
        repetition_key(&self.fen())
    }
}

/// The first four FEN fields: placement, side, castling and en passant.
pub(crate) fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use cozy_chess::Square;

    use super::{GameState, Position, STARTING_FEN};
    use crate::chess_move::CoordinateMove;

    #[test]
    fn startpos_round_trips_fen() {
        assert_eq!(Position::startpos().fen(), STARTING_FEN);
    }

    #[test]
    fn startpos_has_twenty_moves() {
        assert_eq!(Position::startpos().legal_moves().len(), 20);
    }

    #[test]
    fn invalid_fen_is_rejected() {
        assert!(Position::from_fen("not a fen").is_err());
    }

    #[test]
    fn castling_uses_king_step() {
        let pos =
            Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let moves = pos.legal_moves();
        assert!(moves.contains(&CoordinateMove::new(Square::E1, Square::G1)));
        assert!(moves.contains(&CoordinateMove::new(Square::E1, Square::C1)));
        assert!(!moves.contains(&CoordinateMove::new(Square::E1, Square::H1)));
    }

    #[test]
    fn play_castle_moves_the_rook() {
        let mut pos =
            Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let san = pos.play(&CoordinateMove::parse("e1g1").unwrap()).unwrap();
        assert_eq!(san, "O-O");
        assert_eq!(
            pos.fen(),
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R4RK1 b kq - 1 1"
        );
    }

    #[test]
    fn illegal_move_is_an_error() {
        let mut pos = Position::startpos();
        assert!(pos.play(&CoordinateMove::parse("e2e5").unwrap()).is_err());
        assert_eq!(pos.fen(), STARTING_FEN);
    }

    #[test]
    fn parse_notation_accepts_san_and_coordinates() {
        let pos = Position::startpos();
        assert_eq!(pos.parse_notation("Nf3").unwrap().to_string(), "g1f3");
        assert_eq!(pos.parse_notation("g1f3").unwrap().to_string(), "g1f3");
        assert_eq!(pos.parse_notation("e4").unwrap().to_string(), "e2e4");
        assert!(pos.parse_notation("Nf4").is_err());
        assert!(pos.parse_notation("hello").is_err());
    }

    #[test]
    fn detects_checkmate() {
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(pos.state(), GameState::Checkmate);
        assert!(pos.is_check());
    }

    #[test]
    fn detects_stalemate() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(pos.state(), GameState::Stalemate);
    }

    #[test]
    fn material_is_from_side_to_move() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
        assert_eq!(pos.material_balance(), -5);
    }
}
