//! Error types for position handling and reconstruction.

/// Errors raised by the legality-oracle wrapper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The FEN string was rejected by the rules backend.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// The move text is neither coordinate nor SAN notation.
    #[error("unparsable move: {notation}")]
    UnparsableMove {
        /// The move text as received.
        notation: String,
    },

    /// The move parsed but is not legal in the position.
    #[error("illegal move {notation} in {fen}")]
    IllegalMove {
        /// The move text as received.
        notation: String,
        /// FEN of the position the move was tried against.
        fen: String,
    },
}

/// Errors from applying an engine-returned move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconstructError {
    /// The move was illegal in both the reconstructed and the searched position.
    #[error("move {mv} is illegal in the reconstructed position and in {search_fen}")]
    InvalidMove {
        /// Coordinate text of the rejected move.
        mv: String,
        /// FEN the search was run against.
        search_fen: String,
    },
}
