//! Engine output parsing.
//!
//! [`parse_line`] turns one line printed by the engine into an
//! [`EngineMessage`]. It never fails: anything it does not understand, or an
//! `info` line missing the fields a candidate line needs, comes back as
//! [`EngineMessage::Unrecognized`].

use sparring_core::{CandidateLine, CoordinateMove, Score};

/// One ranked line from an `info` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisLine {
    /// `multipv` rank, 1 when the engine did not say.
    pub rank: u32,
    pub score: Score,
    /// First move of the principal variation.
    pub head: CoordinateMove,
    pub depth: Option<u32>,
}

impl AnalysisLine {
    pub fn candidate(&self) -> CandidateLine {
        CandidateLine::new(self.rank, self.head, self.score)
    }
}

/// Payload of a `bestmove` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMove {
    Move(CoordinateMove),
    /// `bestmove (none)` or `bestmove 0000`: no legal move in the searched position.
    NoMove,
    /// Move text that is not coordinate notation.
    Malformed(String),
}

/// A decoded line of engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    /// `uciok`
    HandshakeComplete,
    /// `readyok`
    Ready,
    /// `id name <name>`
    Id { name: String },
    Analysis(AnalysisLine),
    BestMove(BestMove),
    Unrecognized,
}

/// Decode a single line of engine output.
pub fn parse_line(line: &str) -> EngineMessage {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = tokens.split_first() else {
        return EngineMessage::Unrecognized;
    };

    match head {
        "uciok" => EngineMessage::HandshakeComplete,
        "readyok" => EngineMessage::Ready,
        "id" => parse_id(rest),
        "info" => parse_info(rest),
        "bestmove" => EngineMessage::BestMove(parse_best_move(rest)),
        _ => EngineMessage::Unrecognized,
    }
}

fn parse_id(tokens: &[&str]) -> EngineMessage {
    match tokens.split_first() {
        Some((&"name", name)) if !name.is_empty() => EngineMessage::Id {
            name: name.join(" "),
        },
        _ => EngineMessage::Unrecognized,
    }
}

/// Parse the arguments of an `info` line.
///
/// Bound scores (`lowerbound`/`upperbound`) are provisional and dropped.
fn parse_info(tokens: &[&str]) -> EngineMessage {
    let mut rank = 1;
    let mut depth = None;
    let mut score = None;
    let mut head = None;

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                depth = tokens.get(i + 1).and_then(|t| t.parse().ok());
                i += 2;
            }
            "multipv" => {
                match tokens.get(i + 1).and_then(|t| t.parse::<u32>().ok()) {
                    Some(k) if k >= 1 => rank = k,
                    _ => return EngineMessage::Unrecognized,
                }
                i += 2;
            }
            "score" => {
                let value = tokens.get(i + 2).and_then(|t| t.parse::<i32>().ok());
                score = match (tokens.get(i + 1), value) {
                    (Some(&"cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some(&"mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => return EngineMessage::Unrecognized,
                };
                i += 3;
            }
            "lowerbound" | "upperbound" => return EngineMessage::Unrecognized,
            "pv" => {
                head = tokens.get(i + 1).and_then(|t| CoordinateMove::parse(t));
                break;
            }
            // Free text runs to the end of the line.
            "string" => break,
            _ => i += 1,
        }
    }

    match (score, head) {
        (Some(score), Some(head)) => EngineMessage::Analysis(AnalysisLine {
            rank,
            score,
            head,
            depth,
        }),
        _ => EngineMessage::Unrecognized,
    }
}

fn parse_best_move(tokens: &[&str]) -> BestMove {
    match tokens.first() {
        None => BestMove::Malformed(String::new()),
        Some(&"(none)") | Some(&"0000") => BestMove::NoMove,
        Some(text) => match CoordinateMove::parse(text) {
            Some(mv) => BestMove::Move(mv),
            None => BestMove::Malformed(text.to_string()),
        },
    }
}
