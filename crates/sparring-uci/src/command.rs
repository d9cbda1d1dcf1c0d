//! Commands sent to the engine.

use std::fmt;

use sparring_persona::EngineParams;

/// A UCI command understood by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// `uci` -- start the handshake.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- the next search belongs to a new game.
    UciNewGame,
    /// `position fen <fen>`.
    Position { fen: String },
    /// `setoption name <name> value <value>`.
    SetOption { name: String, value: String },
    /// `go depth <n>`.
    Go { depth: u8 },
    /// `stop` -- end the current search early.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
}

impl EngineCommand {
    pub fn set_option(name: &str, value: impl fmt::Display) -> Self {
        EngineCommand::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Option and search commands for one search of `fen`.
    pub fn search(fen: &str, params: &EngineParams) -> Vec<EngineCommand> {
        vec![
            EngineCommand::set_option("Skill Level", params.skill_level),
            EngineCommand::set_option("MultiPV", params.multipv),
            EngineCommand::Position {
                fen: fen.to_string(),
            },
            EngineCommand::Go {
                depth: params.depth,
            },
        ]
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => f.write_str("uci"),
            EngineCommand::IsReady => f.write_str("isready"),
            EngineCommand::UciNewGame => f.write_str("ucinewgame"),
            EngineCommand::Position { fen } => write!(f, "position fen {fen}"),
            EngineCommand::SetOption { name, value } => {
                write!(f, "setoption name {name} value {value}")
            }
            EngineCommand::Go { depth } => write!(f, "go depth {depth}"),
            EngineCommand::Stop => f.write_str("stop"),
            EngineCommand::Quit => f.write_str("quit"),
        }
    }
}
