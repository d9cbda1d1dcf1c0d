use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sparring_core::pgn::{self, PgnHeaders};
use sparring_core::{CandidateLine, Color, MoveHistoryLog, Position};
use sparring_persona::Persona;
use sparring_uci::{
    AnalysisHandle, AnalysisNotification, EngineCandidate, HostNotification, ProcessLauncher,
    SessionConfig, SessionHandle,
};

#[derive(Parser, Debug)]
#[command(name = "sparring", about = "Play against engine-driven personas or analyze positions")]
struct Args {
    /// JSON session config; built-in defaults otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine binary to try, in order (replaces the configured chain)
    #[arg(long = "engine")]
    engines: Vec<PathBuf>,

    /// Seed for persona choices and score jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum score jitter in centipawns (0 disables)
    #[arg(long)]
    jitter: Option<i32>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Play a game on the terminal
    Play {
        #[arg(long, default_value = "club")]
        persona: Persona,

        /// Side you play
        #[arg(long, value_enum, default_value_t = Side::White)]
        side: Side,

        /// Start from this FEN instead of the standard position
        #[arg(long)]
        fen: Option<String>,

        /// Write the finished game as PGN to this path
        #[arg(long)]
        pgn_out: Option<PathBuf>,
    },
    /// Stream the engine's best lines for a position
    Analyze {
        fen: String,

        /// Number of lines to show
        #[arg(long, default_value_t = 3)]
        lines: u8,

        /// Search depth; the configured analysis depth otherwise
        #[arg(long)]
        depth: Option<u8>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    White,
    Black,
}

impl Side {
    fn color(self) -> Color {
        match self {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command {
        Cmd::Play {
            persona,
            side,
            fen,
            pgn_out,
        } => play(config, persona, side.color(), fen, pgn_out),
        Cmd::Analyze { fen, lines, depth } => {
            let mut config = config;
            if let Some(depth) = depth {
                config.analysis_depth = depth;
            }
            analyze(config, &fen, lines)
        }
    }
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if !args.engines.is_empty() {
        config.engines = args.engines.iter().cloned().map(EngineCandidate::from_path).collect();
    }
    if let Some(seed) = args.seed {
        config.jitter.seed = Some(seed);
    }
    if let Some(amount) = args.jitter {
        config.jitter.amount_cp = amount;
    }
    config.validate()?;
    Ok(config)
}

fn play(
    config: SessionConfig,
    persona: Persona,
    human: Color,
    start_fen: Option<String>,
    pgn_out: Option<PathBuf>,
) -> Result<()> {
    let mut position = match &start_fen {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::startpos(),
    };
    let mut history = match &start_fen {
        Some(fen) => MoveHistoryLog::from_fen(fen.clone()),
        None => MoveHistoryLog::new(),
    };

    let (session, notes) = SessionHandle::spawn(config, ProcessLauncher)?;
    session.new_game(persona, start_fen)?;
    info!(%persona, "game started");
    println!("Playing {persona}. Enter moves in SAN or coordinates, 'quit' to stop.");

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();
    loop {
        if position.state().is_over() || history.is_threefold() {
            break;
        }

        if position.side_to_move() != human {
            session.request_bot_move(position.fen())?;
            match await_bot_move(&notes)? {
                Some((san, fen)) => {
                    position = Position::from_fen(&fen)?;
                    println!("{persona} plays {san}");
                    history.push(san, fen);
                }
                None => break,
            }
            continue;
        }

        print!("{} > ", position.fen());
        io::stdout().flush()?;
        let Some(line) = input.next() else {
            break;
        };
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "quit" {
            break;
        }
        match position.play_notation(text) {
            Ok((_, san)) => {
                session.record_move(text)?;
                history.push(san, position.fen());
            }
            Err(err) => println!("{err}"),
        }
    }

    let headers = match human {
        Color::White => PgnHeaders {
            white: "You".to_string(),
            black: persona.to_string(),
            ..PgnHeaders::default()
        },
        Color::Black => PgnHeaders {
            white: persona.to_string(),
            black: "You".to_string(),
            ..PgnHeaders::default()
        },
    };
    let record = pgn::export(&history, &headers);
    println!("Result: {}", pgn::result_token(&history, &position));
    if let Some(path) = pgn_out {
        std::fs::write(&path, &record).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("\n{record}");
    }

    session.shutdown()?;
    Ok(())
}

/// Wait for the bot's reply. `None` means the game cannot continue.
fn await_bot_move(notes: &Receiver<HostNotification>) -> Result<Option<(String, String)>> {
    loop {
        let note = notes.recv().context("session stopped")?;
        let pending = note.keeps_request_alive();
        match note {
            HostNotification::BotMoveChosen { san, fen, .. } => return Ok(Some((san, fen))),
            HostNotification::EngineStatus(text) => println!("[{text}]"),
            HostNotification::EngineUnavailable => bail!("no chess engine could be started"),
        }
        if !pending {
            return Ok(None);
        }
    }
}

fn analyze(config: SessionConfig, fen: &str, breadth: u8) -> Result<()> {
    let (analysis, notes) = AnalysisHandle::spawn(config, ProcessLauncher)?;
    analysis.analyze(fen, breadth)?;

    let mut best: Option<CandidateLine> = None;
    loop {
        match notes.recv().context("analysis stopped")? {
            AnalysisNotification::Lines { lines, .. } => {
                let top = lines.first().copied();
                if top.map(|l| (l.mv, l.score)) != best.map(|l| (l.mv, l.score)) {
                    if let Some(line) = top {
                        println!("  {} {}", line.score, line.mv);
                    }
                    best = top;
                }
            }
            AnalysisNotification::Finished { lines, .. } => {
                for line in &lines {
                    println!("{}. {} {}", line.rank, line.mv, line.score);
                }
                break;
            }
            AnalysisNotification::Status(text) => {
                println!("[{text}]");
                if text == "invalid position" {
                    break;
                }
            }
            AnalysisNotification::Unavailable => bail!("no chess engine could be started"),
        }
    }

    analysis.shutdown()?;
    Ok(())
}
