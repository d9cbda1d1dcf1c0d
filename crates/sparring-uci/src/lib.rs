//! Driving an external UCI engine: process management with a fallback chain,
//! output decoding, generation-checked correlation, and the two actors built
//! on them (the persona bot session and the evaluation-display client).

mod actor;
mod error;

pub mod analysis;
pub mod command;
pub mod config;
pub mod correlator;
pub mod manager;
pub mod message;
pub mod session;
pub mod transport;

pub use actor::{Event, channel_sink};
pub use analysis::{AnalysisCommand, AnalysisEvent, AnalysisHandle, AnalysisNotification, AnalysisSession};
pub use command::EngineCommand;
pub use config::SessionConfig;
pub use correlator::{CompletedSearch, Correlator, Dispatch, SearchRequest};
pub use error::{SessionError, TransportError};
pub use manager::{DEFAULT_HANDSHAKE_TIMEOUT, TransportManager, TransportNotice, TransportState};
pub use message::{AnalysisLine, BestMove, EngineMessage, parse_line};
pub use session::{BotSession, HostCommand, HostNotification, SessionEvent, SessionHandle};
pub use transport::{
    EngineCandidate, EngineLink, EventSink, InstanceId, Launcher, ProcessLauncher, TransportEvent,
};
