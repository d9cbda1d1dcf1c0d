//! Transport and session errors.

use std::io;
use std::path::PathBuf;

use sparring_persona::ConfigError;

/// Errors raised while launching or talking to an engine process.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The engine binary could not be started.
    #[error("failed to launch {path}: {source}")]
    Spawn {
        /// Path of the candidate binary.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The child process came up without one of its piped streams.
    #[error("engine {path} has no piped {stream}")]
    MissingPipe {
        /// Path of the candidate binary.
        path: PathBuf,
        /// Name of the missing stream.
        stream: &'static str,
    },

    /// No engine process is currently accepting commands.
    #[error("no engine is running")]
    NotRunning,

    /// Writing to the engine failed.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Errors surfaced by session construction and the host-facing handles.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The actor thread has stopped and no longer accepts commands.
    #[error("session has shut down")]
    Closed,

    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        /// Config file that was being read.
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid JSON for [`SessionConfig`](crate::SessionConfig).
    #[error("cannot parse config: {source}")]
    ConfigParse {
        #[from]
        source: serde_json::Error,
    },

    /// The candidate chain is empty.
    #[error("no engine candidates configured")]
    NoEngines,

    /// A persona config failed validation.
    #[error(transparent)]
    Persona(#[from] ConfigError),

    #[error("failed to start session thread: {source}")]
    Thread {
        #[source]
        source: io::Error,
    },
}
