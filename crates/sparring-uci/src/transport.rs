//! Engine processes and the events they produce.
//!
//! A [`Launcher`] starts one engine candidate and hands back an
//! [`EngineLink`] for writing commands. Output flows the other way through an
//! [`EventSink`]: every line and the final close are tagged with the
//! [`InstanceId`] of the launch that produced them, so events from a process
//! that has since been replaced can be recognised and ignored.

use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::command::EngineCommand;
use crate::error::TransportError;

/// Identifies one launch of one engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Output of an engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Line { instance: InstanceId, line: String },
    /// The process closed its output or reading from it failed.
    Closed { instance: InstanceId, reason: String },
}

impl TransportEvent {
    pub fn instance(&self) -> InstanceId {
        match self {
            TransportEvent::Line { instance, .. } | TransportEvent::Closed { instance, .. } => {
                *instance
            }
        }
    }
}

/// Where transport events are delivered; usually the owning actor's channel.
pub type EventSink = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// One entry of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCandidate {
    /// Label used in logs and status text.
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineCandidate {
    /// Candidate named after the file stem of `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            args: Vec::new(),
        }
    }
}

/// Write half of a running engine.
pub trait EngineLink: Send {
    fn send(&mut self, command: &EngineCommand) -> Result<(), TransportError>;

    /// Stop the process. Calling this more than once is harmless.
    fn terminate(&mut self);
}

/// Starts engine processes.
pub trait Launcher {
    fn launch(
        &mut self,
        candidate: &EngineCandidate,
        instance: InstanceId,
        sink: EventSink,
    ) -> Result<Box<dyn EngineLink>, TransportError>;
}

/// Launches real engine binaries with piped stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(
        &mut self,
        candidate: &EngineCandidate,
        instance: InstanceId,
        sink: EventSink,
    ) -> Result<Box<dyn EngineLink>, TransportError> {
        let mut child = Command::new(&candidate.path)
            .args(&candidate.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                path: candidate.path.clone(),
                source,
            })?;

        let missing = |stream| TransportError::MissingPipe {
            path: candidate.path.clone(),
            stream,
        };
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            kill(&mut child, &candidate.path);
            return Err(missing("stdio"));
        };

        let spawned = std::thread::Builder::new()
            .name(format!("engine-reader-{}", instance.0))
            .spawn(move || {
                let reader = BufReader::new(stdout);
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            trace!(%instance, line, "engine output");
                            sink(TransportEvent::Line {
                                instance,
                                line: line.to_string(),
                            });
                        }
                        Err(err) => {
                            sink(TransportEvent::Closed {
                                instance,
                                reason: err.to_string(),
                            });
                            return;
                        }
                    }
                }
                sink(TransportEvent::Closed {
                    instance,
                    reason: "engine closed its output".to_string(),
                });
            });
        if let Err(source) = spawned {
            kill(&mut child, &candidate.path);
            return Err(TransportError::Io { source });
        }

        debug!(%instance, path = %candidate.path.display(), "engine process started");
        Ok(Box::new(ProcessLink {
            child,
            stdin,
            path: candidate.path.clone(),
            terminated: false,
        }))
    }
}

fn kill(child: &mut Child, path: &Path) {
    if let Err(err) = child.kill() {
        debug!(path = %path.display(), error = %err, "kill failed, process already gone");
    }
    let _ = child.wait();
}

struct ProcessLink {
    child: Child,
    stdin: ChildStdin,
    path: PathBuf,
    terminated: bool,
}

impl EngineLink for ProcessLink {
    fn send(&mut self, command: &EngineCommand) -> Result<(), TransportError> {
        if self.terminated {
            return Err(TransportError::NotRunning);
        }
        debug!(cmd = %command, "sending to engine");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        if let Err(err) = writeln!(self.stdin, "{}", EngineCommand::Quit) {
            warn!(path = %self.path.display(), error = %err, "could not send quit");
        }
        kill(&mut self.child, &self.path);
    }
}

impl Drop for ProcessLink {
    fn drop(&mut self) {
        self.terminate();
    }
}
