//! Boots an engine from an ordered chain of candidates and keeps one running.
//!
//! ```text
//!   Idle --start--> Trying{0} --uciok--> Ready{0}
//!                      |                    |
//!          timeout/spawn/close          close
//!                      v                    v
//!                 Trying{1} ... ----> Trying{i+1} ... --> Unavailable
//! ```
//!
//! The manager is driven entirely from outside: transport events and clock
//! ticks go in, [`TransportNotice`]s come out. It never sleeps and never reads
//! the clock itself.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command::EngineCommand;
use crate::error::TransportError;
use crate::message::{EngineMessage, parse_line};
use crate::transport::{EngineCandidate, EngineLink, EventSink, InstanceId, Launcher, TransportEvent};

/// Default time a candidate gets to answer `uci` with `uciok`.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the manager is in its candidate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Nothing launched yet.
    Idle,
    /// Candidate `index` is running and has until `deadline` to send `uciok`.
    Trying {
        index: usize,
        instance: InstanceId,
        deadline: Instant,
    },
    /// Candidate `index` finished its handshake and accepts commands.
    Ready {
        index: usize,
        instance: InstanceId,
    },
    /// Every candidate failed; terminal.
    Unavailable,
}

/// What the owner of the manager needs to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotice {
    /// Handshake finished; commands may be sent.
    Ready { engine: String },
    /// The fallback chain is exhausted.
    Unavailable,
    /// A ready engine died; in-flight work is gone.
    Lost,
    /// Decoded output from the ready engine.
    Message(EngineMessage),
}

/// Runs at most one engine process, walking the candidate chain in order
/// until one completes the handshake.
///
/// A candidate that fails to spawn, misses the handshake deadline or exits is
/// terminated and the next one is tried. Events from replaced processes are
/// recognised by their [`InstanceId`] and dropped. Once the chain is
/// exhausted the manager stays [`TransportState::Unavailable`].
pub struct TransportManager<L> {
    launcher: L,
    sink: EventSink,
    candidates: Vec<EngineCandidate>,
    handshake_timeout: Duration,
    state: TransportState,
    link: Option<Box<dyn EngineLink>>,
    next_instance: u64,
    engine_name: Option<String>,
}

impl<L: Launcher> TransportManager<L> {
    pub fn new(launcher: L, sink: EventSink, handshake_timeout: Duration) -> Self {
        Self {
            launcher,
            sink,
            candidates: Vec::new(),
            handshake_timeout,
            state: TransportState::Idle,
            link: None,
            next_instance: 0,
            engine_name: None,
        }
    }

    /// Current position in the chain.
    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, TransportState::Ready { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state, TransportState::Unavailable)
    }

    /// Handshake deadline of the candidate being tried, if any.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            TransportState::Trying { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// The candidate currently being tried or running.
    pub fn current(&self) -> Option<&EngineCandidate> {
        match self.state {
            TransportState::Trying { index, .. } | TransportState::Ready { index, .. } => {
                self.candidates.get(index)
            }
            _ => None,
        }
    }

    /// Begin the fallback chain at its first candidate.
    pub fn start(&mut self, candidates: Vec<EngineCandidate>, now: Instant) -> Vec<TransportNotice> {
        self.candidates = candidates;
        self.try_from(0, now)
    }

    /// Send a command to the ready engine.
    pub fn send(&mut self, command: &EngineCommand) -> Result<(), TransportError> {
        if !self.is_ready() {
            return Err(TransportError::NotRunning);
        }
        match self.link.as_mut() {
            Some(link) => link.send(command),
            None => Err(TransportError::NotRunning),
        }
    }

    /// Abandon the running engine after a failed write and move down the chain.
    pub fn fail_current(&mut self, reason: &str, now: Instant) -> Vec<TransportNotice> {
        match self.state {
            TransportState::Ready { index, .. } => {
                warn!(reason, "engine failed while ready");
                let mut notices = vec![TransportNotice::Lost];
                notices.extend(self.try_from(index + 1, now));
                notices
            }
            TransportState::Trying { index, .. } => {
                warn!(reason, "engine failed during handshake");
                self.try_from(index + 1, now)
            }
            TransportState::Idle | TransportState::Unavailable => Vec::new(),
        }
    }

    /// Process one event from an engine process.
    pub fn on_event(&mut self, event: TransportEvent, now: Instant) -> Vec<TransportNotice> {
        let current = match self.state {
            TransportState::Trying { instance, .. } | TransportState::Ready { instance, .. } => {
                instance
            }
            TransportState::Idle | TransportState::Unavailable => {
                debug!(instance = %event.instance(), "event with no engine running");
                return Vec::new();
            }
        };
        if event.instance() != current {
            debug!(instance = %event.instance(), %current, "dropping event from replaced engine");
            return Vec::new();
        }

        match event {
            TransportEvent::Line { line, .. } => self.on_line(&line),
            TransportEvent::Closed { reason, .. } => self.fail_current(&reason, now),
        }
    }

    fn on_line(&mut self, line: &str) -> Vec<TransportNotice> {
        let message = parse_line(line);
        if let EngineMessage::Id { name } = &message {
            self.engine_name = Some(name.clone());
        }

        match self.state {
            TransportState::Trying {
                index, instance, ..
            } => {
                if message != EngineMessage::HandshakeComplete {
                    return Vec::new();
                }
                self.state = TransportState::Ready { index, instance };
                let engine = self.engine_name.clone().unwrap_or_else(|| {
                    self.candidates
                        .get(index)
                        .map(|c| c.name.clone())
                        .unwrap_or_default()
                });
                info!(engine = %engine, %instance, "engine ready");
                vec![TransportNotice::Ready { engine }]
            }
            TransportState::Ready { .. } => match message {
                EngineMessage::Unrecognized => {
                    debug!(line, "unrecognized engine output");
                    Vec::new()
                }
                message => vec![TransportNotice::Message(message)],
            },
            TransportState::Idle | TransportState::Unavailable => Vec::new(),
        }
    }

    /// Check the handshake deadline.
    pub fn on_tick(&mut self, now: Instant) -> Vec<TransportNotice> {
        match self.state {
            TransportState::Trying {
                index, deadline, ..
            } if now >= deadline => {
                let name = self.candidates.get(index).map(|c| c.name.as_str()).unwrap_or("?");
                warn!(engine = name, "handshake timed out");
                self.try_from(index + 1, now)
            }
            _ => Vec::new(),
        }
    }

    /// Stop the running engine and return to `Idle`.
    pub fn terminate(&mut self) {
        self.teardown();
        if !self.is_unavailable() {
            self.state = TransportState::Idle;
        }
    }

    fn teardown(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.terminate();
        }
        self.engine_name = None;
    }

    /// Launch candidates from `index` on until one accepts the handshake command.
    fn try_from(&mut self, index: usize, now: Instant) -> Vec<TransportNotice> {
        self.teardown();
        for index in index..self.candidates.len() {
            self.next_instance += 1;
            let instance = InstanceId(self.next_instance);
            let candidate = &self.candidates[index];

            let mut link = match self
                .launcher
                .launch(candidate, instance, self.sink.clone())
            {
                Ok(link) => link,
                Err(err) => {
                    warn!(engine = %candidate.name, error = %err, "engine failed to launch");
                    continue;
                }
            };
            if let Err(err) = link.send(&EngineCommand::Uci) {
                warn!(engine = %candidate.name, error = %err, "engine rejected handshake");
                link.terminate();
                continue;
            }

            info!(engine = %candidate.name, %instance, "waiting for engine handshake");
            self.link = Some(link);
            self.state = TransportState::Trying {
                index,
                instance,
                deadline: now + self.handshake_timeout,
            };
            return Vec::new();
        }

        warn!(tried = self.candidates.len(), "no engine candidate could be started");
        self.state = TransportState::Unavailable;
        vec![TransportNotice::Unavailable]
    }
}

impl<L> Drop for TransportManager<L> {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.terminate();
        }
    }
}
