//! Evaluation display: streams the engine's top lines for a position.
//!
//! Uses the same transport, decoder and correlator as the bot session but
//! applies no persona, no jitter and no moves. Each new request supersedes the
//! previous one.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{debug, warn};

use sparring_core::{CandidateLine, Position};
use sparring_persona::{EngineParams, MAX_SKILL_LEVEL};

use crate::actor::{self, Actor, Event, channel_sink};
use crate::command::EngineCommand;
use crate::config::SessionConfig;
use crate::correlator::Correlator;
use crate::error::SessionError;
use crate::manager::{TransportManager, TransportNotice};
use crate::message::EngineMessage;
use crate::transport::{EngineCandidate, EventSink, Launcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisCommand {
    /// Analyze `fen`, reporting up to `breadth` lines.
    Analyze { fen: String, breadth: u8 },
    /// Drop the current analysis.
    Cancel,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisNotification {
    /// Current best lines for `fen`, best rank first.
    Lines { fen: String, lines: Vec<CandidateLine> },
    /// The search for `fen` finished with these lines.
    Finished { fen: String, lines: Vec<CandidateLine> },
    Status(String),
    Unavailable,
}

pub type AnalysisEvent = Event<AnalysisCommand>;

/// Actor state for the evaluation display.
pub struct AnalysisSession<L> {
    transport: TransportManager<L>,
    candidates: Vec<EngineCandidate>,
    correlator: Correlator,
    depth: u8,
    breadth: u8,
    notify: Sender<AnalysisNotification>,
    running: bool,
}

impl<L: Launcher> AnalysisSession<L> {
    pub fn new(
        config: &SessionConfig,
        launcher: L,
        sink: EventSink,
        notify: Sender<AnalysisNotification>,
    ) -> Self {
        Self {
            transport: TransportManager::new(launcher, sink, config.handshake_timeout()),
            candidates: config.engines.clone(),
            correlator: Correlator::new(),
            depth: config.analysis_depth.max(1),
            breadth: 1,
            notify,
            running: true,
        }
    }

    /// Launch the first engine candidate.
    pub fn start(&mut self, now: Instant) {
        let notices = self.transport.start(self.candidates.clone(), now);
        self.handle_notices(notices, now);
    }

    /// Apply one host command or transport event.
    pub fn update(&mut self, event: AnalysisEvent, now: Instant) {
        match event {
            Event::Host(command) => self.handle_command(command, now),
            Event::Transport(event) => {
                let notices = self.transport.on_event(event, now);
                self.handle_notices(notices, now);
            }
        }
    }

    /// Check the handshake deadline.
    pub fn tick(&mut self, now: Instant) {
        let notices = self.transport.on_tick(now);
        self.handle_notices(notices, now);
    }

    fn tell(&self, notification: AnalysisNotification) {
        if self.notify.send(notification).is_err() {
            debug!("analysis listener gone");
        }
    }

    fn handle_command(&mut self, command: AnalysisCommand, now: Instant) {
        match command {
            AnalysisCommand::Analyze { fen, breadth } => {
                let position = match Position::from_fen(&fen) {
                    Ok(position) => position,
                    Err(err) => {
                        warn!(error = %err, "analysis requested for bad FEN");
                        self.tell(AnalysisNotification::Status("invalid position".to_string()));
                        return;
                    }
                };
                if self.transport.is_unavailable() {
                    self.tell(AnalysisNotification::Unavailable);
                    return;
                }
                self.breadth = breadth.max(1);
                self.correlator.issue(fen, position.fullmove_number());
                self.dispatch_pending(now);
            }
            AnalysisCommand::Cancel => {
                if self.correlator.outstanding() > 0 && self.transport.is_ready() {
                    self.send_all(&[EngineCommand::Stop], now);
                }
                self.correlator.reset();
            }
            AnalysisCommand::Shutdown => {
                self.running = false;
                self.transport.terminate();
            }
        }
    }

    fn dispatch_pending(&mut self, now: Instant) {
        if !self.transport.is_ready() {
            return;
        }
        let Some(dispatch) = self.correlator.dispatch() else {
            return;
        };
        let params = EngineParams {
            skill_level: MAX_SKILL_LEVEL,
            multipv: self.breadth,
            depth: self.depth,
        };
        let mut commands = Vec::with_capacity(5);
        if dispatch.stop_first {
            commands.push(EngineCommand::Stop);
        }
        commands.extend(EngineCommand::search(&dispatch.request.position_fen, &params));
        self.send_all(&commands, now);
    }

    fn send_all(&mut self, commands: &[EngineCommand], now: Instant) {
        for command in commands {
            if let Err(err) = self.transport.send(command) {
                warn!(cmd = %command, error = %err, "engine write failed");
                let notices = self.transport.fail_current(&err.to_string(), now);
                self.handle_notices(notices, now);
                return;
            }
        }
    }

    fn handle_notices(&mut self, notices: Vec<TransportNotice>, now: Instant) {
        for notice in notices {
            match notice {
                TransportNotice::Ready { engine } => {
                    self.tell(AnalysisNotification::Status(format!("connected to {engine}")));
                    self.send_all(&[EngineCommand::IsReady], now);
                    self.dispatch_pending(now);
                }
                TransportNotice::Unavailable => self.tell(AnalysisNotification::Unavailable),
                TransportNotice::Lost => self.correlator.engine_lost(),
                TransportNotice::Message(EngineMessage::Analysis(line)) => {
                    if !self.correlator.accept_line(line.candidate()) {
                        continue;
                    }
                    if let Some(request) = self.correlator.active() {
                        let fen = request.position_fen.clone();
                        let lines = self.correlator.lines();
                        self.tell(AnalysisNotification::Lines { fen, lines });
                    }
                }
                TransportNotice::Message(EngineMessage::BestMove(best)) => {
                    if let Some(done) = self.correlator.accept_best_move(best) {
                        self.tell(AnalysisNotification::Finished {
                            fen: done.request.position_fen,
                            lines: done.lines,
                        });
                    }
                }
                TransportNotice::Message(_) => {}
            }
        }
    }
}

impl<L: Launcher> Actor for AnalysisSession<L> {
    type Command = AnalysisCommand;

    fn start(&mut self, now: Instant) {
        AnalysisSession::start(self, now);
    }

    fn update(&mut self, event: AnalysisEvent, now: Instant) {
        AnalysisSession::update(self, event, now);
    }

    fn tick(&mut self, now: Instant) {
        AnalysisSession::tick(self, now);
    }

    fn deadline(&self) -> Option<Instant> {
        self.transport.deadline()
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn finish(&mut self) {
        self.transport.terminate();
    }
}

/// Host-side handle to an analysis client on its own thread.
pub struct AnalysisHandle {
    tx: Sender<AnalysisEvent>,
    thread: Option<JoinHandle<()>>,
}

impl AnalysisHandle {
    /// Start an analysis client thread driving engines from `launcher`.
    pub fn spawn<L>(
        config: SessionConfig,
        launcher: L,
    ) -> Result<(AnalysisHandle, Receiver<AnalysisNotification>), SessionError>
    where
        L: Launcher + Send + 'static,
    {
        config.validate()?;
        let (tx, rx) = mpsc::channel();
        let (notify_tx, notify_rx) = mpsc::channel();
        let session = AnalysisSession::new(&config, launcher, channel_sink(tx.clone()), notify_tx);
        let thread = std::thread::Builder::new()
            .name("analysis".to_string())
            .spawn(move || actor::run(session, rx))
            .map_err(|source| SessionError::Thread { source })?;
        Ok((
            AnalysisHandle {
                tx,
                thread: Some(thread),
            },
            notify_rx,
        ))
    }

    fn send(&self, command: AnalysisCommand) -> Result<(), SessionError> {
        self.tx
            .send(Event::Host(command))
            .map_err(|_| SessionError::Closed)
    }

    /// Analyze `fen`, replacing any running analysis.
    pub fn analyze(&self, fen: impl Into<String>, breadth: u8) -> Result<(), SessionError> {
        self.send(AnalysisCommand::Analyze {
            fen: fen.into(),
            breadth,
        })
    }

    /// Stop the running analysis; its remaining output is discarded.
    pub fn cancel(&self) -> Result<(), SessionError> {
        self.send(AnalysisCommand::Cancel)
    }

    /// Stop the client and wait for its thread to exit.
    pub fn shutdown(mut self) -> Result<(), SessionError> {
        self.send(AnalysisCommand::Shutdown)?;
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| SessionError::Closed)?;
        }
        Ok(())
    }
}

impl Drop for AnalysisHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.tx.send(Event::Host(AnalysisCommand::Shutdown));
            let _ = thread.join();
        }
    }
}
