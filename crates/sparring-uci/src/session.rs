//! The bot session actor.
//!
//! One thread owns everything that changes during a game: the engine
//! transport, the correlator and its generation, the persona-state table and
//! the move-history log. Host commands and engine output arrive on the same
//! channel and are applied one at a time by [`BotSession::update`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use sparring_core::reconstruct::{apply_returned_move, rebuild};
use sparring_core::{CandidateLine, CoordinateMove, MoveHistoryLog, Position};
use sparring_persona::{
    Decision, Jitter, Persona, PersonaConfigs, PersonaState, PersonaTable, RescueTransition,
    decide, parameters_for,
};

use crate::actor::{self, Actor, Event, channel_sink};
use crate::command::EngineCommand;
use crate::config::SessionConfig;
use crate::correlator::{CompletedSearch, Correlator};
use crate::error::SessionError;
use crate::manager::{TransportManager, TransportNotice, TransportState};
use crate::message::{BestMove, EngineMessage};
use crate::transport::{EngineCandidate, EventSink, Launcher};

const CONNECTED_PREFIX: &str = "connected to ";
const SWITCHING_ENGINES: &str = "engine stopped responding, switching engines";

/// Commands from the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Start a game against `persona`, from `start_fen` or the standard position.
    NewGame {
        persona: Persona,
        start_fen: Option<String>,
    },
    /// The opponent's move, in SAN or coordinate notation.
    RecordMove(String),
    /// Search `fen` and play a move for its side to move.
    RequestBotMove { fen: String },
    Shutdown,
}

/// What the host is told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    BotMoveChosen {
        mv: CoordinateMove,
        san: String,
        /// Position after the move.
        fen: String,
    },
    EngineStatus(String),
    EngineUnavailable,
}

impl HostNotification {
    /// True when a requested bot move can still arrive after this notification.
    ///
    /// Only connection changes qualify; any other status ends the request.
    pub fn keeps_request_alive(&self) -> bool {
        match self {
            HostNotification::EngineStatus(text) => {
                text.starts_with(CONNECTED_PREFIX) || text == SWITCHING_ENGINES
            }
            HostNotification::BotMoveChosen { .. } | HostNotification::EngineUnavailable => false,
        }
    }
}

pub type SessionEvent = Event<HostCommand>;

/// Actor state for one bot opponent. Driven by [`BotSession::update`],
/// either directly or on the thread behind a [`SessionHandle`].
pub struct BotSession<L> {
    transport: TransportManager<L>,
    candidates: Vec<EngineCandidate>,
    correlator: Correlator,
    configs: PersonaConfigs,
    personas: PersonaTable,
    persona: Persona,
    history: MoveHistoryLog,
    jitter: Jitter,
    rng: SmallRng,
    notify: Sender<HostNotification>,
    /// Set after an unplayable engine move; cleared by the next new game.
    frozen: bool,
    running: bool,
}

impl<L: Launcher> BotSession<L> {
    pub fn new(
        config: &SessionConfig,
        launcher: L,
        sink: EventSink,
        notify: Sender<HostNotification>,
    ) -> Self {
        let rng = match config.jitter.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
            None => SmallRng::from_entropy(),
        };
        Self {
            transport: TransportManager::new(launcher, sink, config.handshake_timeout()),
            candidates: config.engines.clone(),
            correlator: Correlator::new(),
            configs: config.personas.clone(),
            personas: PersonaTable::new(),
            persona: Persona::Club,
            history: MoveHistoryLog::new(),
            jitter: Jitter::new(&config.jitter),
            rng,
            notify,
            frozen: false,
            running: true,
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn persona_state(&self) -> &PersonaState {
        self.personas.get(self.persona)
    }

    pub fn history(&self) -> &MoveHistoryLog {
        &self.history
    }

    /// Current correlator generation; advanced by every new game.
    pub fn generation(&self) -> u64 {
        self.correlator.generation()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Position of the transport in its fallback chain.
    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.transport.deadline()
    }

    /// Launch the first engine candidate.
    pub fn start(&mut self, now: Instant) {
        let notices = self.transport.start(self.candidates.clone(), now);
        self.handle_notices(notices, now);
    }

    /// Apply one event. All session state changes go through here.
    pub fn update(&mut self, event: SessionEvent, now: Instant) {
        match event {
            Event::Host(command) => self.handle_host(command, now),
            Event::Transport(event) => {
                let notices = self.transport.on_event(event, now);
                self.handle_notices(notices, now);
            }
        }
    }

    /// Advance time without an event.
    pub fn tick(&mut self, now: Instant) {
        let notices = self.transport.on_tick(now);
        self.handle_notices(notices, now);
    }

    fn tell(&self, notification: HostNotification) {
        if self.notify.send(notification).is_err() {
            debug!("host stopped listening");
        }
    }

    fn status(&self, text: impl Into<String>) {
        self.tell(HostNotification::EngineStatus(text.into()));
    }

    fn handle_host(&mut self, command: HostCommand, now: Instant) {
        match command {
            HostCommand::NewGame { persona, start_fen } => self.new_game(persona, start_fen, now),
            HostCommand::RecordMove(notation) => self.record_move(&notation),
            HostCommand::RequestBotMove { fen } => self.request_bot_move(fen, now),
            HostCommand::Shutdown => {
                info!("session shutting down");
                self.running = false;
                self.transport.terminate();
            }
        }
    }

    fn new_game(&mut self, persona: Persona, start_fen: Option<String>, now: Instant) {
        if let Some(Err(err)) = start_fen.as_deref().map(Position::from_fen) {
            warn!(error = %err, "new game rejected");
            self.status("invalid start position");
            return;
        }

        let stop = self.correlator.outstanding() > 0;
        self.correlator.new_game();
        self.personas.reset();
        self.persona = persona;
        self.history.clear(start_fen);
        self.frozen = false;
        info!(%persona, generation = self.correlator.generation(), "new game");

        if self.transport.is_ready() {
            let mut commands = Vec::with_capacity(3);
            if stop {
                commands.push(EngineCommand::Stop);
            }
            commands.extend([EngineCommand::UciNewGame, EngineCommand::IsReady]);
            self.send_all(&commands, now);
        }
    }

    fn record_move(&mut self, notation: &str) {
        let mut position = rebuild(&self.history);
        match position.play_notation(notation) {
            Ok((mv, san)) => {
                debug!(notation, %mv, san = %san, "opponent move recorded");
                self.history.push(notation, position.fen());
            }
            Err(err) => {
                warn!(notation, error = %err, "opponent move rejected");
                self.status(format!("illegal move: {notation}"));
            }
        }
    }

    fn request_bot_move(&mut self, fen: String, now: Instant) {
        if self.frozen {
            self.status("bot stopped after an invalid move; start a new game");
            return;
        }
        let position = match Position::from_fen(&fen) {
            Ok(position) => position,
            Err(err) => {
                warn!(error = %err, "bot move requested for bad FEN");
                self.status("invalid position");
                return;
            }
        };
        if position.state().is_over() || self.history.is_threefold() {
            self.status("game is over");
            return;
        }
        if self.transport.is_unavailable() {
            self.tell(HostNotification::EngineUnavailable);
            return;
        }

        let request = self.correlator.issue(fen, position.fullmove_number());
        debug!(id = request.id, generation = request.generation, "bot move requested");
        self.dispatch_pending(now);
    }

    /// Send the active request if it has not been sent and an engine is ready.
    fn dispatch_pending(&mut self, now: Instant) {
        if !self.transport.is_ready() {
            return;
        }
        let Some(dispatch) = self.correlator.dispatch() else {
            return;
        };

        let config = self.configs.get(self.persona);
        let state = self.personas.get(self.persona);
        let params = parameters_for(config, state, &mut self.rng);
        debug!(
            id = dispatch.request.id,
            skill = params.skill_level,
            multipv = params.multipv,
            depth = params.depth,
            rescue = params.is_rescue(),
            "dispatching search"
        );

        let mut commands = Vec::with_capacity(5);
        if dispatch.stop_first {
            commands.push(EngineCommand::Stop);
        }
        commands.extend(EngineCommand::search(&dispatch.request.position_fen, &params));
        self.send_all(&commands, now);
    }

    /// Write `commands` in order; a failed write abandons the engine.
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
                    self.status(format!("{CONNECTED_PREFIX}{engine}"));
                    self.send_all(&[EngineCommand::UciNewGame, EngineCommand::IsReady], now);
                    self.dispatch_pending(now);
                }
                TransportNotice::Unavailable => {
                    warn!("no engine available");
                    self.tell(HostNotification::EngineUnavailable);
                }
                TransportNotice::Lost => {
                    self.correlator.engine_lost();
                    self.status(SWITCHING_ENGINES);
                }
                TransportNotice::Message(message) => self.handle_message(message),
            }
        }
    }

    fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Analysis(line) => {
                let score = self.jitter.apply(line.score);
                let candidate = CandidateLine::new(line.rank, line.head, score);
                self.correlator.accept_line(candidate);
            }
            EngineMessage::BestMove(best) => {
                if let Some(done) = self.correlator.accept_best_move(best) {
                    self.complete(done);
                }
            }
            EngineMessage::Ready => debug!("engine synchronized"),
            EngineMessage::Id { name } => debug!(name = %name, "engine identified"),
            EngineMessage::HandshakeComplete | EngineMessage::Unrecognized => {}
        }
    }

    /// Choose, apply and announce the bot's move for a finished search.
    fn complete(&mut self, done: CompletedSearch) {
        let search_fen = done.request.position_fen;
        let searched = match Position::from_fen(&search_fen) {
            Ok(position) => position,
            Err(err) => {
                warn!(error = %err, "searched FEN no longer parses");
                self.freeze();
                return;
            }
        };

        let config = self.configs.get(self.persona);
        let state = self.personas.get(self.persona);
        let decision = decide(
            config,
            &done.lines,
            searched.material_balance(),
            state,
            &mut self.rng,
        );
        let mv = match (&decision, done.best) {
            (Some(decision), _) => decision.chosen.mv,
            (None, BestMove::Move(mv)) => mv,
            (None, BestMove::NoMove) => {
                self.status("engine found no legal move");
                return;
            }
            (None, BestMove::Malformed(raw)) => {
                warn!(raw = %raw, "malformed bestmove and no analysis to fall back on");
                self.freeze();
                return;
            }
        };

        let reconstructed = rebuild(&self.history);
        let applied = match apply_returned_move(&reconstructed, &mv, &search_fen) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(error = %err, "engine move could not be applied");
                self.freeze();
                return;
            }
        };

        if applied.rebased {
            warn!(fen = %search_fen, "history diverged from searched position, rebasing");
            self.history.clear(Some(search_fen));
        }
        let fen = applied.position.fen();
        self.history.push(applied.san.clone(), fen.clone());
        if let Some(decision) = decision {
            self.record_decision(&decision);
        }

        info!(persona = %self.persona, %mv, san = %applied.san, "bot move chosen");
        self.tell(HostNotification::BotMoveChosen {
            mv,
            san: applied.san,
            fen,
        });
    }

    fn record_decision(&mut self, decision: &Decision) {
        match decision.transition {
            RescueTransition::Enter => info!(persona = %self.persona, best = decision.best_score, "entering rescue mode"),
            RescueTransition::Exit => info!(persona = %self.persona, best = decision.best_score, "leaving rescue mode"),
            RescueTransition::Stay => {}
        }
        self.personas.get_mut(self.persona).apply(decision);
    }

    fn freeze(&mut self) {
        self.frozen = true;
        self.status("bot produced an invalid move");
    }
}

impl<L: Launcher> Actor for BotSession<L> {
    type Command = HostCommand;

    fn start(&mut self, now: Instant) {
        BotSession::start(self, now);
    }

    fn update(&mut self, event: SessionEvent, now: Instant) {
        BotSession::update(self, event, now);
    }

    fn tick(&mut self, now: Instant) {
        BotSession::tick(self, now);
    }

    fn deadline(&self) -> Option<Instant> {
        BotSession::deadline(self)
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn finish(&mut self) {
        self.transport.terminate();
    }
}

/// Host-side handle to a session running on its own thread.
pub struct SessionHandle {
    tx: Sender<SessionEvent>,
    thread: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a session thread driving engines from `launcher`.
    pub fn spawn<L>(
        config: SessionConfig,
        launcher: L,
    ) -> Result<(SessionHandle, Receiver<HostNotification>), SessionError>
    where
        L: Launcher + Send + 'static,
    {
        config.validate()?;
        let (tx, rx) = mpsc::channel();
        let (notify_tx, notify_rx) = mpsc::channel();
        let session = BotSession::new(&config, launcher, channel_sink(tx.clone()), notify_tx);
        let thread = std::thread::Builder::new()
            .name("bot-session".to_string())
            .spawn(move || actor::run(session, rx))
            .map_err(|source| SessionError::Thread { source })?;
        Ok((
            SessionHandle {
                tx,
                thread: Some(thread),
            },
            notify_rx,
        ))
    }

    fn send(&self, command: HostCommand) -> Result<(), SessionError> {
        self.tx
            .send(Event::Host(command))
            .map_err(|_| SessionError::Closed)
    }

    /// Start a new game; output for earlier requests is discarded.
    pub fn new_game(&self, persona: Persona, start_fen: Option<String>) -> Result<(), SessionError> {
        self.send(HostCommand::NewGame { persona, start_fen })
    }

    /// Record the opponent's move, in SAN or coordinate notation.
    pub fn record_move(&self, notation: impl Into<String>) -> Result<(), SessionError> {
        self.send(HostCommand::RecordMove(notation.into()))
    }

    /// Ask for a bot move in `fen`. The answer arrives as a [`HostNotification`].
    pub fn request_bot_move(&self, fen: impl Into<String>) -> Result<(), SessionError> {
        self.send(HostCommand::RequestBotMove { fen: fen.into() })
    }

    /// Stop the session and wait for its thread to exit.
    pub fn shutdown(mut self) -> Result<(), SessionError> {
        self.send(HostCommand::Shutdown)?;
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| SessionError::Closed)?;
        }
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.tx.send(Event::Host(HostCommand::Shutdown));
            let _ = thread.join();
        }
    }
}
