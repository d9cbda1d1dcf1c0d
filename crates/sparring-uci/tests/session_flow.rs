//! End-to-end bot session behaviour against scripted fake engines.

mod common;

use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use common::{Behavior, FakeLauncher};
use sparring_core::STARTING_FEN;
use sparring_persona::{JitterConfig, Persona, SelectionStyle};
use sparring_uci::{
    BotSession, Event, HostCommand, HostNotification, SessionConfig, SessionEvent, SessionHandle,
    channel_sink,
};

struct Harness {
    session: BotSession<FakeLauncher>,
    launcher: FakeLauncher,
    events: Receiver<SessionEvent>,
    notes: Receiver<HostNotification>,
    now: Instant,
}

fn config(names: &[&str]) -> SessionConfig {
    let mut config = SessionConfig {
        engines: FakeLauncher::candidates(names),
        jitter: JitterConfig {
            amount_cp: 0,
            seed: Some(3),
        },
        ..SessionConfig::default()
    };
    config.personas.novice.selection = SelectionStyle::Blunder {
        min_drop: 20,
        max_drop: 120,
    };
    config
}

impl Harness {
    fn new(launcher: FakeLauncher, names: &[&str]) -> Self {
        let (tx, events) = mpsc::channel();
        let (notify, notes) = mpsc::channel();
        let session = BotSession::new(&config(names), launcher.clone(), channel_sink(tx), notify);
        let mut harness = Harness {
            session,
            launcher,
            events,
            notes,
            now: Instant::now(),
        };
        harness.session.start(harness.now);
        harness.pump();
        harness
    }

    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.session.update(event, self.now);
        }
    }

    fn host(&mut self, command: HostCommand) {
        self.session.update(Event::Host(command), self.now);
        self.pump();
    }

    fn notes(&self) -> Vec<HostNotification> {
        self.notes.try_iter().collect()
    }

    fn moves(&self) -> Vec<(String, String)> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                HostNotification::BotMoveChosen { mv, san, .. } => Some((mv.to_string(), san)),
                _ => None,
            })
            .collect()
    }
}

fn new_game(persona: Persona) -> HostCommand {
    HostCommand::NewGame {
        persona,
        start_fen: None,
    }
}

fn request(fen: &str) -> HostCommand {
    HostCommand::RequestBotMove {
        fen: fen.to_string(),
    }
}

fn status(text: &str) -> HostNotification {
    HostNotification::EngineStatus(text.to_string())
}

#[test]
fn novice_picks_the_only_line_in_its_window() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![vec![
                "info depth 4 multipv 1 score cp 40 pv e2e4 e7e5",
                "info depth 4 multipv 2 score cp 10 pv d2d4 d7d5",
                "bestmove e2e4",
            ]],
        ),
    )]);
    let mut h = Harness::new(launcher, &["A"]);
    assert_eq!(h.notes(), [status("connected to Fake")]);

    h.host(new_game(Persona::Novice));
    h.host(request(STARTING_FEN));
    assert_eq!(h.moves(), [("d2d4".to_string(), "d4".to_string())]);
    assert_eq!(h.session.history().len(), 1);
    assert_eq!(h.session.history().records()[0].notation, "d4");

    let sent = h.launcher.sent_to("A");
    assert!(sent.contains(&"setoption name Skill Level value 2".to_string()));
    assert!(sent.contains(&"setoption name MultiPV value 5".to_string()));
    let go = sent.iter().find(|l| l.starts_with("go depth ")).unwrap();
    let depth: u8 = go["go depth ".len()..].parse().unwrap();
    assert!((3..=6).contains(&depth));
}

#[test]
fn mate_threat_enters_rescue_and_deepens_next_search() {
    for persona in [Persona::Novice, Persona::Club, Persona::Master] {
        let launcher = FakeLauncher::new(vec![(
            "A",
            Behavior::engine(
                "Fake",
                vec![
                    vec![
                        "info depth 8 multipv 1 score mate -3 pv e2e4",
                        "info depth 8 multipv 2 score mate -1 pv a2a3",
                        "bestmove e2e4",
                    ],
                    vec!["info depth 22 score cp -500 pv e7e5", "bestmove e7e5"],
                ],
            ),
        )]);
        let mut h = Harness::new(launcher, &["A"]);
        h.host(new_game(persona));
        h.host(request(STARTING_FEN));
        assert_eq!(h.moves(), [("e2e4".to_string(), "e4".to_string())], "{persona}");
        assert!(h.session.persona_state().rescue_active);
        assert!(h.session.persona_state().last_mate_threat_against_me);

        let after_e4 = h.session.history().last_fen().to_string();
        h.host(request(&after_e4));
        assert_eq!(h.moves(), [("e7e5".to_string(), "e5".to_string())]);
        let deep = h
            .launcher
            .sent_to("A")
            .iter()
            .filter(|line| line.as_str() == "go depth 22")
            .count();
        assert_eq!(deep, 1, "{persona}");
        assert!(h.session.persona_state().rescue_active);
    }
}

#[test]
fn output_from_previous_game_is_discarded() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![
                vec![],
                vec!["info depth 3 score cp 20 pv g1f3", "bestmove g1f3"],
            ],
        ),
    )]);
    let mut h = Harness::new(launcher, &["A"]);
    h.host(new_game(Persona::Master));
    h.host(request(STARTING_FEN));
    let generation = h.session.generation();

    h.host(new_game(Persona::Master));
    assert_eq!(h.session.generation(), generation + 1);
    assert!(h.launcher.sent_to("A").contains(&"stop".to_string()));

    // The first search finally reports, after the game it belonged to ended.
    h.launcher.emit("A", "info depth 9 score cp 90 pv e2e4");
    h.launcher.emit("A", "bestmove e2e4");
    h.pump();
    assert!(h.moves().is_empty());
    assert!(h.session.history().is_empty());

    h.host(request(STARTING_FEN));
    assert_eq!(h.moves(), [("g1f3".to_string(), "Nf3".to_string())]);
}

#[test]
fn invalid_engine_move_freezes_until_new_game() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![
                vec!["info depth 3 score cp 10 pv e2e5", "bestmove e2e5"],
                vec!["info depth 3 score cp 10 pv d2d4", "bestmove d2d4"],
            ],
        ),
    )]);
    let mut h = Harness::new(launcher, &["A"]);
    h.notes();
    h.host(new_game(Persona::Master));
    h.host(request(STARTING_FEN));
    assert_eq!(h.notes(), [status("bot produced an invalid move")]);
    assert!(h.session.is_frozen());

    h.host(request(STARTING_FEN));
    assert_eq!(
        h.notes(),
        [status("bot stopped after an invalid move; start a new game")]
    );

    h.host(new_game(Persona::Master));
    assert!(!h.session.is_frozen());
    h.host(request(STARTING_FEN));
    assert_eq!(h.moves(), [("d2d4".to_string(), "d4".to_string())]);
}

#[test]
fn diverged_history_is_rebased_to_searched_position() {
    let after_d4_d5 = "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2";
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![vec!["info depth 5 score cp 30 pv c1f4", "bestmove c1f4"]],
        ),
    )]);
    let mut h = Harness::new(launcher, &["A"]);
    h.host(new_game(Persona::Master));
    h.host(HostCommand::RecordMove("e4".to_string()));
    h.host(HostCommand::RecordMove("e7e5".to_string()));
    assert_eq!(h.session.history().len(), 2);

    h.host(request(after_d4_d5));
    assert_eq!(h.moves(), [("c1f4".to_string(), "Bf4".to_string())]);
    assert_eq!(h.session.history().start_fen(), Some(after_d4_d5));
    assert_eq!(h.session.history().len(), 1);
}

#[test]
fn lost_engine_reissues_search_on_next_candidate() {
    let launcher = FakeLauncher::new(vec![
        ("A", Behavior::engine("Engine A", vec![vec![]])),
        (
            "B",
            Behavior::engine(
                "Engine B",
                vec![vec!["info depth 6 score cp 15 pv b1c3", "bestmove b1c3"]],
            ),
        ),
    ]);
    let mut h = Harness::new(launcher, &["A", "B"]);
    h.host(new_game(Persona::Master));
    h.host(request(STARTING_FEN));
    assert!(h.moves().is_empty());

    h.launcher.close("A");
    h.pump();
    let notes = h.notes();
    assert!(notes.contains(&status("engine stopped responding, switching engines")));
    assert!(notes.contains(&status("connected to Engine B")));
    assert!(notes.iter().any(|n| matches!(
        n,
        HostNotification::BotMoveChosen { san, .. } if san == "Nc3"
    )));
    assert_eq!(h.launcher.launched(), ["A", "B"]);
}

#[test]
fn request_before_handshake_waits_for_ready() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![vec!["info depth 6 score cp 15 pv e2e4", "bestmove e2e4"]],
        ),
    )]);
    let (tx, events) = mpsc::channel();
    let (notify, notes) = mpsc::channel();
    let mut session = BotSession::new(&config(&["A"]), launcher, channel_sink(tx), notify);
    let now = Instant::now();
    session.start(now);

    // The handshake reply is still queued when the host asks for a move.
    session.update(Event::Host(request(STARTING_FEN)), now);
    while let Ok(event) = events.try_recv() {
        session.update(event, now);
    }
    assert!(notes.try_iter().any(|n| matches!(n, HostNotification::BotMoveChosen { .. })));
}

#[test]
fn unavailable_engine_is_reported() {
    let launcher = FakeLauncher::new(vec![("A", Behavior::FailSpawn)]);
    let mut h = Harness::new(launcher, &["A"]);
    assert_eq!(h.notes(), [HostNotification::EngineUnavailable]);
    h.host(new_game(Persona::Club));
    h.host(request(STARTING_FEN));
    assert_eq!(h.notes(), [HostNotification::EngineUnavailable]);
}

#[test]
fn host_errors_become_status_text() {
    let launcher = FakeLauncher::new(vec![("A", Behavior::engine("Fake", vec![]))]);
    let mut h = Harness::new(launcher, &["A"]);
    h.notes();
    h.host(new_game(Persona::Club));

    h.host(HostCommand::RecordMove("e2e5".to_string()));
    assert_eq!(h.notes(), [status("illegal move: e2e5")]);

    let mated = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    h.host(request(mated));
    assert_eq!(h.notes(), [status("game is over")]);

    h.host(request("not a fen"));
    assert_eq!(h.notes(), [status("invalid position")]);

    h.host(HostCommand::NewGame {
        persona: Persona::Club,
        start_fen: Some("garbage".to_string()),
    });
    assert_eq!(h.notes(), [status("invalid start position")]);
}

#[test]
fn spawned_session_plays_a_move() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine(
            "Fake",
            vec![vec!["info depth 6 score cp 15 pv e2e4", "bestmove e2e4"]],
        ),
    )]);
    let (handle, notes) = SessionHandle::spawn(config(&["A"]), launcher).unwrap();
    handle.new_game(Persona::Master, None).unwrap();
    handle.request_bot_move(STARTING_FEN).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let chosen = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match notes.recv_timeout(remaining) {
            Ok(HostNotification::BotMoveChosen { san, .. }) => break san,
            Ok(_) => continue,
            Err(err) => panic!("no move from session: {err}"),
        }
    };
    assert_eq!(chosen, "e4");
    handle.shutdown().unwrap();
}

#[test]
fn only_connection_changes_keep_a_request_pending() {
    let launcher = FakeLauncher::new(vec![(
        "A",
        Behavior::engine("Fake", vec![vec!["bestmove (none)"]]),
    )]);
    let mut h = Harness::new(launcher, &["A"]);
    let connected = h.notes();
    assert_eq!(connected, [status("connected to Fake")]);
    assert!(connected[0].keeps_request_alive());
    assert!(status("engine stopped responding, switching engines").keeps_request_alive());

    h.host(new_game(Persona::Club));
    h.host(request(STARTING_FEN));
    let ended = h.notes();
    assert_eq!(ended, [status("engine found no legal move")]);
    assert!(!ended[0].keeps_request_alive());
    assert!(!status("illegal move: e2e5").keeps_request_alive());
    assert!(!HostNotification::EngineUnavailable.keeps_request_alive());
}
