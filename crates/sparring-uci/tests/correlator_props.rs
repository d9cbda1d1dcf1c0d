//! The correlator only ever completes the latest request of the current
//! generation, whatever order resets, requests and engine output arrive in.

use proptest::prelude::*;

use sparring_core::{CandidateLine, CoordinateMove, Score};
use sparring_uci::{BestMove, Correlator};

const FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone)]
enum Op {
    NewGame,
    Issue,
    Dispatch,
    Info(u32, i32),
    BestMove,
    EngineLost,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::NewGame),
        3 => Just(Op::Issue),
        3 => Just(Op::Dispatch),
        4 => (1u32..4, -300i32..300).prop_map(|(rank, cp)| Op::Info(rank, cp)),
        3 => Just(Op::BestMove),
        1 => Just(Op::EngineLost),
    ]
}

proptest! {
    #[test]
    fn completions_match_current_generation_and_request(ops in proptest::collection::vec(op(), 0..80)) {
        let mut c = Correlator::new();
        let mut last_issued = None;
        let mv = CoordinateMove::parse("e2e4").unwrap();

        for op in ops {
            match op {
                Op::NewGame => {
                    let before = c.generation();
                    c.new_game();
                    prop_assert_eq!(c.generation(), before + 1);
                    prop_assert!(c.active().is_none());
                    last_issued = None;
                }
                Op::Issue => {
                    let request = c.issue(FEN, 1);
                    prop_assert_eq!(request.generation, c.generation());
                    if let Some(prev) = last_issued {
                        prop_assert!(request.id > prev);
                    }
                    last_issued = Some(request.id);
                }
                Op::Dispatch => {
                    let outstanding = c.outstanding();
                    if let Some(dispatch) = c.dispatch() {
                        prop_assert_eq!(dispatch.stop_first, outstanding > 0);
                        prop_assert_eq!(c.outstanding(), outstanding + 1);
                    }
                }
                Op::Info(rank, cp) => {
                    let accepted = c.accept_line(CandidateLine::new(rank, mv, Score::Centipawns(cp)));
                    if accepted {
                        let active = c.active().map(|r| r.id);
                        prop_assert_eq!(active, last_issued);
                    }
                }
                Op::BestMove => {
                    if let Some(done) = c.accept_best_move(BestMove::Move(mv)) {
                        prop_assert_eq!(done.request.generation, c.generation());
                        prop_assert_eq!(Some(done.request.id), last_issued);
                        prop_assert!(done.lines.windows(2).all(|w| w[0].rank < w[1].rank));
                        last_issued = None;
                    }
                }
                Op::EngineLost => {
                    c.engine_lost();
                    prop_assert_eq!(c.outstanding(), 0);
                    prop_assert!(c.lines().is_empty());
                }
            }
        }
    }
}
