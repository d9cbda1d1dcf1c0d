//! Persona move selection over ranked candidate lines.
//!
//! Every persona shares the same emergency rule: when the position is in
//! danger, or the persona is already in rescue mode, it plays the top line.
//! Outside of that the selection style in its [`PersonaConfig`] decides.

use rand::Rng;
use rand::seq::SliceRandom;

use sparring_core::CandidateLine;

use crate::config::{PersonaConfig, SelectionStyle};
use crate::state::{PersonaState, RescueTransition};

/// The outcome of one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub chosen: CandidateLine,
    /// Top line is a forced mate against the persona.
    pub mate_threat: bool,
    /// Ordered-scale value of the top line.
    pub best_score: i32,
    /// The position met a danger condition.
    pub in_danger: bool,
    pub transition: RescueTransition,
}

/// True when the persona should stop holding back.
pub fn in_danger(config: &PersonaConfig, best: &CandidateLine, material: i32) -> bool {
    best.is_losing_mate()
        || best.value() <= config.danger_floor_cp
        || material <= -config.danger_material_deficit
}

/// Choose a line for the persona described by `config`.
///
/// `lines` must be ordered best first. `material` is the mover's material
/// balance in pawns. Returns `None` only for an empty line set.
pub fn decide<R: Rng + ?Sized>(
    config: &PersonaConfig,
    lines: &[CandidateLine],
    material: i32,
    state: &PersonaState,
    rng: &mut R,
) -> Option<Decision> {
    let best = *lines.first()?;
    let danger = in_danger(config, &best, material);

    let transition = match (danger, state.rescue_active) {
        (true, false) => RescueTransition::Enter,
        (false, true) if best.value() > config.recovery_cp => RescueTransition::Exit,
        _ => RescueTransition::Stay,
    };

    let chosen = if danger || state.rescue_active {
        best
    } else {
        match config.selection {
            SelectionStyle::Blunder { min_drop, max_drop } => {
                pick_blunder(lines, &best, min_drop, max_drop, rng)
            }
            SelectionStyle::Banded {
                primary_probability,
                primary_max_drop,
                wide_max_drop,
                absolute_ceiling,
            } => pick_banded(
                lines,
                &best,
                chance(rng, primary_probability),
                primary_max_drop,
                wide_max_drop,
                absolute_ceiling,
                rng,
            ),
            SelectionStyle::Precise {
                substitute_probability,
                max_drop,
            } => {
                if chance(rng, substitute_probability) {
                    pick_alternate(lines, &best, max_drop, rng).unwrap_or(best)
                } else {
                    best
                }
            }
        }
    };

    Some(Decision {
        chosen,
        mate_threat: best.is_losing_mate(),
        best_score: best.value(),
        in_danger: danger,
        transition,
    })
}

/// Bernoulli draw that tolerates out-of-range probabilities.
fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.r#gen::<f64>() < probability
}

fn pick_uniform<R: Rng + ?Sized>(pool: &[&CandidateLine], rng: &mut R) -> Option<CandidateLine> {
    pool.choose(rng).map(|line| **line)
}

/// Uniform pick among alternates to `best` within `max_drop` that are not losing mates.
fn pick_alternate<R: Rng + ?Sized>(
    lines: &[CandidateLine],
    best: &CandidateLine,
    max_drop: i32,
    rng: &mut R,
) -> Option<CandidateLine> {
    let pool: Vec<&CandidateLine> = lines
        .iter()
        .filter(|l| l.rank != best.rank && !l.is_losing_mate() && l.drop_from(best) <= max_drop)
        .collect();
    pick_uniform(&pool, rng)
}

/// Never returns a line trailing `best` by more than `max_drop`.
fn pick_blunder<R: Rng + ?Sized>(
    lines: &[CandidateLine],
    best: &CandidateLine,
    min_drop: i32,
    max_drop: i32,
    rng: &mut R,
) -> CandidateLine {
    let window: Vec<&CandidateLine> = lines
        .iter()
        .filter(|l| {
            let drop = l.drop_from(best);
            !l.is_losing_mate() && drop >= min_drop && drop <= max_drop
        })
        .collect();
    pick_uniform(&window, rng)
        .or_else(|| pick_alternate(lines, best, max_drop, rng))
        .unwrap_or(*best)
}

fn pick_banded<R: Rng + ?Sized>(
    lines: &[CandidateLine],
    best: &CandidateLine,
    primary: bool,
    primary_max_drop: i32,
    wide_max_drop: i32,
    absolute_ceiling: i32,
    rng: &mut R,
) -> CandidateLine {
    let band = if primary { primary_max_drop } else { wide_max_drop };
    let pool: Vec<&CandidateLine> = lines.iter().filter(|l| l.drop_from(best) <= band).collect();
    let pick = pick_uniform(&pool, rng).unwrap_or(*best);
    if !pick.is_losing_mate() && pick.drop_from(best) <= absolute_ceiling {
        return pick;
    }

    let tight: Vec<&CandidateLine> = lines
        .iter()
        .filter(|l| !l.is_losing_mate() && l.drop_from(best) <= primary_max_drop)
        .collect();
    pick_uniform(&tight, rng).unwrap_or(*best)
}
