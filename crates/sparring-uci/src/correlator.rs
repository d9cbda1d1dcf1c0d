//! Matches asynchronous engine output to the search that produced it.
//!
//! Engine output carries no request ids, so the correlator keeps a FIFO of
//! tags for searches that have been sent but not yet terminated: `info`
//! lines belong to the oldest outstanding search, and each `bestmove` ends
//! it. Output is kept only when its tag carries the current generation and
//! the id of the active request; everything else is stale and dropped.

use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use sparring_core::CandidateLine;

use crate::message::BestMove;

/// One search as issued. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub id: u64,
    pub position_fen: String,
    pub generation: u64,
    pub fullmove_number: u32,
}

/// A request ready to be written to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub request: SearchRequest,
    /// An earlier search is still running and must be stopped first.
    pub stop_first: bool,
}

/// The accepted result of the active request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSearch {
    pub request: SearchRequest,
    /// Latest line per rank, best rank first.
    pub lines: Vec<CandidateLine>,
    pub best: BestMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchTag {
    generation: u64,
    request: u64,
}

#[derive(Debug)]
struct Active {
    request: SearchRequest,
    dispatched: bool,
}

/// Tracks the active request, the generation and the searches still
/// running in the engine.
///
/// The generation only grows; output tagged with an older generation or a
/// superseded request never reaches [`Correlator::lines`] or a
/// [`CompletedSearch`].
#[derive(Debug, Default)]
pub struct Correlator {
    generation: u64,
    next_id: u64,
    active: Option<Active>,
    outstanding: VecDeque<SearchTag>,
    lines: BTreeMap<u32, CandidateLine>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The request whose output is currently accepted.
    pub fn active(&self) -> Option<&SearchRequest> {
        self.active.as_ref().map(|a| &a.request)
    }

    /// The active request if it still has to be sent.
    pub fn pending(&self) -> Option<&SearchRequest> {
        self.active
            .as_ref()
            .filter(|a| !a.dispatched)
            .map(|a| &a.request)
    }

    /// Searches sent to the engine and not yet terminated.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Lines accumulated for the active request, best rank first.
    pub fn lines(&self) -> Vec<CandidateLine> {
        self.lines.values().copied().collect()
    }

    /// Start a new game: everything in flight becomes stale.
    pub fn new_game(&mut self) {
        self.reset();
    }

    /// Advance the generation, dropping the active request and its lines.
    ///
    /// Outstanding tags are kept so the engine's remaining output for them is
    /// still consumed, then discarded.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.active = None;
        self.lines.clear();
        debug!(generation = self.generation, "generation advanced");
    }

    /// Replace the active request with a new search of `fen`.
    pub fn issue(&mut self, fen: impl Into<String>, fullmove_number: u32) -> SearchRequest {
        self.next_id += 1;
        let request = SearchRequest {
            id: self.next_id,
            position_fen: fen.into(),
            generation: self.generation,
            fullmove_number,
        };
        if let Some(old) = self.active.replace(Active {
            request: request.clone(),
            dispatched: false,
        }) {
            debug!(old = old.request.id, new = request.id, "request superseded");
        }
        self.lines.clear();
        request
    }

    /// Mark the pending request as sent.
    pub fn dispatch(&mut self) -> Option<Dispatch> {
        let active = self.active.as_mut().filter(|a| !a.dispatched)?;
        active.dispatched = true;
        let stop_first = !self.outstanding.is_empty();
        self.outstanding.push_back(SearchTag {
            generation: active.request.generation,
            request: active.request.id,
        });
        Some(Dispatch {
            request: active.request.clone(),
            stop_first,
        })
    }

    fn is_current(&self, tag: SearchTag) -> bool {
        tag.generation == self.generation
            && self.active.as_ref().is_some_and(|a| a.request.id == tag.request)
    }

    /// Store an analysis line for the oldest outstanding search if it is current.
    pub fn accept_line(&mut self, line: CandidateLine) -> bool {
        let Some(&tag) = self.outstanding.front() else {
            debug!(rank = line.rank, "analysis with no search outstanding");
            return false;
        };
        if !self.is_current(tag) {
            debug!(
                generation = tag.generation,
                request = tag.request,
                "dropping stale analysis"
            );
            return false;
        }
        self.lines.insert(line.rank, line);
        true
    }

    /// Terminate the oldest outstanding search.
    ///
    /// Returns the completed active request when the search was current.
    pub fn accept_best_move(&mut self, best: BestMove) -> Option<CompletedSearch> {
        let Some(tag) = self.outstanding.pop_front() else {
            debug!(?best, "bestmove with no search outstanding");
            return None;
        };
        if !self.is_current(tag) {
            debug!(
                generation = tag.generation,
                request = tag.request,
                "dropping stale bestmove"
            );
            return None;
        }
        let active = self.active.take()?;
        let lines = std::mem::take(&mut self.lines).into_values().collect();
        Some(CompletedSearch {
            request: active.request,
            lines,
            best,
        })
    }

    /// The engine process died: nothing outstanding will ever terminate.
    ///
    /// The active request is kept and marked unsent so it can be re-issued.
    pub fn engine_lost(&mut self) {
        self.outstanding.clear();
        self.lines.clear();
        if let Some(active) = self.active.as_mut() {
            active.dispatched = false;
        }
    }
}
