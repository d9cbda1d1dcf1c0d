//! The event loop shared by the bot session and the analysis client.
//!
//! An actor owns a [`TransportManager`](crate::manager::TransportManager) and
//! reacts to one channel carrying both host commands and transport events.
//! The loop blocks on that channel, waking early only for a pending
//! handshake deadline.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Instant;

use crate::transport::{EventSink, TransportEvent};

/// Input to an actor: a host command or engine output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<C> {
    Host(C),
    Transport(TransportEvent),
}

/// Sink that feeds transport events into an actor's own channel.
pub fn channel_sink<C: Send + 'static>(tx: Sender<Event<C>>) -> EventSink {
    Arc::new(move |event| {
        // The actor is gone once its receiver is dropped; nothing left to tell.
        let _ = tx.send(Event::Transport(event));
    })
}

pub(crate) trait Actor {
    type Command;

    fn start(&mut self, now: Instant);
    fn update(&mut self, event: Event<Self::Command>, now: Instant);
    fn tick(&mut self, now: Instant);
    fn deadline(&self) -> Option<Instant>;
    fn is_running(&self) -> bool;
    fn finish(&mut self);
}

/// Drive `actor` until it stops or every sender is dropped.
pub(crate) fn run<A: Actor>(mut actor: A, rx: Receiver<Event<A::Command>>) {
    actor.start(Instant::now());
    while actor.is_running() {
        let event = match actor.deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(mpsc::RecvError) => break,
            },
        };
        let now = Instant::now();
        if let Some(event) = event {
            actor.update(event, now);
        }
        // A chatty engine must not hold off its own handshake timeout.
        actor.tick(now);
    }
    actor.finish();
}
