//! Scripted in-process stand-in for engine binaries.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use sparring_uci::{
    EngineCandidate, EngineCommand, EngineLink, EventSink, InstanceId, Launcher, TransportError,
    TransportEvent,
};

/// How a fake candidate behaves.
#[derive(Clone)]
pub enum Behavior {
    /// Launch fails outright.
    FailSpawn,
    /// Starts but never answers anything.
    Silent,
    /// Completes the handshake and answers each `go` with the next script.
    Engine {
        name: String,
        searches: Arc<Mutex<VecDeque<Vec<String>>>>,
    },
}

impl Behavior {
    pub fn engine(name: &str, searches: Vec<Vec<&str>>) -> Self {
        Behavior::Engine {
            name: name.to_string(),
            searches: Arc::new(Mutex::new(
                searches
                    .into_iter()
                    .map(|lines| lines.into_iter().map(str::to_string).collect())
                    .collect(),
            )),
        }
    }
}

#[derive(Default)]
struct Shared {
    launched: Vec<String>,
    sent: Vec<(String, String)>,
    sinks: Vec<(String, InstanceId, EventSink)>,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    behaviors: HashMap<String, Behavior>,
    shared: Arc<Mutex<Shared>>,
}

impl FakeLauncher {
    pub fn new(behaviors: Vec<(&str, Behavior)>) -> Self {
        Self {
            behaviors: behaviors
                .into_iter()
                .map(|(name, b)| (name.to_string(), b))
                .collect(),
            shared: Arc::default(),
        }
    }

    /// Candidates in the order given to `new`.
    pub fn candidates(names: &[&str]) -> Vec<EngineCandidate> {
        names
            .iter()
            .map(|name| EngineCandidate {
                name: name.to_string(),
                path: format!("/fake/{name}").into(),
                args: Vec::new(),
            })
            .collect()
    }

    /// Candidate names in launch order, failed launches included.
    pub fn launched(&self) -> Vec<String> {
        self.shared.lock().unwrap().launched.clone()
    }

    /// Command lines sent to `name`, in order.
    pub fn sent_to(&self, name: &str) -> Vec<String> {
        self.shared
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(to, _)| to == name)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Emit a line as if the latest process of `name` printed it.
    pub fn emit(&self, name: &str, line: &str) {
        let (instance, sink) = self.latest(name);
        sink(TransportEvent::Line {
            instance,
            line: line.to_string(),
        });
    }

    /// Close the latest process of `name`.
    pub fn close(&self, name: &str) {
        let (instance, sink) = self.latest(name);
        sink(TransportEvent::Closed {
            instance,
            reason: "fake engine exited".to_string(),
        });
    }

    fn latest(&self, name: &str) -> (InstanceId, EventSink) {
        let shared = self.shared.lock().unwrap();
        let (_, instance, sink) = shared
            .sinks
            .iter()
            .rev()
            .find(|(n, _, _)| n == name)
            .expect("engine was launched");
        (*instance, Arc::clone(sink))
    }
}

impl Launcher for FakeLauncher {
    fn launch(
        &mut self,
        candidate: &EngineCandidate,
        instance: InstanceId,
        sink: EventSink,
    ) -> Result<Box<dyn EngineLink>, TransportError> {
        let name = candidate.name.clone();
        let behavior = self.behaviors.get(&name).cloned().unwrap_or(Behavior::Silent);
        let mut shared = self.shared.lock().unwrap();
        shared.launched.push(name.clone());
        if let Behavior::FailSpawn = behavior {
            return Err(TransportError::Spawn {
                path: candidate.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such engine"),
            });
        }
        shared.sinks.push((name.clone(), instance, Arc::clone(&sink)));
        Ok(Box::new(FakeLink {
            name,
            instance,
            sink,
            behavior,
            shared: Arc::clone(&self.shared),
            alive: true,
        }))
    }
}

struct FakeLink {
    name: String,
    instance: InstanceId,
    sink: EventSink,
    behavior: Behavior,
    shared: Arc<Mutex<Shared>>,
    alive: bool,
}

impl FakeLink {
    fn say(&self, line: &str) {
        (self.sink)(TransportEvent::Line {
            instance: self.instance,
            line: line.to_string(),
        });
    }
}

impl EngineLink for FakeLink {
    fn send(&mut self, command: &EngineCommand) -> Result<(), TransportError> {
        if !self.alive {
            return Err(TransportError::NotRunning);
        }
        self.shared
            .lock()
            .unwrap()
            .sent
            .push((self.name.clone(), command.to_string()));

        let Behavior::Engine { name, searches } = &self.behavior else {
            return Ok(());
        };
        match command {
            EngineCommand::Uci => {
                self.say(&format!("id name {name}"));
                self.say("uciok");
            }
            EngineCommand::IsReady => self.say("readyok"),
            EngineCommand::Go { .. } => {
                let script = searches.lock().unwrap().pop_front().unwrap_or_default();
                for line in &script {
                    self.say(line);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn terminate(&mut self) {
        self.alive = false;
    }
}

/// Collecting sink for driving a manager by hand.
pub fn collecting_sink() -> (EventSink, Arc<Mutex<Vec<TransportEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    let sink: EventSink = Arc::new(move |event| seen.lock().unwrap().push(event));
    (sink, events)
}
