// Shared fakes for the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::StreamExt;
use lume_swipe::models::{CurrentUser, InitialProfiles, MatchEvent, Profile, SwipeRequest};
use lume_swipe::services::{
    DecisionRecorder, EventStream, EventTransport, ProfileSource, RecordError, SourceError,
    TransportError,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn profile(id: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: format!("Dev {}", id),
        avatar: format!("https://avatars.test/{}.png", id),
        bio: format!("Bio of {}", id),
    }
}

pub fn user(id: &str) -> CurrentUser {
    CurrentUser {
        id: id.to_string(),
        name: format!("User {}", id),
        avatar: String::new(),
    }
}

pub fn matched(id: &str) -> MatchEvent {
    MatchEvent::new(profile(id))
}

/// Wait until the watched value satisfies `pred`, failing the test on timeout
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F)
where
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("watch sender dropped");
}

/// Recorder that logs every call as soon as it starts
#[derive(Default)]
pub struct ScriptedRecorder {
    calls: Mutex<Vec<SwipeRequest>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl ScriptedRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Calls targeting `target_id` fail with a 500
    pub fn fail_on(&self, target_id: &str) {
        self.failing.lock().unwrap().insert(target_id.to_string());
    }

    /// Calls targeting `target_id` panic inside the recorder
    pub fn panic_on(&self, target_id: &str) {
        self.panicking.lock().unwrap().insert(target_id.to_string());
    }

    /// Calls targeting `target_id` hang until the returned handle is notified
    pub fn hold(&self, target_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(target_id.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<SwipeRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_targets(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.target_id).collect()
    }
}

#[async_trait]
impl DecisionRecorder for ScriptedRecorder {
    async fn record(&self, request: &SwipeRequest) -> Result<(), RecordError> {
        self.calls.lock().unwrap().push(request.clone());

        let explode = self.panicking.lock().unwrap().contains(&request.target_id);
        if explode {
            panic!("recorder blew up on {}", request.target_id);
        }

        let gate = self.gates.lock().unwrap().get(&request.target_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(&request.target_id) {
            return Err(RecordError::Rejected { status: 500 });
        }
        Ok(())
    }
}

pub struct StaticSource {
    pub user: CurrentUser,
    pub candidates: Vec<Profile>,
}

#[async_trait]
impl ProfileSource for StaticSource {
    async fn fetch_initial(&self, identity: &str) -> Result<InitialProfiles, SourceError> {
        if identity != self.user.id {
            return Err(SourceError::NotFound(identity.to_string()));
        }
        Ok(InitialProfiles {
            user: self.user.clone(),
            candidates: self.candidates.clone(),
        })
    }
}

type Feed = mpsc::UnboundedSender<Result<MatchEvent, TransportError>>;

#[derive(Default)]
struct MemoryState {
    connects: Vec<String>,
    failures_left: u32,
    refuse_all: bool,
    live: Option<Feed>,
}

/// In-process push transport driven by the test
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `n` connect attempts fail
    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().failures_left = n;
    }

    /// Every connect attempt fails until switched off again
    pub fn refuse_all(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_all = refuse;
    }

    pub fn push(&self, event: MatchEvent) -> bool {
        match &self.state.lock().unwrap().live {
            Some(feed) => feed.send(Ok(event)).is_ok(),
            None => false,
        }
    }

    /// End the live connection as if the socket dropped
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().live.take();
    }

    /// Inject a transport error on the live connection
    pub fn break_connection(&self) {
        if let Some(feed) = self.state.lock().unwrap().live.take() {
            let _ = feed.send(Err(TransportError::Protocol("connection reset".into())));
        }
    }

    pub fn connects(&self) -> Vec<String> {
        self.state.lock().unwrap().connects.clone()
    }
}

#[async_trait]
impl EventTransport for MemoryTransport {
    async fn connect(&self, identity: &str) -> Result<EventStream, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.connects.push(identity.to_string());

        if state.refuse_all {
            return Err(TransportError::Connect("refused".into()));
        }
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(TransportError::Connect("refused".into()));
        }

        let (feed, rx) = mpsc::unbounded_channel();
        state.live = Some(feed);
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}
