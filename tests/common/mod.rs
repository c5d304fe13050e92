//! Shared test doubles for the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use kodegen_media_keys::control::TransportFactory;
use kodegen_media_keys::host::{AgentDispatcher, NotificationPresenter};
use kodegen_media_keys::{
    AgentId, AgentMessage, MediaKeysError, Notification, NotificationKey, Result, Transport,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Dispatcher
// ============================================================================

/// One delivered agent message
#[derive(Debug, Clone)]
pub struct Delivery {
    pub agent: AgentId,
    pub message: AgentMessage,
    pub at: Instant,
}

/// Records every dispatch; agents in `failing` reject delivery
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    deliveries: Mutex<Vec<Delivery>>,
    failing: Mutex<HashSet<AgentId>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, agent: &str) {
        self.failing.lock().insert(AgentId::from(agent));
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// `(agent, action)` pairs in delivery order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.deliveries
            .lock()
            .iter()
            .map(|d| (d.agent.to_string(), d.message.action.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }
}

impl AgentDispatcher for RecordingDispatcher {
    fn dispatch(&self, agent: &AgentId, message: &AgentMessage) -> Result<()> {
        if self.failing.lock().contains(agent) {
            return Err(MediaKeysError::dispatch(agent.clone(), "agent closed"));
        }
        self.deliveries.lock().push(Delivery {
            agent: agent.clone(),
            message: message.clone(),
            at: Instant::now(),
        });
        Ok(())
    }
}

// ============================================================================
// Presenter
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Notify(NotificationKey, Notification),
    Clear(NotificationKey),
}

#[derive(Debug, Default)]
pub struct RecordingPresenter {
    calls: Mutex<Vec<(Shown, Instant)>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<(Shown, Instant)> {
        self.calls.lock().clone()
    }

    pub fn notify_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(call, _)| matches!(call, Shown::Notify(..)))
            .count()
    }

    pub fn clears(&self) -> Vec<(NotificationKey, Instant)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|(call, at)| match call {
                Shown::Clear(key) => Some((key.clone(), *at)),
                Shown::Notify(..) => None,
            })
            .collect()
    }
}

impl NotificationPresenter for RecordingPresenter {
    fn notify(&self, key: &NotificationKey, notification: &Notification) -> Result<()> {
        self.calls.lock().push((
            Shown::Notify(key.clone(), notification.clone()),
            Instant::now(),
        ));
        Ok(())
    }

    fn clear(&self, key: &NotificationKey) -> Result<()> {
        self.calls
            .lock()
            .push((Shown::Clear(key.clone()), Instant::now()));
        Ok(())
    }
}

// ============================================================================
// Control peer
// ============================================================================

#[derive(Debug, Default)]
struct PeerState {
    fail_connect: bool,
    connects: usize,
    closes: usize,
    writes: Vec<String>,
    inbound: Option<mpsc::UnboundedSender<Result<Value>>>,
}

/// In-process stand-in for the native messaging host
#[derive(Debug, Clone, Default)]
pub struct MockPeer {
    state: Arc<Mutex<PeerState>>,
}

impl MockPeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory handing out transports connected to this peer
    pub fn factory(&self) -> TransportFactory<MockTransport> {
        let state = Arc::clone(&self.state);
        Arc::new(move || {
            Ok::<_, MediaKeysError>(MockTransport {
                state: Arc::clone(&state),
                connected: false,
            })
        })
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    pub fn writes(&self) -> Vec<String> {
        self.state.lock().writes.clone()
    }

    /// Messages written by the bridge, decoded
    pub fn messages(&self) -> Vec<Value> {
        self.writes()
            .iter()
            .map(|w| serde_json::from_str(w).expect("bridge wrote invalid JSON"))
            .collect()
    }

    /// `command` field of every written message
    pub fn commands(&self) -> Vec<String> {
        self.messages()
            .iter()
            .map(|m| m["command"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// Simulate the host exiting: its message stream ends
    pub fn hang_up(&self) {
        self.state.lock().inbound = None;
    }

    /// Deliver a message from the peer to the bridge
    pub fn send(&self, value: Value) -> bool {
        match &self.state.lock().inbound {
            Some(tx) => tx.send(Ok(value)).is_ok(),
            None => false,
        }
    }
}

pub struct MockTransport {
    state: Arc<Mutex<PeerState>>,
    connected: bool,
}

impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_connect {
            return Err(MediaKeysError::host_not_found("mock host missing"));
        }
        state.connects += 1;
        self.connected = true;
        Ok(())
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.connected {
            return Err(MediaKeysError::connection("Transport is not ready for writing"));
        }
        self.state.lock().writes.push(data.to_string());
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<Value>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().inbound = Some(tx);
        rx
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.closes += 1;
        state.inbound = None;
        self.connected = false;
        Ok(())
    }
}
