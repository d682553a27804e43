//! In-memory server and mixer
//!
//! Stand-ins for a running audio server and a sound card, for tests and for
//! running the daemon on machines without either. Both are cheap to clone;
//! clones share state, so a test can keep one copy to drive hardware events
//! while the bridge owns another.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bridgeconf::ServerConfig;

use crate::error::{MixerError, ServerError};
use crate::mixer::{MixerBackend, MixerHandle};
use crate::server::{AudioServer, ServerConnection, ServerEvents};
use crate::types::{PortDirection, PortId, PortInfo, PortKind};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ServerState {
    ports: BTreeMap<PortId, PortInfo>,
    /// Unregistered ports whose ids still resolve
    retired: BTreeMap<PortId, PortInfo>,
    next_id: u32,
    cpu_load: f32,
    sample_rate: f32,
    refuse_open: bool,
    events: Option<ServerEvents>,
    links: Vec<(String, String)>,
    opened: usize,
    closed: usize,
    abandoned: usize,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            ports: BTreeMap::new(),
            retired: BTreeMap::new(),
            next_id: 1,
            cpu_load: 0.0,
            sample_rate: 44_100.0,
            refuse_open: false,
            events: None,
            links: Vec::new(),
            opened: 0,
            closed: 0,
            abandoned: 0,
        }
    }
}

/// Fake audio server. Port changes and underruns are announced to the
/// currently open client, if any, like a real server would.
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_connections(&self, refuse: bool) {
        lock(&self.state).refuse_open = refuse;
    }

    pub fn set_cpu_load(&self, load: f32) {
        lock(&self.state).cpu_load = load;
    }

    pub fn set_sample_rate(&self, rate: f32) {
        lock(&self.state).sample_rate = rate;
    }

    /// Register a port and announce it.
    pub fn add_port(&self, port: PortInfo) -> PortId {
        let (id, events) = {
            let mut state = lock(&self.state);
            let id = PortId(state.next_id);
            state.next_id += 1;
            state.ports.insert(id, port);
            (id, state.events.clone())
        };
        // Announced outside the lock, as a server thread would
        if let Some(events) = events {
            events.port_registration(id, true);
        }
        id
    }

    /// Unregister a port and announce it. The id keeps resolving through
    /// `port_by_id` until [`FakeServer::recycle_port`].
    pub fn remove_port(&self, id: PortId) -> Option<PortInfo> {
        let (port, events) = {
            let mut state = lock(&self.state);
            let port = state.ports.remove(&id);
            if let Some(port) = &port {
                state.retired.insert(id, port.clone());
            }
            (port, state.events.clone())
        };
        if port.is_some() {
            if let Some(events) = events {
                events.port_registration(id, false);
            }
        }
        port
    }

    /// Let the server reuse a removed port's slot; its id stops resolving.
    pub fn recycle_port(&self, id: PortId) {
        lock(&self.state).retired.remove(&id);
    }

    pub fn xrun(&self) {
        let events = lock(&self.state).events.clone();
        if let Some(events) = events {
            events.xrun();
        }
    }

    /// Simulate the server dying under the open client.
    pub fn shut_down(&self) {
        let events = lock(&self.state).events.take();
        if let Some(events) = events {
            events.shutdown();
        }
    }

    /// Links made through [`ServerConnection::connect`], in order.
    pub fn links(&self) -> Vec<(String, String)> {
        lock(&self.state).links.clone()
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state).opened
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).closed
    }

    pub fn abandon_count(&self) -> usize {
        lock(&self.state).abandoned
    }
}

impl AudioServer for FakeServer {
    type Connection = FakeConnection;

    fn open(
        &self,
        config: &ServerConfig,
        events: ServerEvents,
    ) -> Result<FakeConnection, ServerError> {
        let mut state = lock(&self.state);
        if state.refuse_open {
            return Err(ServerError::Open {
                client: config.client_name.clone(),
                reason: "server not running".to_string(),
            });
        }
        state.events = Some(events);
        state.opened += 1;
        Ok(FakeConnection {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    state: Arc<Mutex<ServerState>>,
}

impl ServerConnection for FakeConnection {
    fn cpu_load(&self) -> f32 {
        lock(&self.state).cpu_load
    }

    fn sample_rate(&self) -> f32 {
        lock(&self.state).sample_rate
    }

    fn port_by_id(&self, id: PortId) -> Option<PortInfo> {
        let state = lock(&self.state);
        state.ports.get(&id).or_else(|| state.retired.get(&id)).cloned()
    }

    fn port_by_name(&self, name: &str) -> Option<PortInfo> {
        lock(&self.state)
            .ports
            .values()
            .find(|p| p.name == name)
            .cloned()
    }

    fn ports(
        &self,
        name_pattern: &str,
        kind: PortKind,
        direction: PortDirection,
        physical_only: bool,
    ) -> Vec<String> {
        lock(&self.state)
            .ports
            .values()
            .filter(|p| p.name.contains(name_pattern))
            .filter(|p| p.kind == kind && p.direction == direction)
            .filter(|p| p.physical || !physical_only)
            .map(|p| p.name.clone())
            .collect()
    }

    fn connect(&self, from: &str, to: &str) -> Result<(), ServerError> {
        let mut state = lock(&self.state);
        let known = |name: &str| state.ports.values().any(|p| p.name == name);
        if !known(from) || !known(to) {
            return Err(ServerError::Connect {
                from: from.to_string(),
                to: to.to_string(),
                reason: "no such port".to_string(),
            });
        }
        let link = (from.to_string(), to.to_string());
        if !state.links.contains(&link) {
            state.links.push(link);
        }
        Ok(())
    }

    fn disconnect(&self, from: &str, to: &str) -> Result<(), ServerError> {
        let mut state = lock(&self.state);
        let before = state.links.len();
        state.links.retain(|(a, b)| !(a == from && b == to));
        if state.links.len() == before {
            return Err(ServerError::Disconnect {
                from: from.to_string(),
                to: to.to_string(),
                reason: "not connected".to_string(),
            });
        }
        Ok(())
    }

    fn close(self) -> Result<(), ServerError> {
        let mut state = lock(&self.state);
        state.events = None;
        state.closed += 1;
        Ok(())
    }

    fn abandon(self) {
        lock(&self.state).abandoned += 1;
    }
}

#[derive(Debug, Default)]
struct MixerState {
    /// What the mixer handle currently reports
    visible: HashMap<String, bool>,
    /// Hardware changes not yet picked up by `handle_events`
    pending: Vec<(String, bool)>,
    refuse_open: bool,
    fail_writes: bool,
    opened: usize,
    closed: usize,
    writes: usize,
}

/// Fake sound card with named boolean switches.
#[derive(Debug, Clone, Default)]
pub struct FakeMixer {
    state: Arc<Mutex<MixerState>>,
}

impl FakeMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_switches(switches: &[(&str, bool)]) -> Self {
        let mixer = Self::new();
        {
            let mut state = lock(&mixer.state);
            for (name, value) in switches {
                state.visible.insert(name.to_string(), *value);
            }
        }
        mixer
    }

    /// Flip a switch from outside (front-panel footswitch, another process).
    /// Readers see it after their next `handle_events`.
    pub fn toggle_external(&self, name: &str, on: bool) {
        lock(&self.state).pending.push((name.to_string(), on));
    }

    pub fn refuse_open(&self, refuse: bool) {
        lock(&self.state).refuse_open = refuse;
    }

    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Current value as the hardware has it, pending changes included.
    pub fn value(&self, name: &str) -> Option<bool> {
        let state = lock(&self.state);
        state
            .pending
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .or_else(|| state.visible.get(name).copied())
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state).opened
    }

    pub fn close_count(&self) -> usize {
        lock(&self.state).closed
    }

    pub fn write_count(&self) -> usize {
        lock(&self.state).writes
    }
}

impl MixerBackend for FakeMixer {
    type Handle = FakeMixerHandle;

    fn open(&self, card: &str) -> Result<FakeMixerHandle, MixerError> {
        let mut state = lock(&self.state);
        if state.refuse_open {
            return Err(MixerError::Open {
                card: card.to_string(),
                reason: "no such card".to_string(),
            });
        }
        state.opened += 1;
        Ok(FakeMixerHandle {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct FakeMixerHandle {
    state: Arc<Mutex<MixerState>>,
}

impl MixerHandle for FakeMixerHandle {
    fn has_switch(&self, name: &str) -> bool {
        lock(&self.state).visible.contains_key(name)
    }

    fn handle_events(&mut self) -> Result<(), MixerError> {
        let mut state = lock(&self.state);
        let pending = std::mem::take(&mut state.pending);
        for (name, value) in pending {
            if let Some(slot) = state.visible.get_mut(&name) {
                *slot = value;
            }
        }
        Ok(())
    }

    fn read_switch(&self, name: &str) -> Result<bool, MixerError> {
        lock(&self.state)
            .visible
            .get(name)
            .copied()
            .ok_or_else(|| MixerError::ControlNotFound(name.to_string()))
    }

    fn write_switch(&mut self, name: &str, on: bool) -> Result<(), MixerError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(MixerError::Write {
                control: name.to_string(),
                reason: "I/O error".to_string(),
            });
        }
        let slot = state
            .visible
            .get_mut(name)
            .ok_or_else(|| MixerError::ControlNotFound(name.to_string()))?;
        *slot = on;
        state.writes += 1;
        Ok(())
    }
}

impl Drop for FakeMixerHandle {
    fn drop(&mut self) {
        lock(&self.state).closed += 1;
    }
}
