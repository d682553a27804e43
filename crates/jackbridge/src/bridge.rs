//! Lifecycle controller and poll entry point
//!
//! [`Bridge`] owns the server connection, the optional bypass mixer, and the
//! caller's callbacks. The UI calls [`Bridge::poll`] at a fixed interval from a
//! single thread; everything the server reports asynchronously in between is
//! picked up there and handed to the callbacks before `poll` returns.
//! Hardware MIDI ports are reported when they go away, so the UI can drop
//! devices that were unplugged.
//!
//! Without a server connection every query degrades to a safe default
//! (zero health, default sample rate, no ports) instead of failing.

use std::sync::Arc;

use bridgeconf::BridgeConfig;
use tracing::{debug, info, warn};

use crate::bypass::BypassDetector;
use crate::error::BridgeError;
use crate::filter::hardware_midi_ports;
use crate::health;
use crate::mixer::{MixerBackend, MixerHandle};
use crate::server::{AudioServer, EventInbox, ServerConnection, ServerEvents};
use crate::types::{BypassState, Channel, HardwareSide, HealthSnapshot, PortId, PortKind};

/// Called with `(name, alias)` for each hardware MIDI port removed since the
/// previous poll. `alias` is empty when the port has none.
pub type MidiPortDeletedCallback = Box<dyn FnMut(&str, &str) + Send + 'static>;

/// Called with both relay positions when either one changed.
pub type BypassCallback = Box<dyn FnMut(BypassState) + Send + 'static>;

struct Live<C> {
    connection: C,
    inbox: Arc<EventInbox>,
}

pub struct Bridge<S: AudioServer, M: MixerBackend> {
    server: S,
    mixer_backend: M,
    config: BridgeConfig,
    live: Option<Live<S::Connection>>,
    mixer: Option<M::Handle>,
    bypass: BypassDetector,
    /// Reused drain target so polls don't allocate
    drained: Vec<PortId>,
    /// Backing storage for the last `hardware_ports` answer
    port_list: Vec<String>,
    on_midi_port_deleted: Option<MidiPortDeletedCallback>,
    on_bypass: Option<BypassCallback>,
}

impl<S: AudioServer, M: MixerBackend> Bridge<S, M> {
    pub fn new(server: S, mixer_backend: M, config: BridgeConfig) -> Self {
        Self {
            server,
            mixer_backend,
            config,
            live: None,
            mixer: None,
            bypass: BypassDetector::unresolved(),
            drained: Vec::new(),
            port_list: Vec::new(),
            on_midi_port_deleted: None,
            on_bypass: None,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Open the bypass mixer (if not open yet) and the server connection
    /// (if not live yet).
    ///
    /// Only a server failure is an error. Without a mixer the bridge runs
    /// with bypass control unsupported.
    pub fn connect(&mut self) -> Result<(), BridgeError> {
        self.open_mixer();
        self.reap_shutdown();

        if self.live.is_some() {
            info!("server client activated before, nothing to do");
            return Ok(());
        }

        let inbox = Arc::new(EventInbox::new(self.on_midi_port_deleted.is_some()));
        let events = ServerEvents::new(Arc::clone(&inbox));
        let connection = self.server.open(&self.config.server, events)?;

        self.live = Some(Live { connection, inbox });
        info!(client = %self.config.server.client_name, "server client activated");
        Ok(())
    }

    fn open_mixer(&mut self) {
        if self.mixer.is_some() || !self.config.mixer.enabled {
            return;
        }

        match self.mixer_backend.open(&self.config.mixer.card) {
            Ok(handle) => {
                self.bypass = BypassDetector::baseline(&handle, &self.config.mixer);
                debug!(
                    card = %self.config.mixer.card,
                    left = self.bypass.control(Channel::Left).is_some(),
                    right = self.bypass.control(Channel::Right).is_some(),
                    "bypass mixer opened"
                );
                self.mixer = Some(handle);
            }
            Err(e) => {
                warn!("bypass control unsupported: {e}");
                self.bypass = BypassDetector::unresolved();
            }
        }
    }

    /// Release everything: pending port list, mixer, then the server client.
    /// Safe to call at any time, including repeatedly.
    pub fn disconnect(&mut self) {
        self.port_list = Vec::new();
        self.drained = Vec::new();

        if let Some(handle) = self.mixer.take() {
            drop(handle);
            self.bypass = BypassDetector::unresolved();
            debug!("bypass mixer closed");
        }

        self.reap_shutdown();

        let Some(live) = self.live.take() else {
            info!("server client not active, nothing to release");
            return;
        };

        live.inbox.registrations().clear();
        if let Err(e) = live.connection.close() {
            warn!("closing server client: {e}");
        }
        info!("server client deactivated");
    }

    /// Drop a connection the server already shut down.
    fn reap_shutdown(&mut self) {
        if !self.live.as_ref().is_some_and(|l| l.inbox.is_shut_down()) {
            return;
        }
        if let Some(live) = self.live.take() {
            live.connection.abandon();
            warn!("server went away, client released");
        }
    }

    /// The connection, unless absent or shut down by the server.
    fn connection(&self) -> Option<&S::Connection> {
        self.live
            .as_ref()
            .filter(|l| !l.inbox.is_shut_down())
            .map(|l| &l.connection)
    }

    pub fn is_connected(&self) -> bool {
        self.connection().is_some()
    }

    pub fn has_mixer(&self) -> bool {
        self.mixer.is_some()
    }

    /// Install or clear both callbacks.
    ///
    /// With a deletion callback present only port removals are queued. Events
    /// queued before it was installed are discarded, since registrations and
    /// removals can't be told apart once queued.
    pub fn register_callbacks(
        &mut self,
        on_midi_port_deleted: Option<MidiPortDeletedCallback>,
        on_bypass: Option<BypassCallback>,
    ) {
        self.on_midi_port_deleted = on_midi_port_deleted;
        self.on_bypass = on_bypass;

        if let Some(live) = &self.live {
            let consumer = self.on_midi_port_deleted.is_some();
            live.inbox.set_deletion_consumer(consumer);
            if consumer {
                live.inbox.registrations().clear();
            }
        }
    }

    /// One refresh cycle: report removed hardware MIDI ports, report bypass
    /// changes, and return current health.
    pub fn poll(&mut self) -> HealthSnapshot {
        self.reap_shutdown();

        let Self {
            live,
            drained,
            on_midi_port_deleted,
            mixer,
            bypass,
            on_bypass,
            ..
        } = self;

        // The shutdown flag is read once; a shutdown landing after this point
        // is picked up by the next poll.
        let live = live.as_ref().filter(|l| !l.inbox.is_shut_down());

        let snapshot = match live {
            Some(live) => {
                live.inbox.registrations().drain_into(drained);
                match on_midi_port_deleted.as_mut() {
                    Some(callback) => {
                        for port in hardware_midi_ports(&live.connection, drained) {
                            callback(&port.name, &port.alias);
                        }
                    }
                    None if !drained.is_empty() => {
                        debug!(count = drained.len(), "no port deletion callback, dropping");
                    }
                    None => {}
                }
                drained.clear();

                health::assemble(Some(&live.connection), live.inbox.xruns())
            }
            None => HealthSnapshot::unavailable(),
        };

        if let Some(handle) = mixer.as_mut() {
            if let Some(state) = bypass.detect(handle) {
                debug!(left = state.left, right = state.right, "bypass changed");
                if let Some(callback) = on_bypass.as_mut() {
                    callback(state);
                }
            }
        }

        snapshot
    }

    /// Server sample rate, or the configured default without a connection.
    pub fn sample_rate(&self) -> f32 {
        self.connection()
            .map(|c| c.sample_rate())
            .unwrap_or(self.config.server.default_sample_rate)
    }

    /// First alias of the named port.
    pub fn port_alias(&self, name: &str) -> Option<String> {
        let port = self.connection()?.port_by_name(name)?;
        port.aliases.into_iter().next()
    }

    /// Physical ports of `kind` on the given hardware side whose names match
    /// the configured hardware pattern. `None` when disconnected or when
    /// there are none.
    ///
    /// The slice lives in the bridge and is replaced by the next call.
    pub fn hardware_ports(&mut self, kind: PortKind, side: HardwareSide) -> Option<&[String]> {
        let ports = match self.connection() {
            Some(connection) => connection.ports(
                &self.config.ports.hardware_pattern,
                kind,
                side.port_direction(),
                true,
            ),
            None => Vec::new(),
        };
        self.port_list = ports;

        if self.port_list.is_empty() {
            None
        } else {
            Some(&self.port_list)
        }
    }

    pub fn has_serial_midi_input(&self) -> bool {
        self.port_exists(&self.config.ports.serial_midi_input)
    }

    pub fn has_serial_midi_output(&self) -> bool {
        self.port_exists(&self.config.ports.serial_midi_output)
    }

    fn port_exists(&self, name: &str) -> bool {
        self.connection()
            .is_some_and(|c| c.port_by_name(name).is_some())
    }

    /// Link two ports. Does nothing without a connection; failures are logged.
    pub fn connect_ports(&self, from: &str, to: &str) {
        if let Some(connection) = self.connection() {
            if let Err(e) = connection.connect(from, to) {
                debug!("{e}");
            }
        }
    }

    /// Unlink two ports. Does nothing without a connection; failures are logged.
    pub fn disconnect_ports(&self, from: &str, to: &str) {
        if let Some(connection) = self.connection() {
            if let Err(e) = connection.disconnect(from, to) {
                debug!("{e}");
            }
        }
    }

    /// Relay position as of the last poll.
    pub fn bypass(&self, channel: Channel) -> bool {
        self.bypass.cached(channel)
    }

    pub fn bypass_state(&self) -> BypassState {
        self.bypass.state()
    }

    /// Drive a relay. The cached position is left alone; the next poll
    /// observes the write and reports it like any other change.
    pub fn set_bypass(&mut self, channel: Channel, on: bool) -> Result<(), BridgeError> {
        let handle = self.mixer.as_mut().ok_or(BridgeError::MixerUnavailable)?;
        let control = self
            .bypass
            .control(channel)
            .ok_or(BridgeError::ControlMissing(channel))?;

        handle
            .write_switch(control, on)
            .map_err(BridgeError::SwitchWrite)
    }
}

impl<S: AudioServer, M: MixerBackend> Drop for Bridge<S, M> {
    fn drop(&mut self) {
        if self.live.is_some() || self.mixer.is_some() {
            self.disconnect();
        }
    }
}
