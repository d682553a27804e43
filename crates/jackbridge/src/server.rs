//! Audio server seam
//!
//! [`AudioServer`] opens a client connection; the backend reports its
//! asynchronous notifications through the [`ServerEvents`] handle it is given.
//! Those notifications land in an [`EventInbox`] that the poll thread reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridgeconf::ServerConfig;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::health::XrunCounter;
use crate::registration::RegistrationBuffer;
use crate::types::{PortDirection, PortId, PortInfo, PortKind};

/// Opens connections to an audio server.
pub trait AudioServer {
    type Connection: ServerConnection;

    /// Open and activate a client. `events` must receive the server's port
    /// registration, underrun and shutdown notifications for the lifetime of
    /// the returned connection.
    fn open(
        &self,
        config: &ServerConfig,
        events: ServerEvents,
    ) -> Result<Self::Connection, ServerError>;
}

/// A live, activated client.
pub trait ServerConnection {
    /// DSP load estimate in percent.
    fn cpu_load(&self) -> f32;

    fn sample_rate(&self) -> f32;

    /// Describe a port by id. A port whose unregistration was just announced
    /// still resolves until the server recycles its slot; `None` after that.
    fn port_by_id(&self, id: PortId) -> Option<PortInfo>;

    fn port_by_name(&self, name: &str) -> Option<PortInfo>;

    /// Names of ports whose name matches `name_pattern`, of the given kind and
    /// direction, optionally restricted to physical ports.
    fn ports(
        &self,
        name_pattern: &str,
        kind: PortKind,
        direction: PortDirection,
        physical_only: bool,
    ) -> Vec<String>;

    fn connect(&self, from: &str, to: &str) -> Result<(), ServerError>;

    fn disconnect(&self, from: &str, to: &str) -> Result<(), ServerError>;

    /// Deactivate and close the client.
    fn close(self) -> Result<(), ServerError>;

    /// Release a client whose server already shut it down.
    fn abandon(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// State shared between the server's notification thread and the poll thread.
#[derive(Debug, Default)]
pub struct EventInbox {
    registrations: RegistrationBuffer,
    xruns: XrunCounter,
    shut_down: AtomicBool,
    deletion_consumer: AtomicBool,
}

impl EventInbox {
    pub fn new(deletion_consumer: bool) -> Self {
        let inbox = Self::default();
        inbox.set_deletion_consumer(deletion_consumer);
        inbox
    }

    pub fn registrations(&self) -> &RegistrationBuffer {
        &self.registrations
    }

    pub fn xruns(&self) -> &XrunCounter {
        &self.xruns
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn set_deletion_consumer(&self, present: bool) {
        self.deletion_consumer.store(present, Ordering::Release);
    }

    pub fn has_deletion_consumer(&self) -> bool {
        self.deletion_consumer.load(Ordering::Acquire)
    }
}

/// Handle a backend invokes from its notification thread.
///
/// None of these methods block beyond a short mutex hold, and none of them
/// call back into the server.
#[derive(Debug, Clone)]
pub struct ServerEvents {
    inbox: Arc<EventInbox>,
}

impl ServerEvents {
    pub fn new(inbox: Arc<EventInbox>) -> Self {
        Self { inbox }
    }

    /// A port appeared (`registered == true`) or went away.
    ///
    /// With a deletion consumer present only removals are queued.
    pub fn port_registration(&self, id: PortId, registered: bool) {
        if registered && self.inbox.has_deletion_consumer() {
            return;
        }
        self.inbox.registrations.push(id);
    }

    pub fn xrun(&self) {
        self.inbox.xruns.record();
        debug!("server reported an xrun");
    }

    /// The server is going away without being asked to.
    pub fn shutdown(&self) {
        self.inbox.shut_down.store(true, Ordering::Release);
        warn!("audio server shut the client down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drained(inbox: &EventInbox) -> Vec<PortId> {
        let mut out = Vec::new();
        inbox.registrations().drain_into(&mut out);
        out
    }

    #[test]
    fn test_only_removals_queued_while_consumer_present() {
        let inbox = Arc::new(EventInbox::new(true));
        let events = ServerEvents::new(Arc::clone(&inbox));

        events.port_registration(PortId(1), true);
        events.port_registration(PortId(2), false);
        events.port_registration(PortId(3), true);
        events.port_registration(PortId(1), false);

        assert_eq!(drained(&inbox), vec![PortId(2), PortId(1)]);
    }

    #[test]
    fn test_everything_buffered_without_consumer() {
        let inbox = Arc::new(EventInbox::new(false));
        let events = ServerEvents::new(Arc::clone(&inbox));

        events.port_registration(PortId(1), true);
        events.port_registration(PortId(1), false);

        assert_eq!(drained(&inbox), vec![PortId(1), PortId(1)]);
    }

    #[test]
    fn test_shutdown_and_xruns_visible_through_inbox() {
        let inbox = Arc::new(EventInbox::new(false));
        let events = ServerEvents::new(Arc::clone(&inbox));

        events.xrun();
        events.xrun();
        assert_eq!(inbox.xruns().count(), 2);

        assert!(!inbox.is_shut_down());
        events.clone().shutdown();
        assert!(inbox.is_shut_down());
    }
}
