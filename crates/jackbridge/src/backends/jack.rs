//! JACK backend (libjack through the `jack` crate)

use ::jack::{
    AsyncClient, Client, ClientOptions, ClientStatus, Control, NotificationHandler, PortFlags,
};
use bridgeconf::ServerConfig;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::server::{AudioServer, ServerConnection, ServerEvents};
use crate::types::{PortDirection, PortId, PortInfo, PortKind};

const MIDI_TYPE: &str = "8 bit raw midi";
const AUDIO_TYPE: &str = "32 bit float mono audio";

/// Connects to an already running JACK server.
#[derive(Debug, Default, Clone, Copy)]
pub struct JackServer;

impl JackServer {
    pub fn new() -> Self {
        Self
    }
}

/// Forwards server notifications into the bridge's inbox.
struct Notifications {
    events: ServerEvents,
}

impl NotificationHandler for Notifications {
    unsafe fn shutdown(&mut self, status: ClientStatus, reason: &str) {
        debug!(?status, reason, "jack shutdown notification");
        self.events.shutdown();
    }

    fn port_registration(&mut self, _: &Client, port_id: ::jack::PortId, is_registered: bool) {
        self.events.port_registration(PortId(port_id), is_registered);
    }

    fn xrun(&mut self, _: &Client) -> Control {
        self.events.xrun();
        Control::Continue
    }
}

fn client_options(config: &ServerConfig) -> ClientOptions {
    let mut options = ClientOptions::empty();
    if config.no_start_server {
        options |= ClientOptions::NO_START_SERVER;
    }
    if config.use_exact_name {
        options |= ClientOptions::USE_EXACT_NAME;
    }
    options
}

impl AudioServer for JackServer {
    type Connection = JackConnection;

    fn open(
        &self,
        config: &ServerConfig,
        events: ServerEvents,
    ) -> Result<JackConnection, ServerError> {
        let (client, status) = Client::new(&config.client_name, client_options(config)).map_err(
            |e| ServerError::Open {
                client: config.client_name.clone(),
                reason: e.to_string(),
            },
        )?;
        debug!(?status, "jack client opened");

        let client = client
            .activate_async(Notifications { events }, ())
            .map_err(|e| ServerError::Activate {
                client: config.client_name.clone(),
                reason: e.to_string(),
            })?;

        info!(
            sample_rate = client.as_client().sample_rate(),
            buffer_size = client.as_client().buffer_size(),
            "jack client active"
        );
        Ok(JackConnection { client })
    }
}

pub struct JackConnection {
    client: AsyncClient<Notifications, ()>,
}

fn kind_of(port_type: &str) -> PortKind {
    match port_type {
        MIDI_TYPE => PortKind::Midi,
        AUDIO_TYPE => PortKind::Audio,
        _ => PortKind::Other,
    }
}

fn type_name(kind: PortKind) -> Option<&'static str> {
    match kind {
        PortKind::Midi => Some(MIDI_TYPE),
        PortKind::Audio => Some(AUDIO_TYPE),
        PortKind::Other => None,
    }
}

fn describe(port: ::jack::Port<::jack::Unowned>) -> Option<PortInfo> {
    let name = port.name().ok()?;
    let flags = port.flags();
    let direction = if flags.contains(PortFlags::IS_OUTPUT) {
        PortDirection::Output
    } else {
        PortDirection::Input
    };

    Some(PortInfo {
        name,
        kind: kind_of(&port.port_type().unwrap_or_default()),
        direction,
        physical: flags.contains(PortFlags::IS_PHYSICAL),
        aliases: port.aliases().unwrap_or_default(),
    })
}

impl JackConnection {
    fn client(&self) -> &Client {
        self.client.as_client()
    }
}

impl ServerConnection for JackConnection {
    fn cpu_load(&self) -> f32 {
        self.client().cpu_load()
    }

    fn sample_rate(&self) -> f32 {
        self.client().sample_rate() as f32
    }

    fn port_by_id(&self, id: PortId) -> Option<PortInfo> {
        self.client().port_by_id(id.0).and_then(describe)
    }

    fn port_by_name(&self, name: &str) -> Option<PortInfo> {
        self.client().port_by_name(name).and_then(describe)
    }

    fn ports(
        &self,
        name_pattern: &str,
        kind: PortKind,
        direction: PortDirection,
        physical_only: bool,
    ) -> Vec<String> {
        let mut flags = match direction {
            PortDirection::Input => PortFlags::IS_INPUT,
            PortDirection::Output => PortFlags::IS_OUTPUT,
        };
        if physical_only {
            flags |= PortFlags::IS_PHYSICAL;
        }
        self.client()
            .ports(Some(name_pattern), type_name(kind), flags)
    }

    fn connect(&self, from: &str, to: &str) -> Result<(), ServerError> {
        self.client()
            .connect_ports_by_name(from, to)
            .map_err(|e| ServerError::Connect {
                from: from.to_string(),
                to: to.to_string(),
                reason: e.to_string(),
            })
    }

    fn disconnect(&self, from: &str, to: &str) -> Result<(), ServerError> {
        self.client()
            .disconnect_ports_by_name(from, to)
            .map_err(|e| ServerError::Disconnect {
                from: from.to_string(),
                to: to.to_string(),
                reason: e.to_string(),
            })
    }

    fn close(self) -> Result<(), ServerError> {
        let (client, _, _) = self
            .client
            .deactivate()
            .map_err(|e| ServerError::Close(e.to_string()))?;
        drop(client);
        Ok(())
    }

    /// The server is gone; closing the client would talk to a dead socket,
    /// so the handle is leaked instead.
    fn abandon(self) {
        std::mem::forget(self.client);
    }
}
