//! Jackbridge: audio server polling bridge
//!
//! Connects a control-surface UI to a running audio server and to the
//! device's true-bypass relays. The UI drives everything from one thread by
//! calling [`Bridge::poll`] on a timer:
//!
//! - **Health**: DSP load plus the underrun count since the last connect
//! - **Hardware MIDI**: physical MIDI ports removed since the last poll
//! - **Bypass**: relay changes since the last poll, at most one report each
//!
//! Server notifications arrive on the server's own thread and are buffered in
//! an [`EventInbox`]; callbacks only ever run inside `poll`.
//!
//! Real backends are behind the `jack` and `alsa` features. The in-memory
//! [`fake`] backends are always available.

pub mod bridge;
pub mod bypass;
pub mod error;
pub mod fake;
pub mod filter;
pub mod health;
pub mod mixer;
pub mod registration;
pub mod server;
pub mod types;

#[cfg(any(feature = "jack", feature = "alsa"))]
pub mod backends;

pub use bridge::{Bridge, BypassCallback, MidiPortDeletedCallback};
pub use bypass::BypassDetector;
pub use error::{BridgeError, MixerError, ServerError};
pub use filter::{hardware_midi_ports, MidiPortNotice};
pub use health::XrunCounter;
pub use mixer::{MixerBackend, MixerHandle};
pub use registration::RegistrationBuffer;
pub use server::{AudioServer, EventInbox, ServerConnection, ServerEvents};
pub use types::{
    BypassState, Channel, HardwareSide, HealthSnapshot, PortDirection, PortId, PortInfo, PortKind,
};

#[cfg(feature = "alsa")]
pub use backends::alsa::AlsaMixer;
#[cfg(feature = "jack")]
pub use backends::jack::JackServer;
