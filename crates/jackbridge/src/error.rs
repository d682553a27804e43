use crate::types::Channel;

/// Failures reported by an audio server backend.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to open client {client}: {reason}")]
    Open { client: String, reason: String },

    #[error("Failed to activate client {client}: {reason}")]
    Activate { client: String, reason: String },

    #[error("Failed to connect {from} -> {to}: {reason}")]
    Connect {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Failed to disconnect {from} -> {to}: {reason}")]
    Disconnect {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Failed to close client: {0}")]
    Close(String),
}

/// Failures reported by a hardware mixer backend.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("Failed to open mixer {card}: {reason}")]
    Open { card: String, reason: String },

    #[error("Mixer control not found: {0}")]
    ControlNotFound(String),

    #[error("Failed to process mixer events: {0}")]
    Events(String),

    #[error("Failed to read {control}: {reason}")]
    Read { control: String, reason: String },

    #[error("Failed to write {control}: {reason}")]
    Write { control: String, reason: String },
}

/// Errors surfaced by [`crate::Bridge`] operations.
///
/// Anything not listed here degrades to a safe default instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Audio server unavailable: {0}")]
    ServerUnavailable(#[from] ServerError),

    #[error("Bypass mixer unavailable")]
    MixerUnavailable,

    #[error("No {0} bypass control on this hardware")]
    ControlMissing(Channel),

    #[error("Bypass switch write failed: {0}")]
    SwitchWrite(#[source] MixerError),
}
