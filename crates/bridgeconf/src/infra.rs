//! Infrastructure configuration - the external services the bridge talks to.

use serde::{Deserialize, Serialize};

/// Audio server client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Client name registered with the audio server.
    /// Default: mod-ui
    #[serde(default = "ServerConfig::default_client_name")]
    pub client_name: String,

    /// Refuse to auto-start a server when none is running.
    /// Default: true
    #[serde(default = "ServerConfig::default_true")]
    pub no_start_server: bool,

    /// Fail instead of renaming the client when the name is taken.
    /// Default: true
    #[serde(default = "ServerConfig::default_true")]
    pub use_exact_name: bool,

    /// Sample rate reported while no server connection exists.
    /// Default: 48000.0
    #[serde(default = "ServerConfig::default_sample_rate")]
    pub default_sample_rate: f32,
}

impl ServerConfig {
    fn default_client_name() -> String {
        "mod-ui".to_string()
    }

    fn default_true() -> bool {
        true
    }

    fn default_sample_rate() -> f32 {
        48_000.0
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client_name: Self::default_client_name(),
            no_start_server: true,
            use_exact_name: true,
            default_sample_rate: Self::default_sample_rate(),
        }
    }
}

/// Hardware mixer holding the true-bypass relays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Open the mixer at all. When false, bypass control reports unsupported.
    /// Default: true
    #[serde(default = "MixerConfig::default_enabled")]
    pub enabled: bool,

    /// Sound card identifier.
    /// Default: hw:MOD-Duo
    #[serde(default = "MixerConfig::default_card")]
    pub card: String,

    /// Simple-element name of the left relay switch.
    #[serde(default = "MixerConfig::default_left_control")]
    pub left_control: String,

    /// Simple-element name of the right relay switch.
    #[serde(default = "MixerConfig::default_right_control")]
    pub right_control: String,
}

impl MixerConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_card() -> String {
        "hw:MOD-Duo".to_string()
    }

    fn default_left_control() -> String {
        "Left True-Bypass".to_string()
    }

    fn default_right_control() -> String {
        "Right True-Bypass".to_string()
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            card: Self::default_card(),
            left_control: Self::default_left_control(),
            right_control: Self::default_right_control(),
        }
    }
}

/// Well-known port names and patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortsConfig {
    /// Name pattern hardware ports must match when listed.
    /// Default: system:
    #[serde(default = "PortsConfig::default_hardware_pattern")]
    pub hardware_pattern: String,

    /// Serial MIDI bridge capture port.
    #[serde(default = "PortsConfig::default_serial_midi_input")]
    pub serial_midi_input: String,

    /// Serial MIDI bridge playback port.
    #[serde(default = "PortsConfig::default_serial_midi_output")]
    pub serial_midi_output: String,
}

impl PortsConfig {
    fn default_hardware_pattern() -> String {
        "system:".to_string()
    }

    fn default_serial_midi_input() -> String {
        "ttymidi:MIDI_in".to_string()
    }

    fn default_serial_midi_output() -> String {
        "ttymidi:MIDI_out".to_string()
    }
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            hardware_pattern: Self::default_hardware_pattern(),
            serial_midi_input: Self::default_serial_midi_input(),
            serial_midi_output: Self::default_serial_midi_output(),
        }
    }
}
