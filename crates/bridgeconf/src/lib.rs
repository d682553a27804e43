//! Configuration loading for jackbridge.
//!
//! This crate provides configuration loading with minimal dependencies,
//! designed to be imported by both the bridge library and the daemon.
//!
//! # Configuration Layout
//!
//! - **Infrastructure** (`ServerConfig`, `MixerConfig`, `PortsConfig`): how to
//!   reach the audio server and the bypass mixer, and which port names matter.
//! - **Daemon** (`PollConfig`, `TelemetryConfig`): poll timing and logging for
//!   the `bridgewatch` binary.
//!
//! # Usage
//!
//! ```rust,no_run
//! use bridgeconf::BridgeConfig;
//!
//! let config = BridgeConfig::load().expect("Failed to load config");
//! println!("client: {}", config.server.client_name);
//! println!("mixer card: {}", config.mixer.card);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/jackbridge/config.toml` (system)
//! 2. `~/.config/jackbridge/config.toml` (user)
//! 3. `./jackbridge.toml` (local override, replaced by `--config` when given)
//! 4. Environment variables (`JACKBRIDGE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! client_name = "mod-ui"
//! default_sample_rate = 48000.0
//!
//! [mixer]
//! card = "hw:MOD-Duo"
//! left_control = "Left True-Bypass"
//! right_control = "Right True-Bypass"
//!
//! [ports]
//! hardware_pattern = "system:"
//!
//! [poll]
//! interval_ms = 500
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod daemon;
pub mod infra;
pub mod loader;

pub use daemon::{PollConfig, TelemetryConfig};
pub use infra::{MixerConfig, PortsConfig, ServerConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Render a string as a TOML basic string, escapes included.
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub mixer: MixerConfig,

    #[serde(default)]
    pub ports: PortsConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BridgeConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with an explicit file replacing `./jackbridge.toml`.
    ///
    /// System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and env vars contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let files = loader::discover_config_files_with_override(config_path);

        let mut config = loader::load_layered(&files)?;
        sources.files = files;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize the effective config to a TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand to keep section order stable and add a header
        let mut output = String::new();

        output.push_str("# jackbridge configuration\n\n");

        output.push_str("[server]\n");
        output.push_str(&format!("client_name = {}\n", quoted(&self.server.client_name)));
        output.push_str(&format!("no_start_server = {}\n", self.server.no_start_server));
        output.push_str(&format!("use_exact_name = {}\n", self.server.use_exact_name));
        output.push_str(&format!(
            "default_sample_rate = {:?}\n",
            self.server.default_sample_rate
        ));

        output.push_str("\n[mixer]\n");
        output.push_str(&format!("enabled = {}\n", self.mixer.enabled));
        output.push_str(&format!("card = {}\n", quoted(&self.mixer.card)));
        output.push_str(&format!("left_control = {}\n", quoted(&self.mixer.left_control)));
        output.push_str(&format!("right_control = {}\n", quoted(&self.mixer.right_control)));

        output.push_str("\n[ports]\n");
        output.push_str(&format!("hardware_pattern = {}\n", quoted(&self.ports.hardware_pattern)));
        output.push_str(&format!(
            "serial_midi_input = {}\n",
            quoted(&self.ports.serial_midi_input)
        ));
        output.push_str(&format!(
            "serial_midi_output = {}\n",
            quoted(&self.ports.serial_midi_output)
        ));

        output.push_str("\n[poll]\n");
        output.push_str(&format!("interval_ms = {}\n", self.poll.interval_ms));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!("log_level = {}\n", quoted(&self.telemetry.log_level)));

        output
    }
}
