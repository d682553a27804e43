use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued port handle. Valid until the matching unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u32);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Audio,
    Midi,
    /// Any type the bridge does not report on (CV, OSC, ...)
    Other,
}

/// Direction as the server sees it: an `Output` port produces data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Which side of the hardware a port listing is about.
///
/// Capture jacks show up as server outputs, playback jacks as server inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareSide {
    Capture,
    Playback,
}

impl HardwareSide {
    pub fn port_direction(self) -> PortDirection {
        match self {
            HardwareSide::Capture => PortDirection::Output,
            HardwareSide::Playback => PortDirection::Input,
        }
    }
}

/// Snapshot of a live server port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
    pub direction: PortDirection,
    /// Backed by a real jack on the device rather than a software client
    pub physical: bool,
    pub aliases: Vec<String>,
}

impl PortInfo {
    pub fn new(name: impl Into<String>, kind: PortKind, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            kind,
            direction,
            physical: false,
            aliases: Vec::new(),
        }
    }

    pub fn physical(mut self) -> Self {
        self.physical = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn is_hardware_midi(&self) -> bool {
        self.physical && self.kind == PortKind::Midi
    }

    /// First registered alias, if any.
    pub fn primary_alias(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }
}

/// One of the two true-bypass relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Left,
    Right,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Left => write!(f, "left"),
            Channel::Right => write!(f, "right"),
        }
    }
}

/// Relay positions reported to the bypass callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BypassState {
    pub left: bool,
    pub right: bool,
}

impl BypassState {
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
        }
    }
}

/// Server health as of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// DSP load estimate in percent
    pub cpu_load: f32,
    /// Underruns since the current connection was made
    pub xrun_count: u64,
}

impl HealthSnapshot {
    /// Reported while no server connection exists.
    pub fn unavailable() -> Self {
        Self {
            cpu_load: 0.0,
            xrun_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_side_maps_to_server_direction() {
        assert_eq!(HardwareSide::Capture.port_direction(), PortDirection::Output);
        assert_eq!(HardwareSide::Playback.port_direction(), PortDirection::Input);
    }

    #[test]
    fn test_hardware_midi_requires_both_flags() {
        let soft = PortInfo::new("a2j:Keystep", PortKind::Midi, PortDirection::Output);
        assert!(!soft.is_hardware_midi());

        let audio =
            PortInfo::new("system:capture_1", PortKind::Audio, PortDirection::Output).physical();
        assert!(!audio.is_hardware_midi());

        let midi =
            PortInfo::new("system:midi_capture_1", PortKind::Midi, PortDirection::Output)
                .physical();
        assert!(midi.is_hardware_midi());
    }

    #[test]
    fn test_primary_alias() {
        let port = PortInfo::new("system:midi_capture_2", PortKind::Midi, PortDirection::Output)
            .with_alias("alsa_pcm:Keystep-Pro/midi_capture_1")
            .with_alias("Keystep Pro");
        assert_eq!(port.primary_alias(), Some("alsa_pcm:Keystep-Pro/midi_capture_1"));

        let bare = PortInfo::new("system:midi_capture_3", PortKind::Midi, PortDirection::Output);
        assert_eq!(bare.primary_alias(), None);
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let snapshot = HealthSnapshot {
            cpu_load: 12.5,
            xrun_count: 3,
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["cpu_load"], 12.5);
        assert_eq!(json["xrun_count"], 3);
    }
}
