//! Hardware MIDI filter for drained port identifiers.

use crate::server::ServerConnection;
use crate::types::PortId;

/// A physical MIDI port found among the drained identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortNotice {
    pub name: String,
    /// First alias, or empty when the port has none
    pub alias: String,
}

/// Resolve `ids` against the server, keeping only physical MIDI ports.
///
/// A just-removed port still resolves. Identifiers whose slot the server has
/// already recycled do not; they are skipped. Output follows the order of
/// `ids`.
pub fn hardware_midi_ports<'a, C: ServerConnection>(
    connection: &'a C,
    ids: &'a [PortId],
) -> impl Iterator<Item = MidiPortNotice> + 'a {
    ids.iter()
        .filter_map(move |&id| connection.port_by_id(id))
        .filter(|port| port.is_hardware_midi())
        .map(|port| MidiPortNotice {
            alias: port.primary_alias().unwrap_or_default().to_string(),
            name: port.name,
        })
}
