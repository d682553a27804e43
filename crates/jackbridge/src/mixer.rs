//! Hardware mixer seam for the true-bypass relay switches.

use crate::error::MixerError;

/// Opens a mixer on a sound card.
pub trait MixerBackend {
    type Handle: MixerHandle;

    fn open(&self, card: &str) -> Result<Self::Handle, MixerError>;
}

/// An open mixer. Dropping the handle closes it.
pub trait MixerHandle {
    /// Whether a simple boolean switch with this name exists (index 0).
    fn has_switch(&self, name: &str) -> bool;

    /// Let the mixer pick up pending hardware change events so the next
    /// reads see current values.
    fn handle_events(&mut self) -> Result<(), MixerError>;

    fn read_switch(&self, name: &str) -> Result<bool, MixerError>;

    fn write_switch(&mut self, name: &str, on: bool) -> Result<(), MixerError>;
}
