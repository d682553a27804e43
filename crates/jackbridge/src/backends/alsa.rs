//! ALSA simple-mixer backend for the bypass relay switches

use ::alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};

use crate::error::MixerError;
use crate::mixer::{MixerBackend, MixerHandle};

#[derive(Debug, Default, Clone, Copy)]
pub struct AlsaMixer;

impl AlsaMixer {
    pub fn new() -> Self {
        Self
    }
}

impl MixerBackend for AlsaMixer {
    type Handle = AlsaMixerHandle;

    fn open(&self, card: &str) -> Result<AlsaMixerHandle, MixerError> {
        let mixer = Mixer::new(card, false).map_err(|e| MixerError::Open {
            card: card.to_string(),
            reason: e.to_string(),
        })?;
        Ok(AlsaMixerHandle { mixer })
    }
}

/// Open mixer; closed on drop.
pub struct AlsaMixerHandle {
    mixer: Mixer,
}

impl AlsaMixerHandle {
    fn selem(&self, name: &str) -> Result<Selem<'_>, MixerError> {
        self.mixer
            .find_selem(&SelemId::new(name, 0))
            .ok_or_else(|| MixerError::ControlNotFound(name.to_string()))
    }
}

impl MixerHandle for AlsaMixerHandle {
    fn has_switch(&self, name: &str) -> bool {
        self.selem(name)
            .map(|selem| selem.has_playback_switch())
            .unwrap_or(false)
    }

    fn handle_events(&mut self) -> Result<(), MixerError> {
        self.mixer
            .handle_events()
            .map(|_| ())
            .map_err(|e| MixerError::Events(e.to_string()))
    }

    fn read_switch(&self, name: &str) -> Result<bool, MixerError> {
        let value = self
            .selem(name)?
            .get_playback_switch(SelemChannelId::mono())
            .map_err(|e| MixerError::Read {
                control: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(value != 0)
    }

    fn write_switch(&mut self, name: &str, on: bool) -> Result<(), MixerError> {
        self.selem(name)?
            .set_playback_switch_all(i32::from(on))
            .map_err(|e| MixerError::Write {
                control: name.to_string(),
                reason: e.to_string(),
            })
    }
}
