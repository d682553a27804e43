//! Native backends.

#[cfg(feature = "alsa")]
pub mod alsa;
#[cfg(feature = "jack")]
pub mod jack;
