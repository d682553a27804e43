//! Edge detection for the two true-bypass relays
//!
//! A baseline is read once when the mixer opens. Each poll afterwards rereads
//! the resolved switches and reports the pair only when at least one of them
//! moved, so one poll produces at most one notification.

use bridgeconf::MixerConfig;
use tracing::{debug, warn};

use crate::mixer::MixerHandle;
use crate::types::{BypassState, Channel};

#[derive(Debug, Clone, Default)]
struct Switch {
    /// Control name, present only if the hardware exposes it
    control: Option<String>,
    last: bool,
}

impl Switch {
    fn resolve<H: MixerHandle>(handle: &H, name: &str) -> Self {
        if !handle.has_switch(name) {
            debug!("bypass control {name:?} not present");
            return Self::default();
        }

        let last = match handle.read_switch(name) {
            Ok(value) => value,
            Err(e) => {
                warn!("reading bypass baseline: {e}");
                false
            }
        };
        Self {
            control: Some(name.to_string()),
            last,
        }
    }

    /// Reread the switch; true if the cached value changed.
    fn observe<H: MixerHandle>(&mut self, handle: &H) -> bool {
        let Some(control) = self.control.as_deref() else {
            return false;
        };
        match handle.read_switch(control) {
            Ok(value) if value != self.last => {
                self.last = value;
                true
            }
            Ok(_) => false,
            Err(e) => {
                debug!("skipping bypass read this poll: {e}");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BypassDetector {
    left: Switch,
    right: Switch,
}

impl BypassDetector {
    /// No controls resolved; both channels read as `false` forever.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Resolve both controls and record their current values as the baseline.
    pub fn baseline<H: MixerHandle>(handle: &H, config: &MixerConfig) -> Self {
        Self {
            left: Switch::resolve(handle, &config.left_control),
            right: Switch::resolve(handle, &config.right_control),
        }
    }

    fn switch(&self, channel: Channel) -> &Switch {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    /// Last observed value.
    pub fn cached(&self, channel: Channel) -> bool {
        self.switch(channel).last
    }

    pub fn state(&self) -> BypassState {
        BypassState {
            left: self.left.last,
            right: self.right.last,
        }
    }

    /// Control name for `channel`, if the hardware has one.
    pub fn control(&self, channel: Channel) -> Option<&str> {
        self.switch(channel).control.as_deref()
    }

    /// Process pending mixer events and reread both switches. Returns the new
    /// pair if either channel changed since the previous observation.
    pub fn detect<H: MixerHandle>(&mut self, handle: &mut H) -> Option<BypassState> {
        if let Err(e) = handle.handle_events() {
            debug!("mixer event processing failed: {e}");
        }

        // Both channels are read even if the first one changed
        let left = self.left.observe(handle);
        let right = self.right.observe(handle);

        (left || right).then(|| self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeMixer;
    use crate::mixer::MixerBackend;

    fn config() -> MixerConfig {
        MixerConfig::default()
    }

    #[test]
    fn test_baseline_fires_nothing_and_caches_values() {
        let mixer = FakeMixer::with_switches(&[
            ("Left True-Bypass", true),
            ("Right True-Bypass", false),
        ]);
        let mut handle = mixer.open("hw:MOD-Duo").unwrap();

        let mut detector = BypassDetector::baseline(&handle, &config());
        assert!(detector.cached(Channel::Left));
        assert!(!detector.cached(Channel::Right));
        assert_eq!(detector.detect(&mut handle), None);
    }

    #[test]
    fn test_simultaneous_changes_report_once() {
        let mixer = FakeMixer::with_switches(&[
            ("Left True-Bypass", false),
            ("Right True-Bypass", false),
        ]);
        let mut handle = mixer.open("hw:MOD-Duo").unwrap();
        let mut detector = BypassDetector::baseline(&handle, &config());

        mixer.toggle_external("Left True-Bypass", true);
        mixer.toggle_external("Right True-Bypass", true);

        assert_eq!(
            detector.detect(&mut handle),
            Some(BypassState {
                left: true,
                right: true
            })
        );
        assert_eq!(detector.detect(&mut handle), None);
    }

    #[test]
    fn test_changes_only_visible_after_event_processing() {
        let mixer = FakeMixer::with_switches(&[
            ("Left True-Bypass", false),
            ("Right True-Bypass", false),
        ]);
        let mut handle = mixer.open("hw:MOD-Duo").unwrap();
        let mut detector = BypassDetector::baseline(&handle, &config());

        mixer.toggle_external("Right True-Bypass", true);
        // A plain read before handle_events still sees the old value
        assert!(!handle.read_switch("Right True-Bypass").unwrap());

        assert_eq!(
            detector.detect(&mut handle),
            Some(BypassState {
                left: false,
                right: true
            })
        );
    }

    #[test]
    fn test_missing_control_is_never_observed() {
        let mixer = FakeMixer::with_switches(&[("Left True-Bypass", false)]);
        let mut handle = mixer.open("hw:MOD-Duo").unwrap();
        let mut detector = BypassDetector::baseline(&handle, &config());

        assert_eq!(detector.control(Channel::Right), None);
        assert_eq!(detector.control(Channel::Left), Some("Left True-Bypass"));

        mixer.toggle_external("Left True-Bypass", true);
        assert_eq!(
            detector.detect(&mut handle),
            Some(BypassState {
                left: true,
                right: false
            })
        );
        assert!(!detector.cached(Channel::Right));
    }

    #[test]
    fn test_toggle_back_and_forth_between_polls_is_invisible() {
        let mixer = FakeMixer::with_switches(&[
            ("Left True-Bypass", false),
            ("Right True-Bypass", false),
        ]);
        let mut handle = mixer.open("hw:MOD-Duo").unwrap();
        let mut detector = BypassDetector::baseline(&handle, &config());

        mixer.toggle_external("Left True-Bypass", true);
        mixer.toggle_external("Left True-Bypass", false);

        assert_eq!(detector.detect(&mut handle), None);
    }
}
