//! Outbound application events.
//!
//! The [`PwmLedService`](super::service::PwmLedService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::config::LedConfig;
use crate::fsm::LedState;

/// Structured events emitted by the driver core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup completed; the PWM generator is running.
    Loaded(LedConfig),

    /// The state machine processed an event (emitted even when the level
    /// did not move).
    BrightnessChanged(BrightnessReport),

    /// Shutdown completed; every pin and interrupt line is released.
    Unloaded,
}

/// Result of one state-machine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessReport {
    pub level: u32,
    pub max_level: u32,
    pub state: LedState,
    /// `100 * level / max_level`, 0 when `max_level` is 0.
    pub percent: u32,
}
