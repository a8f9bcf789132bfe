//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing the driver's lifecycle and
//! brightness events through the `log` facade.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Loaded(c) => {
                info!(
                    "LOAD | down={} up={} led={} | period={}ns levels={} debounce={}ms workers={}",
                    c.down_pin,
                    c.up_pin,
                    c.led_pin,
                    c.pulse_period_ns,
                    c.max_level,
                    c.debounce_ms,
                    c.workers,
                );
            }
            AppEvent::BrightnessChanged(r) => {
                info!(
                    "LEVEL | {}/{} ({}%) state={:?}",
                    r.level, r.max_level, r.percent, r.state
                );
            }
            AppEvent::Unloaded => {
                info!("UNLOAD | pins and interrupts released");
            }
        }
    }
}
