//! Software PWM generator.
//!
//! Produces a duty cycle of `level / max_level` on a plain digital output
//! without a hardware timer.  The caller invokes [`SoftPwm::step`] over and
//! over (the service resubmits it to the work queue after every call); each
//! step compares the time since the last toggle against the length of the
//! current phase and flips the pin once the phase is over.
//!
//! ```text
//!        ┌──── on ────┐             ┌──── on ────┐
//!  ──────┘            └─── off ─────┘            └───
//!        │◀────────── pulse_period ─────────▶│
//!
//!  on  = period * level / max_level
//!  off = period - on
//! ```
//!
//! At level 0 and at `max_level` there is no waveform: the pin is forced
//! low or high and the toggle timestamp is left untouched.  Resolution is
//! bounded by how often `step` is called.

use core::sync::atomic::{AtomicU64, Ordering};

use embedded_hal::digital::PinState;

use crate::app::ports::{GpioPort, Pin};

/// What one [`SoftPwm::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmStep {
    /// Level is 0 or max: pin forced to a constant value.
    Steady(PinState),
    /// Phase over: pin flipped to the given value.
    Toggled(PinState),
    /// Phase still running; pin unchanged for `remaining_ns` more.
    Holding { remaining_ns: u64 },
}

pub struct SoftPwm {
    pin: Pin,
    period_ns: u64,
    /// Time of the last pin flip.
    last_toggle_ns: AtomicU64,
}

impl SoftPwm {
    /// Generator on `pin` with the given period; `now_ns` seeds the toggle
    /// timestamp.
    pub fn new(pin: Pin, period_ns: u64, now_ns: u64) -> Self {
        Self {
            pin,
            period_ns,
            last_toggle_ns: AtomicU64::new(now_ns),
        }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// How long the pin must stay at `current` before the next flip.
    ///
    /// Only meaningful for `0 < level < max_level`.
    pub fn hold_ns(&self, level: u32, max_level: u32, current: PinState) -> u64 {
        // Widened so any u64 period times any u32 level fits.
        let on = u128::from(self.period_ns) * u128::from(level.min(max_level))
            / u128::from(max_level.max(1));
        // on <= period, so it narrows back losslessly.
        let on = on as u64;
        match current {
            PinState::High => on,
            PinState::Low => self.period_ns - on,
        }
    }

    /// Advance the waveform by one poll.
    pub fn step(&self, gpio: &dyn GpioPort, level: u32, max_level: u32, now_ns: u64) -> PwmStep {
        if level == 0 || level >= max_level {
            let steady = if level == 0 {
                PinState::Low
            } else {
                PinState::High
            };
            gpio.set(self.pin, steady);
            return PwmStep::Steady(steady);
        }

        let current = gpio.get(self.pin);
        let hold = self.hold_ns(level, max_level, current);
        let elapsed = now_ns.saturating_sub(self.last_toggle_ns.load(Ordering::Acquire));

        if elapsed >= hold {
            let next = !current;
            gpio.set(self.pin, next);
            self.last_toggle_ns.store(now_ns, Ordering::Release);
            PwmStep::Toggled(next)
        } else {
            PwmStep::Holding {
                remaining_ns: hold - elapsed,
            }
        }
    }

    /// Time of the last pin flip.
    pub fn last_toggle_ns(&self) -> u64 {
        self.last_toggle_ns.load(Ordering::Acquire)
    }
}
