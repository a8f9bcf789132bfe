//! Shared context threaded through the state machine, the interrupt
//! handler and the PWM generator.
//!
//! `LedContext` is the single place the brightness level, the derived LED
//! state and the pending event live.  It is shared through an `Arc`; every
//! field is an atomic or a critical-section slot so no component ever waits
//! on another.
//!
//! | Field     | Writer          | Readers                    |
//! |-----------|-----------------|----------------------------|
//! | `level`   | state machine   | state machine, PWM         |
//! | `state`   | state machine   | service queries            |
//! | `pending` | debounce filter | state machine (take)       |

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use super::LedState;
use crate::events::PendingEvent;

pub struct LedContext {
    /// Highest level; fixed at startup.
    max_level: u32,
    /// Current level, always in `0..=max_level`.
    level: AtomicU32,
    /// `LedState` discriminant, derived from `level`.
    state: AtomicU8,
    /// Event waiting for the next state-machine run.
    pending: PendingEvent,
}

impl LedContext {
    /// Fresh context: level 0, state `Off`, nothing pending.
    pub fn new(max_level: u32) -> Self {
        Self {
            max_level,
            level: AtomicU32::new(0),
            state: AtomicU8::new(LedState::Off as u8),
            pending: PendingEvent::new(),
        }
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Current brightness level.
    pub fn level(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    /// LED state as of the last state-machine run.
    pub fn state(&self) -> LedState {
        LedState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn pending(&self) -> &PendingEvent {
        &self.pending
    }

    /// `100 * level / max_level`; 0 when there are no steps.
    pub fn brightness_percent(&self) -> u32 {
        percent(self.level(), self.max_level)
    }

    // ── Writes (state machine only) ──────────────────────────

    /// Saturating increment.  Returns the new level.
    pub(super) fn increase_level(&self) -> u32 {
        let max = self.max_level;
        match self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |l| {
                (l < max).then_some(l + 1)
            }) {
            Ok(prev) => prev + 1,
            Err(cur) => cur,
        }
    }

    /// Saturating decrement.  Returns the new level.
    pub(super) fn decrease_level(&self) -> u32 {
        match self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |l| l.checked_sub(1))
        {
            Ok(prev) => prev - 1,
            Err(cur) => cur,
        }
    }

    /// Re-derive the LED state from the current level and store it.
    pub(super) fn refresh_state(&self) -> LedState {
        let state = LedState::from_level(self.level(), self.max_level);
        self.state.store(state as u8, Ordering::Release);
        state
    }
}

pub(crate) fn percent(level: u32, max_level: u32) -> u32 {
    if max_level == 0 {
        0
    } else {
        (100 * u64::from(level) / u64::from(max_level)) as u32
    }
}
