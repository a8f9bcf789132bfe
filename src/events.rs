//! Button events and the single-slot pending-event register.
//!
//! Events are produced by the debounce filter (interrupt context) and
//! consumed by the brightness state machine (deferred-work context).
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Down IRQ    │────▶│ PendingEvent │────▶│ State machine│
//! │ Up IRQ      │────▶│  (one slot)  │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! The register holds at most one event.  Posting while an event is still
//! unconsumed overwrites it, so two presses that land before the state
//! machine runs collapse into the most recent one.  This is not a queue.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Input line a button is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// Decrease-brightness button.
    Down,
    /// Increase-brightness button.
    Up,
}

impl Line {
    pub const ALL: [Line; 2] = [Line::Down, Line::Up];

    /// The event an accepted edge on this line produces.
    pub const fn event(self) -> Event {
        match self {
            Line::Down => Event::Down,
            Line::Up => Event::Up,
        }
    }

    /// Label used when requesting the line's GPIO.
    pub const fn label(self) -> &'static str {
        match self {
            Line::Down => "down button",
            Line::Up => "up button",
        }
    }
}

/// Input to the brightness state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    /// Nothing pending.  A no-op in every state.
    None = 0,
    /// Increase brightness.
    Up = 1,
    /// Decrease brightness.
    Down = 2,
}

/// Single-slot, overwrite-on-post event register.
///
/// Safe to post from interrupt context: the slot is guarded by a critical
/// section, never by a blocking lock.
pub struct PendingEvent {
    slot: Signal<CriticalSectionRawMutex, Event>,
}

impl Default for PendingEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingEvent {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Store `event`, replacing any unconsumed one.
    pub fn post(&self, event: Event) {
        self.slot.signal(event);
    }

    /// Consume the pending event, or [`Event::None`] if the slot is empty.
    pub fn take(&self) -> Event {
        self.slot.try_take().unwrap_or(Event::None)
    }

    /// Whether an event is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.slot.signaled()
    }
}
