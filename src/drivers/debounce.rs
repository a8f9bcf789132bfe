//! ISR-side button debounce filter.
//!
//! ## Hardware
//!
//! Two momentary switches, each raising a rising-edge interrupt on press.
//! Mechanical bounce produces a burst of edges per press; the filter keeps
//! the first and drops the rest.
//!
//! ## Filtering
//!
//! | Condition                                    | Result            |
//! |----------------------------------------------|-------------------|
//! | `now - last_accepted(line) <  window`        | edge dropped      |
//! | `now - last_accepted(line) >= window`        | `Up` / `Down`     |
//!
//! Each line keeps its own last-accepted timestamp, seeded with the startup
//! time.  The check and the timestamp update are one atomic step, so the
//! filter is safe to call from interrupt context on any core.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::events::{Event, Line};

pub struct Debouncer {
    window_ns: u64,
    last_down_ns: AtomicU64,
    last_up_ns: AtomicU64,
}

impl Debouncer {
    /// `window_ns` is the minimum spacing between accepted edges on one
    /// line; `now_ns` seeds both lines' last-accepted time.
    pub fn new(window_ns: u64, now_ns: u64) -> Self {
        Self {
            window_ns,
            last_down_ns: AtomicU64::new(now_ns),
            last_up_ns: AtomicU64::new(now_ns),
        }
    }

    pub fn window_ns(&self) -> u64 {
        self.window_ns
    }

    /// Filter one rising edge.  Returns the event to post, or `None` if the
    /// edge is bounce.
    pub fn on_edge(&self, line: Line, now_ns: u64) -> Option<Event> {
        let window = self.window_ns;
        self.slot(line)
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                (now_ns.saturating_sub(last) >= window).then_some(now_ns)
            })
            .ok()
            .map(|_| line.event())
    }

    /// Last accepted edge time for `line`.
    pub fn last_accepted_ns(&self, line: Line) -> u64 {
        self.slot(line).load(Ordering::Acquire)
    }

    fn slot(&self, line: Line) -> &AtomicU64 {
        match line {
            Line::Down => &self.last_down_ns,
            Line::Up => &self.last_up_ns,
        }
    }
}
