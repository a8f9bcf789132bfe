//! Brightness finite state machine.
//!
//! ```text
//! ┌────────┬─────────────────┬─────────────────┐
//! │ State  │ Up              │ Down            │
//! ├────────┼─────────────────┼─────────────────┤
//! │ Off    │ Increase        │ Nothing         │
//! │ On     │ Increase        │ Decrease        │
//! │ Max    │ Nothing         │ Decrease        │
//! └────────┴─────────────────┴─────────────────┘
//!          Event::None → Nothing in every state
//! ```
//!
//! The table only decides *whether* the level moves.  The state itself is
//! derived data: after every action it is recomputed from the new level
//! (`Off` at 0, `Max` at `max_level`, `On` in between).
//!
//! Each run takes the pending event from the shared [`LedContext`], applies
//! the action and refreshes the state.  Runs are serialized by the work
//! queue, so the read-modify-write of level and state never interleaves
//! with another run.

pub mod context;

use std::sync::Arc;

use context::{LedContext, percent};
use log::debug;

use crate::app::events::BrightnessReport;
use crate::events::Event;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// LED state classification, derived from the brightness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LedState {
    Off = 0,
    On = 1,
    Max = 2,
}

impl LedState {
    /// Classify `level`.  `Off` wins when `max_level` is 0.
    pub const fn from_level(level: u32, max_level: u32) -> Self {
        if level == 0 {
            Self::Off
        } else if level >= max_level {
            Self::Max
        } else {
            Self::On
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::On,
            _ => Self::Max,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// What a (state, event) pair does to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Nothing,
    Increase,
    Decrease,
}

/// The transition table.
pub const fn action_for(state: LedState, event: Event) -> Action {
    match (state, event) {
        (LedState::Off | LedState::On, Event::Up) => Action::Increase,
        (LedState::On | LedState::Max, Event::Down) => Action::Decrease,
        (LedState::Max, Event::Up) | (LedState::Off, Event::Down) | (_, Event::None) => {
            Action::Nothing
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Outcome of one state-machine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub event: Event,
    pub action: Action,
    pub from: LedState,
    pub to: LedState,
    pub level: u32,
}

/// The brightness state machine.
///
/// Holds the shared context; cloning is cheap and every clone drives the
/// same level.
#[derive(Clone)]
pub struct Fsm {
    ctx: Arc<LedContext>,
}

impl Fsm {
    pub fn new(ctx: Arc<LedContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &LedContext {
        &self.ctx
    }

    /// Consume the pending event (if any) and apply it.
    pub fn run(&self) -> Step {
        let event = self.ctx.pending().take();
        self.dispatch(event)
    }

    /// Apply `event` directly, bypassing the pending slot.
    pub fn dispatch(&self, event: Event) -> Step {
        let from = self.ctx.state();
        let action = action_for(from, event);

        match action {
            Action::Increase => {
                self.ctx.increase_level();
            }
            Action::Decrease => {
                self.ctx.decrease_level();
            }
            Action::Nothing => {}
        }

        let to = self.ctx.refresh_state();
        let level = self.ctx.level();
        debug!("FSM {:?} + {:?} -> {:?} ({:?}, level {})", from, event, to, action, level);

        Step {
            event,
            action,
            from,
            to,
            level,
        }
    }

    /// Report for the current level, as logged after every run.
    pub fn report(&self) -> BrightnessReport {
        let level = self.ctx.level();
        let max_level = self.ctx.max_level();
        BrightnessReport {
            level,
            max_level,
            state: self.ctx.state(),
            percent: percent(level, max_level),
        }
    }
}
