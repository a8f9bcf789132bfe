//! In-memory GPIO bank.
//!
//! Implements [`GpioPort`] for host runs and tests: 54 lines (BCM
//! numbering) with ownership tracking, directions and levels.  Levels are
//! atomics so the PWM hot path never takes a lock; ownership and direction
//! changes (startup / shutdown only) go through a mutex.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::{Direction, GpioPort, Pin};
use crate::error::GpioError;
use crate::pins::GPIO_COUNT;

const LINES: usize = GPIO_COUNT as usize;

#[derive(Debug, Clone, Copy, Default)]
struct LineInfo {
    owner: Option<&'static str>,
    output: bool,
}

/// Simulated pin bank.
pub struct SimGpio {
    lines: Mutex<[LineInfo; LINES]>,
    levels: [AtomicBool; LINES],
    /// Number of level changes written to any output.
    edges: AtomicU64,
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new([LineInfo::default(); LINES]),
            levels: core::array::from_fn(|_| AtomicBool::new(false)),
            edges: AtomicU64::new(0),
        }
    }

    /// Owner label of `pin`, if requested.
    pub fn owner(&self, pin: Pin) -> Option<&'static str> {
        self.with_lines(|lines| lines.get(pin as usize).and_then(|l| l.owner))
    }

    /// Whether `pin` is configured as an output.
    pub fn is_output(&self, pin: Pin) -> bool {
        self.with_lines(|lines| lines.get(pin as usize).is_some_and(|l| l.output))
    }

    /// Drive an input line from the outside (a button being held, say).
    pub fn drive_input(&self, pin: Pin, state: PinState) {
        if let Some(level) = self.levels.get(pin as usize) {
            level.store(state == PinState::High, Ordering::Release);
        }
    }

    /// Total level changes written so far.
    pub fn edges(&self) -> u64 {
        self.edges.load(Ordering::Acquire)
    }

    fn with_lines<R>(&self, f: impl FnOnce(&mut [LineInfo; LINES]) -> R) -> R {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut lines)
    }
}

impl GpioPort for SimGpio {
    fn is_valid(&self, pin: Pin) -> bool {
        pin < GPIO_COUNT
    }

    fn request(&self, pin: Pin, label: &'static str) -> Result<(), GpioError> {
        self.with_lines(|lines| {
            let line = lines.get_mut(pin as usize).ok_or(GpioError::Io(-22))?;
            if line.owner.is_some() {
                return Err(GpioError::Busy);
            }
            line.owner = Some(label);
            debug!("sim-gpio: {} requested by '{}'", pin, label);
            Ok(())
        })
    }

    fn free(&self, pin: Pin) {
        self.with_lines(|lines| {
            if let Some(line) = lines.get_mut(pin as usize) {
                if let Some(owner) = line.owner.take() {
                    debug!("sim-gpio: {} released by '{}'", pin, owner);
                }
                line.output = false;
            }
        });
    }

    fn set_direction(&self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        self.with_lines(|lines| {
            let line = lines.get_mut(pin as usize).ok_or(GpioError::Io(-22))?;
            if line.owner.is_none() {
                return Err(GpioError::NotRequested);
            }
            line.output = matches!(direction, Direction::Output(_));
            Ok(())
        })?;
        if let Direction::Output(initial) = direction {
            self.set(pin, initial);
        }
        Ok(())
    }

    fn get(&self, pin: Pin) -> PinState {
        self.levels
            .get(pin as usize)
            .map_or(PinState::Low, |l| PinState::from(l.load(Ordering::Acquire)))
    }

    fn set(&self, pin: Pin, state: PinState) {
        if let Some(level) = self.levels.get(pin as usize) {
            let high = state == PinState::High;
            if level.swap(high, Ordering::AcqRel) != high {
                self.edges.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
