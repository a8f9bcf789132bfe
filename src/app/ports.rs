//! Port traits — the hexagonal boundary between the driver core and the
//! platform it runs on.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PwmLedService (core)
//! ```
//!
//! Driven adapters (GPIO bank, interrupt controller, clock, event sinks)
//! implement these traits.  The [`PwmLedService`](super::service::PwmLedService)
//! consumes them through `Arc`s because the interrupt handler and the
//! deferred-work threads all hold them at the same time, so every port is
//! `Send + Sync` and takes `&self`.

use std::sync::Arc;

use embedded_hal::digital::PinState;

use crate::error::{GpioError, IrqError};

/// GPIO line number on the controller.
pub type Pin = u32;

/// Interrupt line number.
pub type Irq = u32;

/// Rising-edge handler.  Invoked in interrupt context with the line that
/// fired; must return quickly and never block.
pub type IrqHandler = Arc<dyn Fn(Irq) + Send + Sync>;

// ───────────────────────────────────────────────────────────────
// GPIO port
// ───────────────────────────────────────────────────────────────

/// Pin direction, with the initial level for outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output(PinState),
}

/// Digital pin bank addressed by line number.
pub trait GpioPort: Send + Sync {
    /// Whether `pin` names a line that exists on this controller.
    fn is_valid(&self, pin: Pin) -> bool;

    /// Take exclusive ownership of a line.
    fn request(&self, pin: Pin, label: &'static str) -> Result<(), GpioError>;

    /// Give a line back.  Freeing an unowned line is a no-op.
    fn free(&self, pin: Pin);

    /// Configure a requested line as input or output.
    fn set_direction(&self, pin: Pin, direction: Direction) -> Result<(), GpioError>;

    /// Current line level.
    fn get(&self, pin: Pin) -> PinState;

    /// Drive an output line.
    fn set(&self, pin: Pin, state: PinState);
}

// ───────────────────────────────────────────────────────────────
// Interrupt port
// ───────────────────────────────────────────────────────────────

/// Interrupt controller for GPIO lines.
pub trait IrqPort: Send + Sync {
    /// Interrupt line wired to `pin`.
    fn gpio_to_irq(&self, pin: Pin) -> Result<Irq, IrqError>;

    /// Install a rising-edge handler on `irq`.
    fn request_rising(&self, irq: Irq, name: &'static str, handler: IrqHandler)
    -> Result<(), IrqError>;

    /// Remove the handler from `irq`.  Once this returns the handler is not
    /// running and will not be invoked again.
    fn free(&self, irq: Irq);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait ClockPort: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin.  Never decreases.
    fn now_ns(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::AppEvent);
}
