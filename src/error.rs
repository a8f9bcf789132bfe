//! Unified error types for the PWM LED driver.
//!
//! Only startup can fail.  Every variant is `Copy` so it can be logged and
//! returned from the rollback path without allocation.  Once the service is
//! running there is no error path at all: discarded edges and overwritten
//! events are normal outcomes.

use core::fmt;

use crate::app::ports::Pin;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pin number is not a valid line on this controller.
    InvalidPin { pin: Pin, target: &'static str },
    /// A GPIO request or direction change failed.
    Gpio { pin: Pin, source: GpioError },
    /// Interrupt line lookup or registration failed.
    Irq { pin: Pin, source: IrqError },
    /// A startup parameter is unknown or could not be parsed.
    Config(&'static str),
    /// The deferred-work pool could not be created.
    WorkQueue(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin { pin, target } => write!(f, "invalid GPIO {pin} for {target}"),
            Self::Gpio { pin, source } => write!(f, "GPIO {pin}: {source}"),
            Self::Irq { pin, source } => write!(f, "IRQ for GPIO {pin}: {source}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::WorkQueue(msg) => write!(f, "work queue: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line is already held by another owner.
    Busy,
    /// The line was never requested.
    NotRequested,
    /// Controller-specific failure code.
    Io(i32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "line busy"),
            Self::NotRequested => write!(f, "line not requested"),
            Self::Io(rc) => write!(f, "I/O error (rc={rc})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Interrupt errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// The pin has no interrupt line.
    NoMapping,
    /// A handler is already installed on the line.
    Busy,
    /// Controller-specific failure code.
    RequestFailed(i32),
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMapping => write!(f, "no interrupt line"),
            Self::Busy => write!(f, "handler already installed"),
            Self::RequestFailed(rc) => write!(f, "request failed (rc={rc})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
