//! Application core — the driver's wiring, zero platform code.
//!
//! [`service::PwmLedService`] owns the running driver.  All interaction with
//! pins, interrupts and time happens through the **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
