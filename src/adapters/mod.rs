//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements | Connects to                      |
//! |---------------|------------|----------------------------------|
//! | `gpio`        | GpioPort   | In-memory 54-line pin bank       |
//! | `irq`         | IrqPort    | Simulated GPIO interrupt lines   |
//! | `time`        | ClockPort  | `std::time::Instant`             |
//! | `log_sink`    | EventSink  | `log` facade                     |

pub mod gpio;
pub mod irq;
pub mod log_sink;
pub mod time;
