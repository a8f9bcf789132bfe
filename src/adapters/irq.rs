//! Simulated GPIO interrupt controller.
//!
//! Every GPIO line maps to interrupt `IRQ_BASE + pin`.  [`SimIrqController::fire`]
//! plays the role of the hardware: it invokes the installed rising-edge
//! handler on the calling thread, which stands in for interrupt context.
//! A handler is never invoked concurrently with [`IrqPort::free`] for its
//! line: `free` waits for a running handler to return.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use log::{debug, trace};

use crate::app::ports::{Irq, IrqHandler, IrqPort, Pin};
use crate::error::IrqError;
use crate::pins::GPIO_COUNT;

/// First interrupt number of the GPIO bank.
pub const IRQ_BASE: Irq = 160;

struct Registration {
    name: &'static str,
    handler: IrqHandler,
}

/// Simulated interrupt controller.
#[derive(Default)]
pub struct SimIrqController {
    handlers: RwLock<HashMap<Irq, Registration>>,
    /// Serializes delivery per controller, like a single interrupt line
    /// controller would.
    delivery: Mutex<()>,
}

impl SimIrqController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a rising edge on `pin`.  Returns `false` if no handler is
    /// installed for it.
    pub fn fire(&self, pin: Pin) -> bool {
        let Ok(irq) = self.gpio_to_irq(pin) else {
            return false;
        };
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&irq)
            .map(|r| r.handler.clone());

        match handler {
            Some(handler) => {
                trace!("sim-irq: {} (gpio {})", irq, pin);
                handler(irq);
                true
            }
            None => false,
        }
    }

    /// Whether a handler is installed on `irq`.
    pub fn is_registered(&self, irq: Irq) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&irq)
    }

    /// Number of installed handlers.
    pub fn registered(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl IrqPort for SimIrqController {
    fn gpio_to_irq(&self, pin: Pin) -> Result<Irq, IrqError> {
        if pin < GPIO_COUNT {
            Ok(IRQ_BASE + pin)
        } else {
            Err(IrqError::NoMapping)
        }
    }

    fn request_rising(
        &self,
        irq: Irq,
        name: &'static str,
        handler: IrqHandler,
    ) -> Result<(), IrqError> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(&irq) {
            return Err(IrqError::Busy);
        }
        handlers.insert(irq, Registration { name, handler });
        debug!("sim-irq: {} -> '{}'", irq, name);
        Ok(())
    }

    fn free(&self, irq: Irq) {
        // Wait out an in-flight delivery before dropping the handler.
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&irq);
        if let Some(r) = removed {
            debug!("sim-irq: {} released by '{}'", irq, r.name);
        }
    }
}
