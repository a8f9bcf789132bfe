//! Driver service — the hexagonal core.
//!
//! [`PwmLedService`] wires the debounce filter, the brightness state machine
//! and the software PWM generator onto the injected ports, and owns every
//! resource they hold.
//!
//! ```text
//!  IrqPort ──▶ Debouncer ──▶ PendingEvent ──▶ [fsm work] ──▶ EventSink
//!                                                  │
//!                                               level
//!                                                  ▼
//!  GpioPort ◀──────────────────────────────── [pwm work] ◀─┐
//!                                                  └────────┘ resubmit
//! ```
//!
//! Startup is all-or-nothing: pins and interrupt lines are held by RAII
//! claims that give everything back if a later step fails.  Shutdown is
//! synchronous: once [`PwmLedService::stop`] returns no handler or work item
//! is running and the LED is low.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::PinState;
use heapless::Vec;
use log::{debug, error, info, warn};

use crate::config::LedConfig;
use crate::drivers::debounce::Debouncer;
use crate::drivers::soft_pwm::SoftPwm;
use crate::error::{Error, Result};
use crate::events::Line;
use crate::fsm::context::LedContext;
use crate::fsm::{Fsm, LedState};
use crate::workqueue::{Work, WorkQueue};

use super::events::{AppEvent, BrightnessReport};
use super::ports::{ClockPort, Direction, EventSink, GpioPort, Irq, IrqHandler, IrqPort, Pin};

const LED_LABEL: &str = "led";
const QUEUE_NAME: &str = "pwmled-wq";

// ───────────────────────────────────────────────────────────────
// Resource claims
// ───────────────────────────────────────────────────────────────

/// GPIO lines held by the service, released in reverse order on drop.
struct PinClaims {
    gpio: Arc<dyn GpioPort>,
    held: Vec<Pin, 3>,
}

impl PinClaims {
    fn new(gpio: Arc<dyn GpioPort>) -> Self {
        Self {
            gpio,
            held: Vec::new(),
        }
    }

    fn claim(&mut self, pin: Pin, label: &'static str, direction: Direction) -> Result<()> {
        if !self.gpio.is_valid(pin) {
            error!("GPIO {} is not valid for {}", pin, label);
            return Err(Error::InvalidPin { pin, target: label });
        }
        self.gpio.request(pin, label).map_err(|source| {
            error!("GPIO {} request for {} failed: {}", pin, label, source);
            Error::Gpio { pin, source }
        })?;
        if self.held.push(pin).is_err() {
            self.gpio.free(pin);
            return Err(Error::Config("too many pins"));
        }
        self.gpio.set_direction(pin, direction).map_err(|source| {
            error!("GPIO {} direction for {} failed: {}", pin, label, source);
            Error::Gpio { pin, source }
        })
    }

    fn release(&mut self) {
        while let Some(pin) = self.held.pop() {
            self.gpio.free(pin);
        }
    }
}

impl Drop for PinClaims {
    fn drop(&mut self) {
        self.release();
    }
}

/// Interrupt lines with an installed handler, freed on drop.
struct IrqClaims {
    irq: Arc<dyn IrqPort>,
    held: Vec<Irq, 2>,
}

impl IrqClaims {
    fn new(irq: Arc<dyn IrqPort>) -> Self {
        Self {
            irq,
            held: Vec::new(),
        }
    }

    fn register(&mut self, pin: Pin, name: &'static str, handler: IrqHandler) -> Result<()> {
        let irq = self.irq.gpio_to_irq(pin).map_err(|source| {
            error!("GPIO {} ({}) has no interrupt: {}", pin, name, source);
            Error::Irq { pin, source }
        })?;
        if self.held.is_full() {
            return Err(Error::Config("too many interrupt lines"));
        }
        self.irq.request_rising(irq, name, handler).map_err(|source| {
            error!("IRQ {} request for {} failed: {}", irq, name, source);
            Error::Irq { pin, source }
        })?;
        // Capacity checked above.
        let _ = self.held.push(irq);
        debug!("GPIO {} ({}) mapped to IRQ {}", pin, name, irq);
        Ok(())
    }

    fn release(&mut self) {
        while let Some(irq) = self.held.pop() {
            self.irq.free(irq);
        }
    }
}

impl Drop for IrqClaims {
    fn drop(&mut self) {
        self.release();
    }
}

// ───────────────────────────────────────────────────────────────
// PwmLedService
// ───────────────────────────────────────────────────────────────

/// A running driver instance.
///
/// Dropping the service performs the same shutdown as [`stop`](Self::stop).
pub struct PwmLedService {
    config: LedConfig,
    fsm: Fsm,
    debouncer: Arc<Debouncer>,
    gpio: Arc<dyn GpioPort>,
    sink: Arc<dyn EventSink>,
    level_work: Arc<Work>,
    pwm_work: Arc<Work>,
    /// `None` once shut down.
    queue: Option<WorkQueue>,
    irqs: IrqClaims,
    pins: PinClaims,
}

impl PwmLedService {
    /// Claim the pins, register the button interrupts and start the PWM
    /// generator.
    ///
    /// `config` is normalized first.  On error nothing stays held: every
    /// acquired pin and interrupt line has been released again.
    pub fn start(
        config: LedConfig,
        gpio: Arc<dyn GpioPort>,
        irq: Arc<dyn IrqPort>,
        clock: Arc<dyn ClockPort>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let config = config.normalized();
        info!(
            "pwmled: starting (down={} up={} led={} period={}ns max_level={} debounce={}ms)",
            config.down_pin,
            config.up_pin,
            config.led_pin,
            config.pulse_period_ns,
            config.max_level,
            config.debounce_ms
        );

        // 1. Pins.  The LED starts low.
        let mut pins = PinClaims::new(Arc::clone(&gpio));
        pins.claim(config.down_pin, Line::Down.label(), Direction::Input)?;
        pins.claim(config.up_pin, Line::Up.label(), Direction::Input)?;
        pins.claim(config.led_pin, LED_LABEL, Direction::Output(PinState::Low))?;

        // 2. Shared state, seeded with the startup time.
        let now = clock.now_ns();
        let ctx = Arc::new(LedContext::new(config.levels()));
        let fsm = Fsm::new(Arc::clone(&ctx));
        let debouncer = Arc::new(Debouncer::new(config.debounce_ns(), now));
        let pwm = SoftPwm::new(config.led_pin, config.pulse_period_ns, now);

        // 3. Deferred work.
        let queue = WorkQueue::new(QUEUE_NAME, config.workers)?;

        let level_work = {
            let fsm = fsm.clone();
            let sink = Arc::clone(&sink);
            queue.create_work("pwmled-fsm", move |_| {
                fsm.run();
                sink.emit(&AppEvent::BrightnessChanged(fsm.report()));
            })
        };

        let pwm_work = {
            let gpio = Arc::clone(&gpio);
            let clock = Arc::clone(&clock);
            let ctx = Arc::clone(&ctx);
            queue.create_work("pwmled-pwm", move |w| {
                pwm.step(gpio.as_ref(), ctx.level(), ctx.max_level(), clock.now_ns());
                w.schedule();
            })
        };

        // 4. Interrupts.  Edges are recorded from here on but only reach the
        // state machine once startup has succeeded.
        let running = Arc::new(AtomicBool::new(false));
        let mut irqs = IrqClaims::new(irq);
        for line in Line::ALL {
            let pin = match line {
                Line::Down => config.down_pin,
                Line::Up => config.up_pin,
            };
            let handler: IrqHandler = {
                let debouncer = Arc::clone(&debouncer);
                let clock = Arc::clone(&clock);
                let ctx = Arc::clone(&ctx);
                let work = Arc::clone(&level_work);
                let running = Arc::clone(&running);
                Arc::new(move |_irq: Irq| {
                    if let Some(event) = debouncer.on_edge(line, clock.now_ns()) {
                        ctx.pending().post(event);
                        if running.load(Ordering::SeqCst) {
                            work.schedule();
                        }
                    }
                })
            };
            if let Err(e) = irqs.register(pin, line.label(), handler) {
                // Release in shutdown order: work, interrupts, workers, pins.
                level_work.cancel_sync();
                pwm_work.cancel_sync();
                drop(irqs);
                queue.shutdown();
                return Err(e);
            }
        }

        // 5. Go.  An edge taken during startup is still pending; run it now.
        running.store(true, Ordering::SeqCst);
        if ctx.pending().is_pending() {
            level_work.schedule();
        }
        if !pwm_work.schedule() {
            warn!("pwmled: PWM work could not be scheduled");
        }
        sink.emit(&AppEvent::Loaded(config));
        info!("pwmled: loaded, {} level(s)", config.levels());

        Ok(Self {
            config,
            fsm,
            debouncer,
            gpio,
            sink,
            level_work,
            pwm_work,
            queue: Some(queue),
            irqs,
            pins,
        })
    }

    /// Stop the driver and release every pin and interrupt line.
    ///
    /// Cancels the state-machine work, then the PWM work (each waits for an
    /// in-flight run), frees both interrupt lines, joins the workers, drives
    /// the LED low and gives the pins back.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(queue) = self.queue.take() else {
            return;
        };

        self.level_work.cancel_sync();
        self.pwm_work.cancel_sync();
        self.irqs.release();
        queue.shutdown();

        self.gpio.set(self.config.led_pin, PinState::Low);
        self.pins.release();

        self.sink.emit(&AppEvent::Unloaded);
        info!("pwmled: unloaded");
    }

    // ── Queries ───────────────────────────────────────────────

    /// Normalized configuration the service runs with.
    pub fn config(&self) -> &LedConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.fsm.context().level()
    }

    pub fn state(&self) -> LedState {
        self.fsm.context().state()
    }

    pub fn max_level(&self) -> u32 {
        self.fsm.context().max_level()
    }

    /// Snapshot of level, state and brightness percentage.
    pub fn report(&self) -> BrightnessReport {
        self.fsm.report()
    }

    /// Debounce window in nanoseconds.
    pub fn debounce_window_ns(&self) -> u64 {
        self.debouncer.window_ns()
    }

    /// Whether an edge is waiting for the state machine.
    pub fn has_pending_event(&self) -> bool {
        self.fsm.context().pending().is_pending()
    }
}

impl Drop for PwmLedService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
