//! Startup rollback and shutdown tests.
//!
//! A failed start must leave no pin or interrupt line held; a stopped
//! service must not touch the LED again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::digital::PinState;
use pwmled::adapters::irq::{IRQ_BASE, SimIrqController};
use pwmled::app::events::AppEvent;
use pwmled::app::ports::{GpioPort, Irq, IrqHandler, IrqPort, Pin};
use pwmled::app::service::PwmLedService;
use pwmled::config::LedConfig;
use pwmled::error::{Error, GpioError, IrqError};

use crate::mock_hw::{ManualClock, Rig, wait_for};

const DOWN: u32 = 23;
const UP: u32 = 24;
const LED: u32 = 18;

fn assert_nothing_held(rig: &Rig) {
    assert!(rig.gpio.held().is_empty(), "pins still held: {:?}", rig.gpio.held());
    assert_eq!(rig.irq.registered(), 0);
    assert!(
        !rig.sink.events().iter().any(|e| matches!(e, AppEvent::Loaded(_))),
        "failed start must not report Loaded"
    );
}

#[test]
fn invalid_led_pin_rejected() {
    let rig = Rig::new();
    rig.gpio.mark_invalid(LED);

    let err = rig.start(LedConfig::default()).err();
    assert_eq!(err, Some(Error::InvalidPin { pin: LED, target: "led" }));
    assert_nothing_held(&rig);
}

#[test]
fn busy_up_pin_releases_down_pin() {
    let rig = Rig::new();
    rig.gpio.request(UP, "someone else").unwrap();

    let err = rig.start(LedConfig::default()).err();
    assert_eq!(err, Some(Error::Gpio { pin: UP, source: GpioError::Busy }));
    assert_eq!(rig.gpio.held(), vec![UP]);
    assert_eq!(rig.irq.registered(), 0);
}

#[test]
fn led_direction_failure_releases_everything() {
    let rig = Rig::new();
    rig.gpio.fail_direction(LED, GpioError::Io(-5));

    let err = rig.start(LedConfig::default()).err();
    assert_eq!(err, Some(Error::Gpio { pin: LED, source: GpioError::Io(-5) }));
    assert_nothing_held(&rig);
}

#[test]
fn same_pin_for_both_buttons_rejected() {
    let rig = Rig::new();
    let config = LedConfig::from_params(["down_pin=24", "up_pin=24"]).unwrap();

    let err = rig.start(config).err();
    assert_eq!(err, Some(Error::Gpio { pin: UP, source: GpioError::Busy }));
    assert_nothing_held(&rig);
}

#[test]
fn busy_interrupt_line_rolls_back_first_line_and_pins() {
    let rig = Rig::new();
    rig.irq
        .request_rising(IRQ_BASE + UP, "someone else", Arc::new(|_: u32| {}))
        .unwrap();

    let err = rig.start(LedConfig::default()).err();
    assert_eq!(err, Some(Error::Irq { pin: UP, source: IrqError::Busy }));
    assert!(rig.gpio.held().is_empty());
    assert!(!rig.irq.is_registered(IRQ_BASE + DOWN));
    assert_eq!(rig.irq.registered(), 1);
}

#[test]
fn pin_without_interrupt_rejected() {
    let rig = Rig::new();
    let config = LedConfig::from_params(["down_pin=60"]).unwrap();

    let err = rig.start(config).err();
    assert_eq!(err, Some(Error::Irq { pin: 60, source: IrqError::NoMapping }));
    assert_nothing_held(&rig);
}

#[test]
fn second_start_while_running_fails() {
    let rig = Rig::new();
    let svc = rig.start(LedConfig::default()).unwrap();

    let err = rig.start(LedConfig::default()).err();
    assert_eq!(err, Some(Error::Gpio { pin: DOWN, source: GpioError::Busy }));

    // The running instance is unaffected.
    assert_eq!(rig.gpio.held(), vec![LED, DOWN, UP]);
    assert_eq!(rig.press(&svc, UP).level, 1);
    svc.stop();
}

#[test]
fn stop_releases_everything_and_silences_the_led() {
    let rig = Rig::new();
    let svc = rig.start(LedConfig::default()).unwrap();
    for _ in 0..5 {
        rig.press(&svc, UP);
    }

    svc.stop();

    assert_eq!(rig.gpio.level(LED), PinState::Low);
    assert!(rig.gpio.held().is_empty());
    assert_eq!(rig.irq.registered(), 0);
    assert_eq!(rig.sink.last(), Some(AppEvent::Unloaded));

    let writes = rig.gpio.writes();
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rig.gpio.writes(), writes, "LED written after stop");
    assert!(!rig.irq.fire(UP));
}

#[test]
fn dropping_the_service_shuts_it_down() {
    let rig = Rig::new();
    {
        let svc = rig.start(LedConfig::default()).unwrap();
        rig.press(&svc, UP);
    }
    assert!(rig.gpio.held().is_empty());
    assert_eq!(rig.irq.registered(), 0);
    let unloaded = rig
        .sink
        .events()
        .iter()
        .filter(|e| **e == AppEvent::Unloaded)
        .count();
    assert_eq!(unloaded, 1);
}

#[test]
fn restart_after_stop_starts_from_zero() {
    let rig = Rig::new();
    let svc = rig.start(LedConfig::default()).unwrap();
    rig.press(&svc, UP);
    svc.stop();

    let svc = rig.start(LedConfig::default()).unwrap();
    assert_eq!(svc.level(), 0);
    assert_eq!(rig.press(&svc, UP).level, 1);
    svc.stop();
}

/// Interrupt controller that raises an edge on the first registered line
/// while the second one is being registered.
struct EdgeDuringStartup {
    inner: SimIrqController,
    clock: Arc<ManualClock>,
    fail_second: bool,
    first: Mutex<Option<(Irq, IrqHandler)>>,
}

impl EdgeDuringStartup {
    fn new(clock: Arc<ManualClock>, fail_second: bool) -> Self {
        Self {
            inner: SimIrqController::new(),
            clock,
            fail_second,
            first: Mutex::new(None),
        }
    }
}

impl IrqPort for EdgeDuringStartup {
    fn gpio_to_irq(&self, pin: Pin) -> Result<Irq, IrqError> {
        self.inner.gpio_to_irq(pin)
    }

    fn request_rising(
        &self,
        irq: Irq,
        name: &'static str,
        handler: IrqHandler,
    ) -> Result<(), IrqError> {
        let first = self.first.lock().unwrap().clone();
        match first {
            None => {
                *self.first.lock().unwrap() = Some((irq, handler.clone()));
            }
            Some((first_irq, first_handler)) => {
                self.clock.advance_ms(1_000);
                first_handler(first_irq);
                if self.fail_second {
                    return Err(IrqError::Busy);
                }
            }
        }
        self.inner.request_rising(irq, name, handler)
    }

    fn free(&self, irq: Irq) {
        self.inner.free(irq);
    }
}

fn start_with(rig: &Rig, irq: Arc<EdgeDuringStartup>) -> pwmled::error::Result<PwmLedService> {
    PwmLedService::start(
        LedConfig::default(),
        rig.gpio.clone(),
        irq,
        rig.clock.clone(),
        rig.sink.clone(),
    )
}

#[test]
fn edge_during_failed_start_never_reaches_state_machine() {
    let rig = Rig::new();
    let irq = Arc::new(EdgeDuringStartup::new(rig.clock.clone(), true));

    let err = start_with(&rig, irq.clone()).err();
    assert_eq!(err, Some(Error::Irq { pin: UP, source: IrqError::Busy }));

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(rig.sink.report_count(), 0);
    assert!(rig.gpio.held().is_empty());
    assert_eq!(irq.inner.registered(), 0);
}

#[test]
fn edge_during_successful_start_is_applied_once_running() {
    let rig = Rig::new();
    let irq = Arc::new(EdgeDuringStartup::new(rig.clock.clone(), false));

    // The first line registered is the decrease button.
    let svc = start_with(&rig, irq.clone()).unwrap();
    assert!(wait_for(|| rig.sink.report_count() == 1));
    assert!(!svc.has_pending_event());
    assert_eq!(svc.level(), 0);

    rig.clock.advance_ms(1_000);
    assert!(irq.inner.fire(UP));
    assert!(wait_for(|| svc.level() == 1));
    svc.stop();
}
