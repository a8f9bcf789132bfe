//! Mock hardware adapters for integration tests.
//!
//! `MockGpio` records pin ownership and level changes and can be told to
//! fail a request or direction change.  `ManualClock` only moves when a
//! test advances it.  `RecordingSink` keeps every emitted event.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;
use pwmled::adapters::irq::SimIrqController;
use pwmled::app::events::{AppEvent, BrightnessReport};
use pwmled::app::ports::{ClockPort, Direction, EventSink, GpioPort, Pin};
use pwmled::app::service::PwmLedService;
use pwmled::config::LedConfig;
use pwmled::error::GpioError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Poll `cond` for up to five seconds.
pub fn wait_for(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ── MockGpio ──────────────────────────────────────────────────

#[derive(Default)]
struct GpioState {
    owners: HashMap<Pin, &'static str>,
    directions: HashMap<Pin, Direction>,
    levels: HashMap<Pin, PinState>,
    /// Level changes only; repeated writes of the same level are counted
    /// in `writes` but not recorded here.
    changes: Vec<(Pin, PinState)>,
    invalid: HashSet<Pin>,
    fail_request: HashMap<Pin, GpioError>,
    fail_direction: HashMap<Pin, GpioError>,
}

#[derive(Default)]
pub struct MockGpio {
    state: Mutex<GpioState>,
    writes: AtomicU64,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_invalid(&self, pin: Pin) {
        lock(&self.state).invalid.insert(pin);
    }

    pub fn fail_request(&self, pin: Pin, err: GpioError) {
        lock(&self.state).fail_request.insert(pin, err);
    }

    pub fn fail_direction(&self, pin: Pin, err: GpioError) {
        lock(&self.state).fail_direction.insert(pin, err);
    }

    /// Pins currently requested.
    pub fn held(&self) -> Vec<Pin> {
        let mut pins: Vec<Pin> = lock(&self.state).owners.keys().copied().collect();
        pins.sort_unstable();
        pins
    }

    pub fn direction(&self, pin: Pin) -> Option<Direction> {
        lock(&self.state).directions.get(&pin).copied()
    }

    pub fn level(&self, pin: Pin) -> PinState {
        self.get(pin)
    }

    /// Every `set` call, including ones that did not change the level.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn changes(&self, pin: Pin) -> Vec<PinState> {
        lock(&self.state)
            .changes
            .iter()
            .filter(|(p, _)| *p == pin)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl GpioPort for MockGpio {
    fn is_valid(&self, pin: Pin) -> bool {
        !lock(&self.state).invalid.contains(&pin)
    }

    fn request(&self, pin: Pin, label: &'static str) -> Result<(), GpioError> {
        let mut s = lock(&self.state);
        if let Some(err) = s.fail_request.get(&pin) {
            return Err(*err);
        }
        if s.owners.contains_key(&pin) {
            return Err(GpioError::Busy);
        }
        s.owners.insert(pin, label);
        Ok(())
    }

    fn free(&self, pin: Pin) {
        let mut s = lock(&self.state);
        s.owners.remove(&pin);
        s.directions.remove(&pin);
    }

    fn set_direction(&self, pin: Pin, direction: Direction) -> Result<(), GpioError> {
        {
            let mut s = lock(&self.state);
            if let Some(err) = s.fail_direction.get(&pin) {
                return Err(*err);
            }
            if !s.owners.contains_key(&pin) {
                return Err(GpioError::NotRequested);
            }
            s.directions.insert(pin, direction);
        }
        if let Direction::Output(initial) = direction {
            self.set(pin, initial);
        }
        Ok(())
    }

    fn get(&self, pin: Pin) -> PinState {
        lock(&self.state)
            .levels
            .get(&pin)
            .copied()
            .unwrap_or(PinState::Low)
    }

    fn set(&self, pin: Pin, state: PinState) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut s = lock(&self.state);
        if s.levels.insert(pin, state) != Some(state) {
            s.changes.push((pin, state));
        }
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.fetch_add(ms * 1_000_000, Ordering::SeqCst);
    }

    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.fetch_add(ns, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        lock(&self.events).clone()
    }

    pub fn reports(&self) -> Vec<BrightnessReport> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                AppEvent::BrightnessChanged(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn report_count(&self) -> usize {
        self.reports().len()
    }

    pub fn last(&self) -> Option<AppEvent> {
        lock(&self.events).last().cloned()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        lock(&self.events).push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Mock GPIO, simulated interrupt controller, manual clock and recording
/// sink, wired for one service instance.
pub struct Rig {
    pub gpio: Arc<MockGpio>,
    pub irq: Arc<SimIrqController>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self {
            gpio: Arc::new(MockGpio::new()),
            irq: Arc::new(SimIrqController::new()),
            clock: Arc::new(ManualClock::new()),
            sink: Arc::new(RecordingSink::new()),
        }
    }

    pub fn start(&self, config: LedConfig) -> pwmled::error::Result<PwmLedService> {
        PwmLedService::start(
            config,
            self.gpio.clone(),
            self.irq.clone(),
            self.clock.clone(),
            self.sink.clone(),
        )
    }

    /// Let the debounce window pass, raise an edge on `pin` and wait for
    /// the state machine to report.
    pub fn press(&self, svc: &PwmLedService, pin: Pin) -> BrightnessReport {
        self.clock.advance_ns(svc.debounce_window_ns());
        let before = self.sink.report_count();
        assert!(self.irq.fire(pin), "no handler on GPIO {pin}");
        assert!(
            wait_for(|| self.sink.report_count() > before),
            "state machine never ran after edge on GPIO {pin}"
        );
        *self.sink.reports().last().unwrap()
    }
}
