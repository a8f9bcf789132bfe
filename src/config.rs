//! Startup parameters
//!
//! All tunable parameters for the LED driver.  They are read once at startup
//! (from `name=value` parameters or a JSON document) and are immutable for
//! the lifetime of the running service.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Default PWM period in nanoseconds.
pub const PULSE_PERIOD_DEFAULT_NS: u64 = 100_000;
/// Default number of brightness steps above "off".
pub const MAX_LEVEL_DEFAULT: i32 = 5;
/// Default button debounce window in milliseconds.
pub const DEBOUNCE_DEFAULT_MS: u64 = 200;
/// Default size of the deferred-work pool.
pub const WORKERS_DEFAULT: usize = 2;
/// Upper bound on the deferred-work pool.
pub const WORKERS_MAX: usize = 4;

/// Parameter names and descriptions, in the order `--help` prints them.
pub const PARAMS: &[(&str, &str)] = &[
    ("down_pin", "The GPIO where the down button is connected (default = 23)."),
    ("up_pin", "The GPIO where the up button is connected (default = 24)."),
    ("led_pin", "The GPIO where the LED is connected (default = 18)."),
    ("pulse_period", "Period in nanoseconds of the PWM signal (default = 100 000)."),
    ("max_level", "Maximum brightness level of the LED (default = 5)."),
    ("debounce_ms", "Button debounce window in milliseconds (default = 200)."),
    ("workers", "Deferred-work threads, 1 to 4 (default = 2)."),
];

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    // --- Pins ---
    /// Decrease-brightness button
    pub down_pin: u32,
    /// Increase-brightness button
    pub up_pin: u32,
    /// LED output
    pub led_pin: u32,

    // --- PWM ---
    /// Full PWM period (nanoseconds)
    #[serde(rename = "pulse_period")]
    pub pulse_period_ns: u64,
    /// Highest brightness level; negative values are clamped to 0
    pub max_level: i32,

    // --- Input ---
    /// Minimum spacing between two accepted presses of the same button
    pub debounce_ms: u64,

    // --- Scheduling ---
    /// Worker threads in the deferred-work pool
    pub workers: usize,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            // Pins
            down_pin: pins::DOWN_BUTTON_GPIO,
            up_pin: pins::UP_BUTTON_GPIO,
            led_pin: pins::LED_GPIO,

            // PWM
            pulse_period_ns: PULSE_PERIOD_DEFAULT_NS, // 10 kHz
            max_level: MAX_LEVEL_DEFAULT,

            // Input
            debounce_ms: DEBOUNCE_DEFAULT_MS,

            // Scheduling
            workers: WORKERS_DEFAULT,
        }
    }
}

impl LedConfig {
    /// Parse `name=value` startup parameters on top of the defaults.
    pub fn from_params<'a>(params: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        Self::default().with_params(params)
    }

    /// Apply `name=value` parameters on top of `self` (e.g. a loaded file).
    pub fn with_params<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        for param in params {
            let (name, value) = param
                .split_once('=')
                .ok_or(Error::Config("expected name=value"))?;
            self.set(name.trim(), value.trim())?;
        }
        Ok(self)
    }

    /// Load a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON config"))
    }

    /// Clamp out-of-range values instead of rejecting them.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_level = self.max_level.max(0);
        self.workers = self.workers.clamp(1, WORKERS_MAX);
        self
    }

    /// `max_level` as an unsigned step count (negative values read as 0).
    pub fn levels(&self) -> u32 {
        self.max_level.max(0) as u32
    }

    /// Debounce window in nanoseconds.
    pub fn debounce_ns(&self) -> u64 {
        self.debounce_ms.saturating_mul(1_000_000)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "down_pin" => self.down_pin = parse(value)?,
            "up_pin" => self.up_pin = parse(value)?,
            "led_pin" => self.led_pin = parse(value)?,
            "pulse_period" => self.pulse_period_ns = parse(value)?,
            "max_level" => self.max_level = parse(value)?,
            "debounce_ms" => self.debounce_ms = parse(value)?,
            "workers" => self.workers = parse(value)?,
            _ => return Err(Error::Config("unknown parameter")),
        }
        Ok(())
    }
}

fn parse<T: core::str::FromStr>(value: &str) -> Result<T> {
    // Accept the "100_000" spelling used in the parameter descriptions.
    value
        .replace('_', "")
        .parse()
        .map_err(|_| Error::Config("invalid parameter value"))
}
