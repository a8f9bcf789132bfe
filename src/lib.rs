//! Software-PWM LED brightness driver.
//!
//! Two push buttons step an LED's brightness up and down through
//! `max_level + 1` discrete levels; the LED itself is dimmed by a software
//! PWM generator toggling a plain GPIO.  Platform access goes through the
//! port traits in [`app::ports`]; [`adapters`] provides host-side
//! implementations used by the binary and the tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod workqueue;
