//! Fuzz target: `LedConfig::from_params`
//!
//! Splits arbitrary UTF-8 into whitespace-separated `name=value` arguments
//! and asserts that parsing never panics and that a normalized result is
//! always within bounds.
//!
//! cargo fuzz run fuzz_config_params

#![no_main]

use libfuzzer_sys::fuzz_target;
use pwmled::config::{LedConfig, WORKERS_MAX};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = LedConfig::from_params(text.split_whitespace()) {
        let c = config.normalized();
        assert!(c.max_level >= 0);
        assert!((1..=WORKERS_MAX).contains(&c.workers));
        assert_eq!(c.levels(), c.max_level as u32);
    }
});
