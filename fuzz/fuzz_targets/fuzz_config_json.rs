//! Fuzz target: `LedConfig::from_json`
//!
//! Feeds arbitrary bytes to the JSON loader; anything it accepts must
//! survive a serialize / load cycle unchanged.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use pwmled::config::LedConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(config) = LedConfig::from_json(text) {
        let json = serde_json::to_string(&config).expect("serializable");
        assert_eq!(LedConfig::from_json(&json), Ok(config));
    }
});
