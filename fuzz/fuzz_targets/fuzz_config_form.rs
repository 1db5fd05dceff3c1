//! Fuzz target: settings form decoding
//!
//! Feeds arbitrary query strings through `url_decode` and `apply_form`.
//! Anything `apply_form` accepts must pass validation, so a hostile form
//! can never persist an out-of-range record.
//!
//! cargo fuzz run fuzz_config_form

#![no_main]

use flipclock::adapters::config_server::{apply_form, split_uri, url_decode};
use flipclock::config::ClockConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };
    let (_, query) = split_uri(uri);
    let _ = url_decode(query);

    if let Ok(Some(cfg)) = apply_form(query, &ClockConfig::default()) {
        assert!(cfg.validate().is_ok(), "accepted an invalid record");
        assert_eq!(cfg.use_city_id_mode, !cfg.weather_city_id.is_empty());
    }
});
