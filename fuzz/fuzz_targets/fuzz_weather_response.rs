//! Fuzz target: OpenWeatherMap response parsing
//!
//! Arbitrary status codes and bodies must map to either a report or a
//! fetch error, never a panic.  A 200 that parses carries a description
//! that fits the status line.
//!
//! cargo fuzz run fuzz_weather_response

#![no_main]

use flipclock::adapters::weather_client::parse_response;
use flipclock::weather::{STATUS_TEXT_LEN, TemperatureUnit};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let status = u16::from_le_bytes([data[0], data[1]]) % 600;
    let body = &data[2..];

    if let Ok(report) = parse_response(status, body, TemperatureUnit::Celsius) {
        assert_eq!(status, 200);
        assert!(report.is_ok());
        assert!(report.text.len() <= STATUS_TEXT_LEN);
    }
});
