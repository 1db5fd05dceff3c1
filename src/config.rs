//! User settings record.
//!
//! Everything the owner can change from the configuration web page lives
//! here.  The record is persisted as a single postcard blob (see
//! [`crate::adapters::nvs`]) and validated before every save.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::SettingsError;
use crate::weather::{TemperatureUnit, bounded};

pub const SSID_LEN: usize = 32;
pub const PASSWORD_LEN: usize = 64;
pub const API_KEY_LEN: usize = 40;
pub const CITY_LEN: usize = 40;
pub const COUNTRY_CODE_LEN: usize = 4;
pub const CITY_ID_LEN: usize = 12;

/// Device settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    // --- Wi-Fi ---
    pub wifi_ssid: String<SSID_LEN>,
    pub wifi_password: String<PASSWORD_LEN>,

    // --- Time ---
    /// Offset from UTC in whole hours.
    pub gmt_offset_hr: i8,
    /// Idle minutes before sleeping; 0 disables idle sleep.
    pub sleep_timeout_min: u16,
    pub time_format_24h: bool,

    // --- Weather ---
    pub weather_api_key: String<API_KEY_LEN>,
    pub use_fahrenheit: bool,
    /// Query by numeric city id instead of city name + country.
    pub use_city_id_mode: bool,
    pub weather_city: String<CITY_LEN>,
    pub weather_country_code: String<COUNTRY_CODE_LEN>,
    pub weather_city_id: String<CITY_ID_LEN>,
    pub weather_interval_min: u16,

    // --- Display ---
    pub use_multi_color_icons: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),

            gmt_offset_hr: -5, // New York
            sleep_timeout_min: 5,
            time_format_24h: false,

            weather_api_key: String::new(),
            use_fahrenheit: true,
            use_city_id_mode: false,
            weather_city: bounded("New York"),
            weather_country_code: bounded("US"),
            weather_city_id: String::new(),
            weather_interval_min: 60,

            use_multi_color_icons: true,
        }
    }
}

impl ClockConfig {
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    pub fn has_api_key(&self) -> bool {
        !self.weather_api_key.is_empty()
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::from_fahrenheit_flag(self.use_fahrenheit)
    }

    /// Idle timeout in milliseconds, `None` when idle sleep is disabled.
    pub fn sleep_timeout_ms(&self) -> Option<u64> {
        match self.sleep_timeout_min {
            0 => None,
            min => Some(u64::from(min) * 60_000),
        }
    }

    pub fn weather_interval_ms(&self) -> u64 {
        u64::from(self.weather_interval_min) * 60_000
    }

    pub fn gmt_offset_secs(&self) -> i32 {
        i32::from(self.gmt_offset_hr) * 3600
    }

    /// Range-check every numeric field.  Out-of-range values are rejected,
    /// never clamped.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(-12..=14).contains(&self.gmt_offset_hr) {
            return Err(SettingsError::ValidationFailed(
                "gmt_offset_hr must be -12..=14",
            ));
        }
        if self.sleep_timeout_min > 1440 {
            return Err(SettingsError::ValidationFailed(
                "sleep_timeout_min must be 0..=1440",
            ));
        }
        if !(10..=1440).contains(&self.weather_interval_min) {
            return Err(SettingsError::ValidationFailed(
                "weather_interval_min must be 10..=1440",
            ));
        }
        if self.use_city_id_mode && !self.weather_city_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SettingsError::ValidationFailed(
                "weather_city_id must be numeric",
            ));
        }
        Ok(())
    }
}
