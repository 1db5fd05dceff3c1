//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (touch panel, display, settings store, Wi-Fi, HTTP
//! server, weather client, power control) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! Every port call either succeeds or reports a status value.  The only
//! typed errors crossing this boundary are settings persistence and
//! station connect failures, both of which the service turns into a mode
//! decision rather than propagating.

use core::fmt;
use core::net::Ipv4Addr;

use heapless::String;

use crate::config::{ClockConfig, SSID_LEN};
use crate::gesture::TouchSample;
use crate::weather::{WeatherReport, bounded};

use super::commands::ServerRequest;
use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Touch port (driven adapter: panel → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the resistive touch controller.
pub trait TouchPort {
    /// Sample the panel once.  Read failures report "not pressed".
    fn poll_touch(&mut self, now_ms: u64) -> TouchSample;
}

// ───────────────────────────────────────────────────────────────
// Render port (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Short full-screen confirmation shown before a fatal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    GoingToSleep,
    Rebooting,
    RestoringDefaults,
    SettingsSaved,
}

impl Notice {
    pub const fn text(self) -> &'static str {
        match self {
            Self::GoingToSleep => "Going to Sleep...",
            Self::Rebooting => "REBOOTING...",
            Self::RestoringDefaults => "Restoring defaults...",
            Self::SettingsSaved => "Settings saved",
        }
    }

    /// How long the notice stays up before the action runs.
    pub const fn hold_ms(self) -> u32 {
        match self {
            Self::GoingToSleep => 500,
            Self::Rebooting | Self::RestoringDefaults | Self::SettingsSaved => 1000,
        }
    }
}

/// Everything the IP information screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkInfo {
    pub ip: Option<Ipv4Addr>,
    pub ssid: String<SSID_LEN>,
    pub api_key_present: bool,
    /// Location line, e.g. `New York, US`, a city id, or `City Not Set`.
    pub location: String<56>,
}

impl NetworkInfo {
    /// Fill the settings-derived lines from `config`.
    pub fn with_settings(mut self, config: &ClockConfig) -> Self {
        self.api_key_present = config.has_api_key();
        // Over-long names are cut at the field capacity.
        self.location = if config.use_city_id_mode {
            if config.weather_city_id.is_empty() {
                bounded("ID Not Set")
            } else {
                bounded(&config.weather_city_id)
            }
        } else if config.weather_city.is_empty() {
            bounded("City Not Set")
        } else {
            bounded(&format!(
                "{}, {}",
                config.weather_city, config.weather_country_code
            ))
        };
        self
    }

    /// `<ip>/config`, or `0.0.0.0/config` while offline.
    pub fn config_url(&self) -> String<32> {
        bounded(&format!("{}/config", self.ip.unwrap_or(Ipv4Addr::UNSPECIFIED)))
    }
}

pub trait RenderPort {
    /// Full Clock repaint: static layout, time and date with caches reset.
    fn draw_clock_screen(&mut self);
    /// Repaint time/date only where the text changed.
    fn update_clock(&mut self);
    fn draw_menu_screen(&mut self);
    fn draw_ip_info_screen(&mut self, info: &NetworkInfo);
    fn draw_portal_instructions(&mut self);
    /// Show a notice and hold it for [`Notice::hold_ms`].
    fn draw_notice(&mut self, notice: Notice);
    fn clear_weather_panel(&mut self);
    fn draw_weather_panel(&mut self, report: &WeatherReport);
    /// Fill the panel with the background colour.
    fn blank(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the [`ClockConfig`] record.
///
/// Implementations MUST call [`ClockConfig::validate`] before persisting;
/// out-of-range values are rejected, not clamped.
pub trait SettingsPort {
    /// Returns [`ClockConfig::default()`] when nothing is stored.
    fn load(&mut self) -> Result<ClockConfig, SettingsError>;

    fn save(&mut self, config: &ClockConfig) -> Result<(), SettingsError>;

    /// Erase the stored record so the next boot starts from defaults.
    fn factory_reset(&mut self) -> Result<(), SettingsError>;
}

// ───────────────────────────────────────────────────────────────
// Provisioning port (driven adapter: domain ↔ Wi-Fi)
// ───────────────────────────────────────────────────────────────

pub trait ProvisioningPort {
    /// Join the configured network in station mode.
    fn connect(&mut self, config: &ClockConfig) -> Result<(), ProvisioningError>;

    /// Run the blocking SoftAP setup portal.  Returns the settings the
    /// owner submitted, or an error when the portal timed out or failed.
    fn start_provisioning_portal(
        &mut self,
        config: &ClockConfig,
    ) -> Result<ClockConfig, ProvisioningError>;

    fn is_connected(&self) -> bool;

    /// IP address and SSID of the station interface.
    fn network_info(&self) -> NetworkInfo;
}

// ───────────────────────────────────────────────────────────────
// Config server port (driving adapter: HTTP task → domain)
// ───────────────────────────────────────────────────────────────

pub trait ConfigServerPort {
    /// Take at most one queued request from the configuration web server.
    fn pump_pending_requests(&mut self) -> Option<ServerRequest>;
}

// ───────────────────────────────────────────────────────────────
// Weather port (driven adapter: domain → weather service)
// ───────────────────────────────────────────────────────────────

pub trait WeatherPort {
    /// One fetch attempt.  Never fails: every problem is a report state.
    fn attempt_fetch(&mut self, config: &ClockConfig) -> WeatherReport;
}

// ───────────────────────────────────────────────────────────────
// Power port (driven adapter: domain → SoC power control)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    /// Touch controller IRQ line pulled low.
    TouchIrq,
}

pub trait PowerPort {
    /// Arm `wake` and enter deep sleep.  Does not return on hardware.
    fn enter_low_power(&mut self, wake: WakeSource);
    /// Restart the SoC.  Does not return on hardware.
    fn restart(&mut self);
    fn set_backlight(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Every hardware-facing port the service drives, satisfied by one value.
///
/// Passing a single `&mut impl DevicePorts` avoids juggling several
/// mutable borrows while keeping each port boundary explicit.
pub trait DevicePorts:
    TouchPort + RenderPort + SettingsPort + ProvisioningPort + ConfigServerPort + WeatherPort + PowerPort
{
}

impl<T> DevicePorts for T where
    T: TouchPort
        + RenderPort
        + SettingsPort
        + ProvisioningPort
        + ConfigServerPort
        + WeatherPort
        + PowerPort
{
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SettingsPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Stored record failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`ProvisioningPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningError {
    /// No stored SSID.
    NoCredentials,
    /// Station connect failed after all retries.
    ConnectFailed,
    /// Portal closed without receiving settings.
    PortalTimeout,
    /// Wi-Fi driver or HTTP server error.
    Driver,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no Wi-Fi credentials"),
            Self::ConnectFailed => write!(f, "station connect failed"),
            Self::PortalTimeout => write!(f, "portal timed out"),
            Self::Driver => write!(f, "Wi-Fi driver error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CITY_LEN;

    #[test]
    fn location_line_for_city_mode() {
        let info = NetworkInfo::default().with_settings(&ClockConfig::default());
        assert_eq!(info.location.as_str(), "New York, US");
        assert!(!info.api_key_present);
    }

    #[test]
    fn location_line_for_missing_id() {
        let cfg = ClockConfig {
            use_city_id_mode: true,
            ..Default::default()
        };
        let info = NetworkInfo::default().with_settings(&cfg);
        assert_eq!(info.location.as_str(), "ID Not Set");
    }

    #[test]
    fn location_line_for_missing_city() {
        let cfg = ClockConfig {
            weather_city: bounded(""),
            weather_api_key: bounded("k"),
            ..Default::default()
        };
        let info = NetworkInfo::default().with_settings(&cfg);
        assert_eq!(info.location.as_str(), "City Not Set");
        assert!(info.api_key_present);
    }

    #[test]
    fn location_line_keeps_longest_city_whole() {
        let city = "x".repeat(CITY_LEN);
        let cfg = ClockConfig {
            weather_city: bounded(&city),
            ..Default::default()
        };
        let info = NetworkInfo::default().with_settings(&cfg);
        assert_eq!(info.location.as_str(), format!("{city}, US"));
    }

    #[test]
    fn config_url_uses_station_ip() {
        let info = NetworkInfo {
            ip: Some(Ipv4Addr::new(192, 168, 1, 42)),
            ..Default::default()
        };
        assert_eq!(info.config_url().as_str(), "192.168.1.42/config");
    }
}
