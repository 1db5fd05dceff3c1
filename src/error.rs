//! Unified error types for the FlipClock firmware.
//!
//! Bring-up code (settings store, GPIO) returns the crate-level [`Error`]
//! so `main` can use `?` uniformly.  Runtime faults never reach the mode
//! controller: adapters turn [`FetchError`] and [`TouchError`] into status
//! values (a [`WeatherReport`](crate::weather::WeatherReport), a released
//! [`TouchSample`](crate::gesture::TouchSample)) at the port boundary.

use core::fmt;

use crate::app::ports::SettingsError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The settings store could not be opened.
    Settings(SettingsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "settings: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

// ---------------------------------------------------------------------------
// Weather fetch errors
// ---------------------------------------------------------------------------

/// Why a weather fetch produced no observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Station interface not connected.
    WifiOffline,
    /// HTTP 401 from the weather service.
    InvalidApiKey,
    /// HTTP 404 from the weather service.
    LocationNotFound,
    /// Any other non-200 status.
    HttpStatus(u16),
    /// Connection, TLS or read failure before a status was received.
    Transport,
    /// Body was not the expected JSON document.
    Json,
}

impl FetchError {
    /// Short text shown in the weather panel.
    pub const fn status_text(self) -> &'static str {
        match self {
            Self::WifiOffline => "WiFi Offline",
            Self::InvalidApiKey => "Invalid API Key",
            Self::LocationNotFound => "Location Not Found",
            Self::HttpStatus(_) | Self::Transport => "HTTP Error",
            Self::Json => "JSON Error",
        }
    }

    /// Map an HTTP status code to an error; `None` for 200.
    pub const fn from_status(status: u16) -> Option<Self> {
        match status {
            200 => None,
            401 => Some(Self::InvalidApiKey),
            404 => Some(Self::LocationNotFound),
            other => Some(Self::HttpStatus(other)),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Transport => write!(f, "transport failure"),
            other => f.write_str(other.status_text()),
        }
    }
}

// ---------------------------------------------------------------------------
// Touch controller errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchError {
    /// SPI transfer to the XPT2046 failed.
    Spi,
    /// IRQ line could not be read.
    Irq,
}

impl fmt::Display for TouchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi => write!(f, "SPI transfer failed"),
            Self::Irq => write!(f, "IRQ read failed"),
        }
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_panel_text() {
        assert_eq!(FetchError::from_status(200), None);
        assert_eq!(
            FetchError::from_status(404).map(FetchError::status_text),
            Some("Location Not Found")
        );
        assert_eq!(
            FetchError::from_status(401).map(FetchError::status_text),
            Some("Invalid API Key")
        );
        assert_eq!(
            FetchError::from_status(500).map(FetchError::status_text),
            Some("HTTP Error")
        );
    }

    #[test]
    fn settings_error_converts_into_crate_error() {
        let e: Error = SettingsError::Corrupted.into();
        assert_eq!(e, Error::Settings(SettingsError::Corrupted));
        assert_eq!(e.to_string(), "settings: settings corrupted");
    }
}
