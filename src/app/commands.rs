//! Inbound requests to the application service.
//!
//! The configuration web server runs in its own task; its handlers turn
//! each HTTP request into a [`ServerRequest`] and queue it.  The main loop
//! drains one per pass through
//! [`ConfigServerPort`](super::ports::ConfigServerPort) and the
//! [`AppService`](super::service::AppService) acts on it.

use crate::config::ClockConfig;

/// Requests the outside world can make of the running clock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum ServerRequest {
    /// Persist new settings, then restart to apply them.
    SaveSettings(ClockConfig),

    /// Restart immediately.
    Reboot,

    /// Enter deep sleep (wake on touch).
    Sleep,

    /// Flip the backlight on/off.
    ToggleBacklight,
}

impl ServerRequest {
    /// Short tag for structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SaveSettings(_) => "save_settings",
            Self::Reboot => "reboot",
            Self::Sleep => "sleep",
            Self::ToggleBacklight => "toggle_backlight",
        }
    }
}
