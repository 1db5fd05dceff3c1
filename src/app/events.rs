//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The shipped adapter writes
//! them to the serial log.

use crate::fsm::DeviceMode;
use crate::gesture::Gesture;
use crate::layout::{MenuButton, TouchPoint};
use crate::weather::WeatherState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(DeviceMode),

    /// The mode controller moved between modes.
    ModeChanged { from: DeviceMode, to: DeviceMode },

    /// A gesture was recognised.
    Gesture { gesture: Gesture, at: TouchPoint },

    /// A menu button was activated.
    MenuSelected(MenuButton),

    /// A weather fetch completed (successfully or not).
    WeatherFetched { state: WeatherState, temperature: f32 },

    /// A configuration server request was taken off the queue.
    RequestReceived(&'static str),

    /// Settings were written to storage.
    SettingsSaved,

    /// Settings could not be loaded or saved; defaults or the old record stay in use.
    SettingsFailed,

    /// The process is about to end (restart or deep sleep).
    Halting(&'static str),
}
