//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production).  Every line starts with a
//! fixed tag so a serial capture can be grepped per concern.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::Gesture { gesture, at } => {
                info!("TOUCH | gesture={:?} x={} y={}", gesture, at.x, at.y);
            }
            AppEvent::MenuSelected(button) => {
                info!("MENU | button={} \"{}\"", button.number(), button.label());
            }
            AppEvent::WeatherFetched { state, temperature } => {
                info!("WEATHER | state={:?} temp={:.1}", state, temperature);
            }
            AppEvent::RequestReceived(kind) => {
                info!("HTTP | request={}", kind);
            }
            AppEvent::SettingsSaved => {
                info!("SETTINGS | saved");
            }
            AppEvent::SettingsFailed => {
                warn!("SETTINGS | load or save failed");
            }
            AppEvent::Halting(reason) => {
                info!("HALT | reason={}", reason);
            }
        }
    }
}
