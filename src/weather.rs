//! Weather refresh gate.
//!
//! Rate-limits the (slow, unreliable) weather fetch and tracks whether the
//! latest observation differs enough from the last one to justify a panel
//! redraw.  Failures are data: every outcome, good or bad, is a
//! [`WeatherReport`] carrying one [`WeatherState`].

use heapless::String;
use serde::{Deserialize, Serialize};

/// Default refresh interval (one hour).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60 * 60 * 1000;
/// Temperature delta below which a new reading is not worth a redraw.
pub const TEMPERATURE_EPSILON: f32 = 0.1;
/// Capacity of the status / description text.
pub const STATUS_TEXT_LEN: usize = 48;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Outcome of the most recent fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherState {
    /// Temperature and description are valid.
    Ok,
    /// No API key configured.
    NoKey,
    /// Location (city or city id) missing.
    ConfigError,
    /// Network, HTTP or parse failure; retried at the next interval.
    TransientError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub const fn from_fahrenheit_flag(use_fahrenheit: bool) -> Self {
        if use_fahrenheit {
            Self::Fahrenheit
        } else {
            Self::Celsius
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    /// OpenWeatherMap `units=` value.
    pub const fn api_units(self) -> &'static str {
        match self {
            Self::Celsius => "metric",
            Self::Fahrenheit => "imperial",
        }
    }
}

/// One weather observation (or the reason there is none).
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub state: WeatherState,
    pub temperature: f32,
    pub unit: TemperatureUnit,
    /// Description when `Ok`, human-readable status text otherwise.
    pub text: String<STATUS_TEXT_LEN>,
}

impl WeatherReport {
    pub fn ok(temperature: f32, unit: TemperatureUnit, description: &str) -> Self {
        Self {
            state: WeatherState::Ok,
            temperature,
            unit,
            text: bounded(description),
        }
    }

    pub fn failed(state: WeatherState, unit: TemperatureUnit, status: &str) -> Self {
        Self {
            state,
            temperature: 0.0,
            unit,
            text: bounded(status),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == WeatherState::Ok
    }

    /// Whether `self` looks different enough from `prev` to redraw.
    fn differs_from(&self, prev: &Self) -> bool {
        self.state != prev.state
            || self.text != prev.text
            || self.unit != prev.unit
            || (self.is_ok() && (self.temperature - prev.temperature).abs() > TEMPERATURE_EPSILON)
    }
}

/// Copy `s` into a bounded string, cutting at a char boundary if too long.
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

pub struct WeatherGate {
    interval_ms: u64,
    last_attempt_ms: Option<u64>,
    report: Option<WeatherReport>,
    changed: bool,
}

impl Default for WeatherGate {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL_MS)
    }
}

impl WeatherGate {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_attempt_ms: None,
            report: None,
            changed: false,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    /// True if nothing has been attempted yet or the interval has elapsed.
    pub fn due_for_refresh(&self, now_ms: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Advance the throttle regardless of the outcome.
    pub fn record_attempt(&mut self, now_ms: u64) {
        self.last_attempt_ms = Some(now_ms);
    }

    /// Store an outcome; raises the change flag when it differs from the
    /// previous one (the first outcome always counts as a change).
    pub fn record_result(&mut self, report: WeatherReport) {
        let differs = self.report.as_ref().is_none_or(|prev| report.differs_from(prev));
        if differs {
            self.changed = true;
        }
        // A failure keeps the last good temperature around for logging.
        let report = match (&self.report, report.is_ok()) {
            (Some(prev), false) => WeatherReport {
                temperature: prev.temperature,
                ..report
            },
            _ => report,
        };
        self.report = Some(report);
    }

    /// Returns `true` once per observed change, then clears the flag.
    pub fn changed(&mut self) -> bool {
        core::mem::take(&mut self.changed)
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    pub fn last_attempt_ms(&self) -> Option<u64> {
        self.last_attempt_ms
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn due_again_exactly_after_interval(
            interval in 1u64..10_000_000,
            start in 0u64..1_000_000_000,
            offset in 0u64..20_000_000,
        ) {
            let mut gate = WeatherGate::new(interval);
            prop_assert!(gate.due_for_refresh(start));
            gate.record_attempt(start);
            prop_assert_eq!(gate.due_for_refresh(start + offset), offset >= interval);
        }

        #[test]
        fn changed_fires_at_most_once_per_result(temps in proptest::collection::vec(-40.0f32..50.0, 1..30)) {
            let mut gate = WeatherGate::default();
            for t in temps {
                gate.record_result(WeatherReport::ok(t, TemperatureUnit::Celsius, "Clouds"));
                gate.changed();
                prop_assert!(!gate.changed());
            }
        }
    }
}
