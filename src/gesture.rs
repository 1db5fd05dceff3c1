//! Touch gesture classifier.
//!
//! Turns the polled, calibrated touch signal into discrete gestures.  The
//! classifier is context-free: it knows nothing about modes or buttons and
//! never fails.
//!
//! ## Gesture rules
//!
//! | Gesture     | Condition                                              |
//! |-------------|--------------------------------------------------------|
//! | (noise)     | Contact gone before `DEBOUNCE_MS` elapsed              |
//! | `LongPress` | Held >= `LONG_PRESS_MS`, emitted on release            |
//! | `Tap`       | One short press, emitted once the window expires       |
//! | `DoubleTap` | 2+ short presses each starting inside the open window  |
//!
//! ```text
//!  Released ──[contact]──▶ Debouncing ──[still down after 45 ms]──▶ Held
//!     ▲                        │                                    │
//!     └────────[lifted]────────┘                                    │
//!     └──────────────────────────[lifted: long or count++]──────────┘
//! ```
//!
//! The window check runs on every call, so a pending tap count is flushed
//! by the poll loop even when the panel is idle.  A press that began
//! inside the window keeps it open until that press resolves; this is how
//! a long press discards a pending count instead of racing it.

use crate::layout::TouchPoint;
use log::debug;

/// Minimum contact time before a press is trusted.
pub const DEBOUNCE_MS: u64 = 45;
/// Release-to-press gap within which a second press counts as a double tap.
pub const DOUBLE_TAP_WINDOW_MS: u64 = 600;
/// Hold time at which a press becomes a long press.
pub const LONG_PRESS_MS: u64 = 2000;
/// Main loop touch polling period.
pub const POLL_INTERVAL_MS: u64 = 20;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One reading of the touch controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchSample {
    pub pressed: bool,
    pub x: u16,
    pub y: u16,
    pub timestamp_ms: u64,
}

impl TouchSample {
    pub const fn released(timestamp_ms: u64) -> Self {
        Self {
            pressed: false,
            x: 0,
            y: 0,
            timestamp_ms,
        }
    }

    pub const fn pressed_at(x: u16, y: u16, timestamp_ms: u64) -> Self {
        Self {
            pressed: true,
            x,
            y,
            timestamp_ms,
        }
    }
}

/// Classified gesture.  At most one per [`GestureClassifier::classify`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    None,
    Tap,
    DoubleTap,
    LongPress,
}

impl Gesture {
    pub const fn is_some(self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    Released,
    /// Rising edge seen at `since_ms`, not yet trusted.
    Debouncing { since_ms: u64 },
    /// Trusted press that began at `since_ms`.
    Held { since_ms: u64 },
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct GestureClassifier {
    contact: Contact,
    last_release_ms: u64,
    pending_presses: u8,
    last_point: TouchPoint,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureClassifier {
    pub const fn new() -> Self {
        Self {
            contact: Contact::Released,
            last_release_ms: 0,
            pending_presses: 0,
            last_point: TouchPoint::new(0, 0),
        }
    }

    /// Forget every press in flight (used after wake from sleep).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Short presses counted in the currently open window.
    pub fn pending_presses(&self) -> u8 {
        self.pending_presses
    }

    /// True while a debounced press is held down.
    pub fn is_pressed(&self) -> bool {
        matches!(self.contact, Contact::Held { .. })
    }

    /// Last coordinate reported while the panel was touched.
    pub fn last_point(&self) -> TouchPoint {
        self.last_point
    }

    /// Feed one sample; returns the gesture completed by it, if any.
    pub fn classify(&mut self, sample: &TouchSample, now_ms: u64) -> Gesture {
        if sample.pressed {
            self.last_point = TouchPoint::clamped(sample.x, sample.y);
        }

        match self.contact {
            Contact::Released => {
                if sample.pressed {
                    self.contact = Contact::Debouncing { since_ms: now_ms };
                }
            }
            Contact::Debouncing { since_ms } => {
                if !sample.pressed {
                    debug!("touch: bounce rejected after {} ms", now_ms.saturating_sub(since_ms));
                    self.contact = Contact::Released;
                } else if now_ms.saturating_sub(since_ms) >= DEBOUNCE_MS {
                    self.contact = Contact::Held { since_ms };
                }
            }
            Contact::Held { since_ms } => {
                if !sample.pressed {
                    self.contact = Contact::Released;
                    if let Some(gesture) = self.on_release(since_ms, now_ms) {
                        return gesture;
                    }
                }
            }
        }

        self.flush_expired_window(now_ms)
    }

    fn on_release(&mut self, press_start_ms: u64, now_ms: u64) -> Option<Gesture> {
        let held_ms = now_ms.saturating_sub(press_start_ms);

        if held_ms >= LONG_PRESS_MS {
            debug!("touch: long press ({} ms), {} pending dropped", held_ms, self.pending_presses);
            self.pending_presses = 0;
            self.last_release_ms = now_ms;
            return Some(Gesture::LongPress);
        }

        self.pending_presses = if self.pending_presses > 0 && self.began_in_window(press_start_ms) {
            self.pending_presses.saturating_add(1)
        } else {
            1
        };
        self.last_release_ms = now_ms;
        None
    }

    fn flush_expired_window(&mut self, now_ms: u64) -> Gesture {
        if self.pending_presses == 0 {
            return Gesture::None;
        }
        if now_ms.saturating_sub(self.last_release_ms) <= DOUBLE_TAP_WINDOW_MS {
            return Gesture::None;
        }

        let open_press_start = match self.contact {
            Contact::Released => None,
            Contact::Debouncing { since_ms } | Contact::Held { since_ms } => Some(since_ms),
        };
        if open_press_start.is_some_and(|start| self.began_in_window(start)) {
            return Gesture::None;
        }

        let gesture = if self.pending_presses >= 2 {
            Gesture::DoubleTap
        } else {
            Gesture::Tap
        };
        self.pending_presses = 0;
        gesture
    }

    fn began_in_window(&self, press_start_ms: u64) -> bool {
        press_start_ms.saturating_sub(self.last_release_ms) <= DOUBLE_TAP_WINDOW_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the classifier at a fixed poll period over `[0, end_ms]`.
    /// `presses` are `[start, end)` contact intervals.
    pub(super) fn drive(presses: &[(u64, u64)], end_ms: u64, step_ms: u64) -> Vec<(u64, Gesture)> {
        let mut c = GestureClassifier::new();
        let mut out = Vec::new();
        let mut t = 0;
        while t <= end_ms {
            let down = presses.iter().any(|&(s, e)| t >= s && t < e);
            let sample = if down {
                TouchSample::pressed_at(100, 100, t)
            } else {
                TouchSample::released(t)
            };
            let g = c.classify(&sample, t);
            if g.is_some() {
                out.push((t, g));
            }
            t += step_ms;
        }
        out
    }

    #[test]
    fn idle_polls_emit_nothing() {
        assert!(drive(&[], 10_000, POLL_INTERVAL_MS).is_empty());
    }

    #[test]
    fn single_tap_emitted_after_window() {
        let events = drive(&[(100, 300)], 2_000, 10);
        assert_eq!(events, vec![(910, Gesture::Tap)]);
    }

    #[test]
    fn two_quick_taps_make_one_double_tap() {
        let events = drive(&[(100, 250), (500, 650)], 3_000, 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, Gesture::DoubleTap);
        assert!(events[0].0 > 650 + DOUBLE_TAP_WINDOW_MS);
    }

    #[test]
    fn slow_second_tap_gives_two_taps() {
        let events = drive(&[(100, 200), (1_000, 1_100)], 3_000, 10);
        let kinds: Vec<_> = events.iter().map(|e| e.1).collect();
        assert_eq!(kinds, vec![Gesture::Tap, Gesture::Tap]);
    }

    #[test]
    fn triple_tap_still_reports_double() {
        let events = drive(&[(100, 200), (400, 500), (700, 800)], 3_000, 10);
        let kinds: Vec<_> = events.iter().map(|e| e.1).collect();
        assert_eq!(kinds, vec![Gesture::DoubleTap]);
    }

    #[test]
    fn long_press_emitted_on_release() {
        let events = drive(&[(100, 2_300)], 5_000, 10);
        assert_eq!(events, vec![(2_300, Gesture::LongPress)]);
    }

    #[test]
    fn back_to_back_long_presses_each_emit() {
        let events = drive(&[(0, 2_100), (2_200, 4_300), (4_400, 6_500)], 8_000, POLL_INTERVAL_MS);
        assert_eq!(
            events,
            vec![
                (2_100, Gesture::LongPress),
                (4_300, Gesture::LongPress),
                (6_500, Gesture::LongPress),
            ]
        );
    }

    #[test]
    fn long_press_discards_pending_tap() {
        // Tap, then a long press that begins inside the window.
        let events = drive(&[(100, 200), (500, 2_800)], 5_000, 10);
        assert_eq!(events, vec![(2_800, Gesture::LongPress)]);
    }

    #[test]
    fn bounce_shorter_than_debounce_is_ignored() {
        let events = drive(&[(100, 130)], 2_000, 10);
        assert!(events.is_empty());
    }

    #[test]
    fn coordinates_are_saturated() {
        let mut c = GestureClassifier::new();
        c.classify(&TouchSample::pressed_at(5_000, 4_000, 0), 0);
        assert_eq!(c.last_point(), TouchPoint::new(319, 239));
    }

    #[test]
    fn reset_drops_press_in_flight() {
        let mut c = GestureClassifier::new();
        c.classify(&TouchSample::pressed_at(10, 10, 0), 0);
        c.classify(&TouchSample::pressed_at(10, 10, 60), 60);
        assert!(c.is_pressed());
        c.reset();
        assert!(!c.is_pressed());
        // Release after reset does not complete a gesture.
        assert_eq!(c.classify(&TouchSample::released(200), 200), Gesture::None);
        assert_eq!(c.classify(&TouchSample::released(2_000), 2_000), Gesture::None);
    }

    #[test]
    fn pending_count_clears_after_emission() {
        let mut c = GestureClassifier::new();
        for (t, down) in [(0, true), (60, true), (120, false)] {
            let s = if down {
                TouchSample::pressed_at(1, 1, t)
            } else {
                TouchSample::released(t)
            };
            c.classify(&s, t);
        }
        assert_eq!(c.pending_presses(), 1);
        assert_eq!(c.classify(&TouchSample::released(800), 800), Gesture::Tap);
        assert_eq!(c.pending_presses(), 0);
    }
}
