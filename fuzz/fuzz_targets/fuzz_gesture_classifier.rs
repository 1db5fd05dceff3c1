//! Fuzz target: `GestureClassifier::classify`
//!
//! Each input byte is one poll: the low bit is contact, the next bits are
//! the time step, the rest pick a coordinate.  The classifier must never
//! panic, never emit two gestures for one sample and always settle once
//! the panel stays released.
//!
//! cargo fuzz run fuzz_gesture_classifier

#![no_main]

use flipclock::gesture::{Gesture, GestureClassifier, TouchSample};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut c = GestureClassifier::new();
    let mut t: u64 = 0;

    for &b in data {
        let pressed = b & 1 == 1;
        t += u64::from((b >> 1) & 0x07) * 10;
        let x = u16::from(b) * 3;
        let y = u16::from(b >> 2) * 5;
        let sample = if pressed {
            TouchSample::pressed_at(x, y, t)
        } else {
            TouchSample::released(t)
        };
        let _ = c.classify(&sample, t);
        let p = c.last_point();
        assert!(p.x < 320 && p.y < 240, "last point off screen");
    }

    // Release and wait out every window.
    for _ in 0..300 {
        t += 20;
        let _ = c.classify(&TouchSample::released(t), t);
    }
    assert_eq!(c.classify(&TouchSample::released(t + 20), t + 20), Gesture::None);
    assert_eq!(c.pending_presses(), 0);
});
