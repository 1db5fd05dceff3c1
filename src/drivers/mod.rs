//! Peripheral drivers: touch controller, backlight and task watchdog.

pub mod backlight;
pub mod touch;
pub mod watchdog;
