//! XPT2046 resistive touch controller driver.
//!
//! Generic over an `embedded-hal` 1.0 [`SpiDevice`] and the controller's
//! active-low pen IRQ [`InputPin`], so the same code runs against the
//! ESP-IDF SPI driver and against host mocks.
//!
//! A sample counts as pressed only when the IRQ line is low *and* the
//! measured pressure clears [`Z_THRESHOLD`].  Bus errors read as "not
//! pressed"; the gesture classifier's debounce absorbs the glitch.

use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::app::ports::TouchPort;
use crate::error::TouchError;
use crate::gesture::TouchSample;
use crate::layout::{TouchPoint, DISPLAY_HEIGHT, DISPLAY_WIDTH};

// ── Controller commands (12-bit, differential, PENIRQ kept enabled) ──

const CMD_X: u8 = 0xD1;
const CMD_Y: u8 = 0x91;
const CMD_Z1: u8 = 0xB1;
const CMD_Z2: u8 = 0xC1;
/// Last conversion with power-down bits cleared, re-arms PENIRQ.
const CMD_X_POWER_DOWN: u8 = 0xD0;

/// Minimum pressure for a real touch.
pub const Z_THRESHOLD: i32 = 400;

// ── Calibration for the 2.8" CYD panel ──

const X_MIN_RAW: i32 = 1000;
const X_MAX_RAW: i32 = 4000;
const Y_MIN_RAW: i32 = 250;
const Y_MAX_RAW: i32 = 4800;
/// Raw X lands on the short axis, raw Y on the long one.
const SCREEN_X_SPAN: i32 = DISPLAY_HEIGHT as i32;
const SCREEN_Y_SPAN: i32 = DISPLAY_WIDTH as i32;

/// Raw 12-bit controller reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPoint {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

/// Integer linear re-map, same rounding as the Arduino `map()`.
fn map_range(v: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    (v - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Raw panel coordinates to screen coordinates.
///
/// The panel is mounted rotated.  Raw Y maps over 0..320 and the inverted
/// raw X over 0..240; the two results are then swapped, so screen X
/// follows the inverted raw X and screen Y follows raw Y.
pub fn calibrate(raw: RawPoint) -> TouchPoint {
    let long = map_range(i32::from(raw.y), Y_MIN_RAW, Y_MAX_RAW, 0, SCREEN_Y_SPAN);
    let short = map_range(i32::from(raw.x), X_MAX_RAW, X_MIN_RAW, 0, SCREEN_X_SPAN);
    let (x, y) = (short, long);
    let to_u16 = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
    TouchPoint::clamped(to_u16(x), to_u16(y))
}

fn median3(mut v: [u16; 3]) -> u16 {
    v.sort_unstable();
    v[1]
}

pub struct Xpt2046<SPI, IRQ> {
    spi: SPI,
    irq: IRQ,
    error_count: u32,
}

impl<SPI, IRQ> Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice,
    IRQ: InputPin,
{
    pub fn new(spi: SPI, irq: IRQ) -> Self {
        Self {
            spi,
            irq,
            error_count: 0,
        }
    }

    /// Bus or IRQ failures seen so far.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    fn read_channel(&mut self, cmd: u8) -> Result<u16, TouchError> {
        let mut buf = [cmd, 0, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| TouchError::Spi)?;
        Ok(((u16::from(buf[1]) << 8) | u16::from(buf[2])) >> 3)
    }

    /// One filtered reading, `None` while the pen is up.
    pub fn read_raw(&mut self) -> Result<Option<RawPoint>, TouchError> {
        if self.irq.is_high().map_err(|_| TouchError::Irq)? {
            return Ok(None);
        }

        let z1 = i32::from(self.read_channel(CMD_Z1)?);
        let z2 = i32::from(self.read_channel(CMD_Z2)?);
        let z = z1 + 4095 - z2;
        if z < Z_THRESHOLD {
            self.read_channel(CMD_X_POWER_DOWN)?;
            return Ok(None);
        }

        let mut xs = [0u16; 3];
        let mut ys = [0u16; 3];
        for i in 0..3 {
            xs[i] = self.read_channel(CMD_X)?;
            ys[i] = self.read_channel(CMD_Y)?;
        }
        self.read_channel(CMD_X_POWER_DOWN)?;

        Ok(Some(RawPoint {
            x: median3(xs),
            y: median3(ys),
            z: z.clamp(0, 4095) as u16,
        }))
    }
}

impl<SPI, IRQ> TouchPort for Xpt2046<SPI, IRQ>
where
    SPI: SpiDevice,
    IRQ: InputPin,
{
    fn poll_touch(&mut self, now_ms: u64) -> TouchSample {
        match self.read_raw() {
            Ok(Some(raw)) => {
                let p = calibrate(raw);
                TouchSample::pressed_at(p.x, p.y, now_ms)
            }
            Ok(None) => TouchSample::released(now_ms),
            Err(e) => {
                self.error_count = self.error_count.wrapping_add(1);
                debug!("Touch: read failed ({}), {} errors total", e, self.error_count);
                TouchSample::released(now_ms)
            }
        }
    }
}
