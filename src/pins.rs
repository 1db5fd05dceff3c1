//! GPIO assignments for the ESP32-2432S028R ("Cheap Yellow Display").
//!
//! Every driver references this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// ILI9341 TFT (HSPI)
// ---------------------------------------------------------------------------

pub const TFT_SCLK_GPIO: i32 = 14;
pub const TFT_MOSI_GPIO: i32 = 13;
pub const TFT_MISO_GPIO: i32 = 12;
pub const TFT_CS_GPIO: i32 = 15;
pub const TFT_DC_GPIO: i32 = 2;
/// Backlight enable, active HIGH.
pub const BACKLIGHT_GPIO: i32 = 21;
/// SPI clock for the panel.
pub const TFT_SPI_HZ: u32 = 40_000_000;

// ---------------------------------------------------------------------------
// XPT2046 touch controller (VSPI, separate bus from the panel)
// ---------------------------------------------------------------------------

pub const TOUCH_SCLK_GPIO: i32 = 25;
pub const TOUCH_MOSI_GPIO: i32 = 32;
pub const TOUCH_MISO_GPIO: i32 = 39;
pub const TOUCH_CS_GPIO: i32 = 33;
/// Pen IRQ, active LOW.  RTC-capable, so it doubles as the deep-sleep wake line.
pub const TOUCH_IRQ_GPIO: i32 = 36;
/// The XPT2046 tops out around 2.5 MHz.
pub const TOUCH_SPI_HZ: u32 = 2_000_000;
