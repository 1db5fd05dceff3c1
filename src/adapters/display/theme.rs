//! Colours and fonts for every screen.

use embedded_graphics::pixelcolor::Rgb565;
use u8g2_fonts::{fonts, FontRenderer};

/// RGB565 colour from its packed 16-bit form (the TFT_eSPI notation).
pub const fn rgb565(raw: u16) -> Rgb565 {
    Rgb565::new(
        ((raw >> 11) & 0x1F) as u8,
        ((raw >> 5) & 0x3F) as u8,
        (raw & 0x1F) as u8,
    )
}

// ---------------------------------------------------------------------------
// Base palette
// ---------------------------------------------------------------------------

pub const BLACK: Rgb565 = rgb565(0x0000);
pub const WHITE: Rgb565 = rgb565(0xFFFF);
pub const RED: Rgb565 = rgb565(0xF800);
pub const GREEN: Rgb565 = rgb565(0x07E0);
pub const YELLOW: Rgb565 = rgb565(0xFFE0);
pub const ORANGE: Rgb565 = rgb565(0xFDA0);
pub const CYAN: Rgb565 = rgb565(0x07FF);
pub const SKY_BLUE: Rgb565 = rgb565(0x867D);
pub const LIGHT_GREY: Rgb565 = rgb565(0xD69A);

pub const BACKGROUND: Rgb565 = BLACK;
pub const CARD: Rgb565 = rgb565(0x2104);
pub const CARD_TEXT: Rgb565 = WHITE;
pub const COLON: Rgb565 = WHITE;
pub const WEATHER_TEXT: Rgb565 = LIGHT_GREY;

// ---------------------------------------------------------------------------
// Weather icons
// ---------------------------------------------------------------------------

pub const ICON_SUN: Rgb565 = YELLOW;
pub const ICON_MOON: Rgb565 = rgb565(0x751C);
pub const ICON_RAIN: Rgb565 = rgb565(0x64BD);
pub const ICON_THUNDER: Rgb565 = ORANGE;
pub const ICON_CLOUDS: Rgb565 = LIGHT_GREY;
pub const ICON_FOG: Rgb565 = rgb565(0x9CD3);
pub const ICON_SNOW: Rgb565 = WHITE;
pub const ICON_UNKNOWN: Rgb565 = RED;
/// Every icon when multi-colour icons are off.
pub const ICON_MONO: Rgb565 = LIGHT_GREY;

// ---------------------------------------------------------------------------
// Menu buttons, top to bottom
// ---------------------------------------------------------------------------

pub const MENU_BUTTON_COLORS: [Rgb565; 5] = [SKY_BLUE, ORANGE, CYAN, RED, GREEN];

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

/// Flip-card digits.
pub const DIGIT_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_logisoso62_tn>();
pub const TITLE_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvB18_tf>();
pub const BODY_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvB12_tf>();
pub const SMALL_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvR10_tf>();
pub const TEMP_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_helvB24_tf>();
