//! TFT renderer: implements [`RenderPort`] on any RGB565 `DrawTarget`.
//!
//! On the device the target is the mipidsi ILI9341 driver; tests use an
//! in-memory frame.  The clock face is two flip cards (hours, minutes),
//! a date card underneath and the weather panel along the bottom:
//!
//! ```text
//!   ┌────────┐   ┌────────┐
//!   │   07   │ : │   42   │   y = 12..124
//!   │────────│   │────────│
//!   └──────PM┘   └────────┘
//!   ┌─────────────────────┐
//!   │   Sat Oct 17 2026   │   y = 132..162
//!   └─────────────────────┘
//!   (icon) 72°F
//!          Light Rain           y = 168..240
//! ```
//!
//! The last drawn time and date strings are cached so `update_clock` only
//! repaints the cards whose text changed.

pub mod icons;
pub mod theme;

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, CornerRadii, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle,
};
use heapless::String;
use log::{debug, warn};
use u8g2_fonts::types::{FontColor, HorizontalAlignment, VerticalPosition};
use u8g2_fonts::FontRenderer;

use crate::adapters::time::SystemClock;
use crate::adapters::wifi::{PORTAL_IP, PORTAL_SSID};
use crate::app::ports::{NetworkInfo, Notice, RenderPort};
use crate::config::ClockConfig;
use crate::layout::{self, MenuButton};
use crate::weather::WeatherReport;

use icons::WeatherIcon;

// ---------------------------------------------------------------------------
// Clock face geometry
// ---------------------------------------------------------------------------

const HOUR_CARD: layout::Rect = layout::Rect::new(12, 12, 136, 112);
const MINUTE_CARD: layout::Rect = layout::Rect::new(172, 12, 136, 112);
const DATE_CARD: layout::Rect = layout::Rect::new(12, 132, 296, 30);
const WEATHER_PANEL: layout::Rect = layout::Rect::new(0, 168, 320, 72);
const CARD_RADIUS: u32 = 8;
const COLON_X: i32 = 160;
const COLON_DOT_Y: [i32; 2] = [52, 84];

const ICON_CENTER: Point = Point::new(36, 204);
const WEATHER_TEXT_X: i32 = 72;

/// Shown until SNTP has set the wall clock.
const TIME_PLACEHOLDER: &str = "--:--";
const DATE_PLACEHOLDER: &str = "Syncing time...";

const CENTER_X: i32 = layout::DISPLAY_WIDTH as i32 / 2;
const CENTER_Y: i32 = layout::DISPLAY_HEIGHT as i32 / 2;

fn to_eg(r: layout::Rect) -> Rectangle {
    Rectangle::new(
        Point::new(i32::from(r.x), i32::from(r.y)),
        Size::new(u32::from(r.w), u32::from(r.h)),
    )
}

fn center_of(r: layout::Rect) -> Point {
    to_eg(r).center()
}

/// `"07:42 PM"` → (`"07"`, `"42"`, `"PM"`); `"19:42"` → (`"19"`, `"42"`, `""`).
fn split_time(text: &str) -> (&str, &str, &str) {
    (
        text.get(0..2).unwrap_or("--"),
        text.get(3..5).unwrap_or("--"),
        text.get(6..).unwrap_or(""),
    )
}

/// `72°F`, rounded to whole degrees.
fn temperature_text(report: &WeatherReport) -> String<16> {
    let mut s = String::new();
    let _ = write!(s, "{:.0}\u{b0}{}", report.temperature, report.unit.symbol());
    s
}

// ---------------------------------------------------------------------------
// TftRenderer
// ---------------------------------------------------------------------------

pub struct TftRenderer<D> {
    display: D,
    clock: SystemClock,
    format_24h: bool,
    multi_color_icons: bool,
    last_time: Option<String<8>>,
    last_date: Option<String<16>>,
}

impl<D> TftRenderer<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    /// Display preferences are read once; settings changes restart the clock.
    pub fn new(display: D, clock: SystemClock, config: &ClockConfig) -> Self {
        Self {
            display,
            clock,
            format_24h: config.time_format_24h,
            multi_color_icons: config.use_multi_color_icons,
            last_time: None,
            last_date: None,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn clock(&self) -> &SystemClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SystemClock {
        &mut self.clock
    }

    fn current_texts(&self) -> (String<8>, String<16>) {
        match self.clock.local_time() {
            Some(t) => (t.time_text(self.format_24h), t.date_text()),
            None => (
                crate::weather::bounded(TIME_PLACEHOLDER),
                crate::weather::bounded(DATE_PLACEHOLDER),
            ),
        }
    }

    // ── Primitive helpers ──

    fn text(
        &mut self,
        font: &FontRenderer,
        s: &str,
        at: Point,
        v: VerticalPosition,
        h: HorizontalAlignment,
        color: Rgb565,
    ) -> Result<(), D::Error> {
        match font.render_aligned(s, at, v, h, FontColor::Transparent(color), &mut self.display) {
            Ok(_) => Ok(()),
            Err(u8g2_fonts::Error::DisplayError(e)) => Err(e),
            Err(u8g2_fonts::Error::GlyphNotFound(c)) => {
                debug!("Display: no glyph for {:?} in {:?}", c, s);
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }

    fn centered(&mut self, font: &FontRenderer, s: &str, at: Point, color: Rgb565) -> Result<(), D::Error> {
        self.text(font, s, at, VerticalPosition::Center, HorizontalAlignment::Center, color)
    }

    fn fill_rect(&mut self, r: layout::Rect, color: Rgb565) -> Result<(), D::Error> {
        to_eg(r)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.display)
    }

    fn card(&mut self, r: layout::Rect) -> Result<(), D::Error> {
        self.fill_rect(r, theme::BACKGROUND)?;
        RoundedRectangle::new(to_eg(r), CornerRadii::new(Size::new(CARD_RADIUS, CARD_RADIUS)))
            .into_styled(PrimitiveStyle::with_fill(theme::CARD))
            .draw(&mut self.display)
    }

    // ── Clock face ──

    fn paint_flip_card(&mut self, r: layout::Rect, digits: &str, suffix: &str) -> Result<(), D::Error> {
        self.card(r)?;
        let c = center_of(r);
        self.centered(&theme::DIGIT_FONT, digits, c, theme::CARD_TEXT)?;

        // Hinge across the middle of the card.
        Rectangle::new(Point::new(i32::from(r.x), c.y - 1), Size::new(u32::from(r.w), 2))
            .into_styled(PrimitiveStyle::with_fill(theme::BACKGROUND))
            .draw(&mut self.display)?;

        if !suffix.is_empty() {
            let corner = Point::new(i32::from(r.right()) - 6, i32::from(r.bottom()) - 4);
            self.text(
                &theme::SMALL_FONT,
                suffix,
                corner,
                VerticalPosition::Bottom,
                HorizontalAlignment::Right,
                theme::CARD_TEXT,
            )?;
        }
        Ok(())
    }

    fn paint_colon(&mut self) -> Result<(), D::Error> {
        for y in COLON_DOT_Y {
            Circle::with_center(Point::new(COLON_X, y), 8)
                .into_styled(PrimitiveStyle::with_fill(theme::COLON))
                .draw(&mut self.display)?;
        }
        Ok(())
    }

    fn paint_date(&mut self, date: &str) -> Result<(), D::Error> {
        self.card(DATE_CARD)?;
        self.centered(&theme::BODY_FONT, date, center_of(DATE_CARD), theme::CARD_TEXT)
    }

    fn paint_clock(&mut self) -> Result<(), D::Error> {
        self.display.clear(theme::BACKGROUND)?;
        let (time, date) = self.current_texts();
        let (hh, mm, suffix) = split_time(&time);
        self.paint_flip_card(HOUR_CARD, hh, suffix)?;
        self.paint_flip_card(MINUTE_CARD, mm, "")?;
        self.paint_colon()?;
        self.paint_date(&date)?;
        self.last_time = Some(time);
        self.last_date = Some(date);
        Ok(())
    }

    fn refresh_clock(&mut self) -> Result<(), D::Error> {
        let (time, date) = self.current_texts();

        if self.last_time.as_ref() != Some(&time) {
            let old = self.last_time.clone().unwrap_or_default();
            let (old_hh, old_mm, old_suffix) = split_time(&old);
            let (hh, mm, suffix) = split_time(&time);
            if old.is_empty() || hh != old_hh || suffix != old_suffix {
                self.paint_flip_card(HOUR_CARD, hh, suffix)?;
            }
            if old.is_empty() || mm != old_mm {
                self.paint_flip_card(MINUTE_CARD, mm, "")?;
            }
            self.last_time = Some(time);
        }

        if self.last_date.as_ref() != Some(&date) {
            self.paint_date(&date)?;
            self.last_date = Some(date);
        }
        Ok(())
    }

    // ── Weather ──

    fn paint_weather(&mut self, report: &WeatherReport) -> Result<(), D::Error> {
        self.fill_rect(WEATHER_PANEL, theme::BACKGROUND)?;

        if !report.is_ok() {
            return self.centered(
                &theme::BODY_FONT,
                &report.text,
                center_of(WEATHER_PANEL),
                theme::WEATHER_TEXT,
            );
        }

        let hour = self.clock.local_time().map_or(12, |t| t.hour);
        let icon = WeatherIcon::for_description(&report.text, hour);
        icons::draw(
            &mut self.display,
            icon,
            ICON_CENTER,
            icon.color(self.multi_color_icons),
            theme::BACKGROUND,
        )?;

        let temp = temperature_text(report);
        self.text(
            &theme::TEMP_FONT,
            &temp,
            Point::new(WEATHER_TEXT_X, 192),
            VerticalPosition::Center,
            HorizontalAlignment::Left,
            theme::CARD_TEXT,
        )?;
        self.text(
            &theme::BODY_FONT,
            &report.text,
            Point::new(WEATHER_TEXT_X, 224),
            VerticalPosition::Center,
            HorizontalAlignment::Left,
            theme::WEATHER_TEXT,
        )
    }

    // ── Menu and info screens ──

    fn paint_menu(&mut self) -> Result<(), D::Error> {
        self.display.clear(theme::BACKGROUND)?;
        self.centered(&theme::TITLE_FONT, "Settings Menu", Point::new(CENTER_X, 20), theme::WHITE)?;

        for (button, color) in MenuButton::ALL.into_iter().zip(theme::MENU_BUTTON_COLORS) {
            let r = to_eg(button.rect());
            let style = PrimitiveStyleBuilder::new()
                .fill_color(color)
                .stroke_color(theme::WHITE)
                .stroke_width(1)
                .build();
            RoundedRectangle::with_equal_corners(r, Size::new(5, 5))
                .into_styled(style)
                .draw(&mut self.display)?;
            self.centered(&theme::BODY_FONT, button.label(), r.center() + Point::new(0, 1), theme::BLACK)?;
        }
        Ok(())
    }

    fn status_line(&mut self, y: i32, label: &str, value: &str, color: Rgb565) -> Result<(), D::Error> {
        self.text(
            &theme::BODY_FONT,
            label,
            Point::new(10, y),
            VerticalPosition::Top,
            HorizontalAlignment::Left,
            theme::WHITE,
        )?;
        self.text(
            &theme::BODY_FONT,
            value,
            Point::new(i32::from(layout::DISPLAY_WIDTH) - 10, y),
            VerticalPosition::Top,
            HorizontalAlignment::Right,
            color,
        )
    }

    fn paint_ip_info(&mut self, info: &NetworkInfo) -> Result<(), D::Error> {
        self.display.clear(theme::BACKGROUND)?;
        self.centered(&theme::TITLE_FONT, "IP Configuration", Point::new(CENTER_X, 20), theme::WHITE)?;
        self.centered(&theme::BODY_FONT, "Configuration URL:", Point::new(CENTER_X, 55), theme::WHITE)?;
        self.centered(&theme::TITLE_FONT, &info.config_url(), Point::new(CENTER_X, 85), theme::YELLOW)?;

        let (key, key_color) = if info.api_key_present {
            ("Yes", theme::GREEN)
        } else {
            ("No", theme::RED)
        };
        self.status_line(120, "Weather API Key Present:", key, key_color)?;

        let location_color = if info.location.ends_with("Not Set") {
            theme::RED
        } else {
            theme::GREEN
        };
        self.status_line(145, "Location Source:", &info.location, location_color)?;
        self.status_line(170, "Network:", &info.ssid, theme::WHITE)?;

        self.centered(
            &theme::BODY_FONT,
            "Tap to return to menu.",
            Point::new(CENTER_X, i32::from(layout::DISPLAY_HEIGHT) - 15),
            theme::WHITE,
        )
    }

    fn paint_portal(&mut self) -> Result<(), D::Error> {
        self.display.clear(theme::BACKGROUND)?;
        self.centered(&theme::TITLE_FONT, "Configuration Portal", Point::new(CENTER_X, 40), theme::WHITE)?;

        let mut go_to: String<32> = String::new();
        let _ = write!(go_to, "2. Go to {}", PORTAL_IP);
        let lines: [(&str, i32); 4] = [
            ("1. Connect to network:", 80),
            (PORTAL_SSID, 105),
            (&go_to, 130),
            ("3. Enter Wi-Fi/Settings", 160),
        ];
        for (line, y) in lines {
            self.centered(&theme::BODY_FONT, line, Point::new(CENTER_X, y), theme::WHITE)?;
        }
        Ok(())
    }

    fn paint_notice(&mut self, notice: Notice) -> Result<(), D::Error> {
        self.display.clear(theme::BACKGROUND)?;
        let color = match notice {
            Notice::Rebooting => theme::RED,
            _ => theme::WHITE,
        };
        self.centered(&theme::TITLE_FONT, notice.text(), Point::new(CENTER_X, CENTER_Y), color)
    }

    fn report(what: &str, result: Result<(), D::Error>) {
        if result.is_err() {
            warn!("Display: {} draw failed", what);
        }
    }
}

impl<D> RenderPort for TftRenderer<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn draw_clock_screen(&mut self) {
        self.last_time = None;
        self.last_date = None;
        let r = self.paint_clock();
        Self::report("clock", r);
    }

    fn update_clock(&mut self) {
        let r = self.refresh_clock();
        Self::report("clock update", r);
    }

    fn draw_menu_screen(&mut self) {
        let r = self.paint_menu();
        Self::report("menu", r);
    }

    fn draw_ip_info_screen(&mut self, info: &NetworkInfo) {
        let r = self.paint_ip_info(info);
        Self::report("ip info", r);
    }

    fn draw_portal_instructions(&mut self) {
        let r = self.paint_portal();
        Self::report("portal", r);
    }

    fn draw_notice(&mut self, notice: Notice) {
        let r = self.paint_notice(notice);
        Self::report("notice", r);

        #[cfg(target_os = "espidf")]
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(notice.hold_ms());
    }

    fn clear_weather_panel(&mut self) {
        let r = self.fill_rect(WEATHER_PANEL, theme::BACKGROUND);
        Self::report("weather clear", r);
    }

    fn draw_weather_panel(&mut self, report: &WeatherReport) {
        let r = self.paint_weather(report);
        Self::report("weather", r);
    }

    fn blank(&mut self) {
        self.last_time = None;
        self.last_date = None;
        let r = self.display.clear(theme::BACKGROUND);
        Self::report("blank", r);
    }
}
