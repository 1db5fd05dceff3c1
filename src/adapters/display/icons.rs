//! Weather condition icons.
//!
//! Conditions are classified from the OpenWeatherMap description with the
//! same precedence the Meteocons glyph table used (`'r'` thunder first,
//! generic `'N'` cloud last, `'!'` for anything unknown), then drawn from
//! primitives so no icon font has to ship in flash.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Polyline, Rectangle, Triangle};

use super::theme;

/// Clear sky counts as day from 06:00 up to (not including) 20:00.
pub const DAY_START_HOUR: u8 = 6;
pub const NIGHT_START_HOUR: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Thunder,
    Drizzle,
    Rain,
    Snow,
    Mist,
    Sun,
    Moon,
    BrokenClouds,
    ScatteredClouds,
    FewClouds,
    Overcast,
    Clouds,
    Unknown,
}

impl WeatherIcon {
    /// Classify a description.  `hour` is the local hour (0..=23) and only
    /// matters for clear skies.
    pub fn for_description(description: &str, hour: u8) -> Self {
        let d = description.to_ascii_lowercase();
        let has = |needle: &str| d.contains(needle);

        if has("thunderstorm") {
            Self::Thunder
        } else if has("drizzle") {
            Self::Drizzle
        } else if has("rain") {
            Self::Rain
        } else if has("snow") {
            Self::Snow
        } else if has("mist") || has("fog") {
            Self::Mist
        } else if has("clear sky") {
            if (DAY_START_HOUR..NIGHT_START_HOUR).contains(&hour) {
                Self::Sun
            } else {
                Self::Moon
            }
        } else if has("broken clouds") {
            Self::BrokenClouds
        } else if has("scattered clouds") {
            Self::ScatteredClouds
        } else if has("few clouds") {
            Self::FewClouds
        } else if has("overcast clouds") {
            Self::Overcast
        } else if has("clouds") {
            Self::Clouds
        } else {
            Self::Unknown
        }
    }

    /// The Meteocons glyph for this condition.
    pub const fn glyph(self) -> char {
        match self {
            Self::Thunder => 'r',
            Self::Drizzle => 'Q',
            Self::Rain => 'R',
            Self::Snow => 'W',
            Self::Mist => 'M',
            Self::Sun => 'B',
            Self::Moon => 'C',
            Self::BrokenClouds => 'Y',
            Self::ScatteredClouds => 'H',
            Self::FewClouds => 'E',
            Self::Overcast => 'S',
            Self::Clouds => 'N',
            Self::Unknown => '!',
        }
    }

    pub const fn color(self, multi_color: bool) -> Rgb565 {
        if !multi_color {
            return theme::ICON_MONO;
        }
        match self {
            Self::Thunder => theme::ICON_THUNDER,
            Self::Drizzle | Self::Rain => theme::ICON_RAIN,
            Self::Snow => theme::ICON_SNOW,
            Self::Mist => theme::ICON_FOG,
            Self::Sun => theme::ICON_SUN,
            Self::Moon => theme::ICON_MOON,
            Self::BrokenClouds
            | Self::ScatteredClouds
            | Self::FewClouds
            | Self::Overcast
            | Self::Clouds => theme::ICON_CLOUDS,
            Self::Unknown => theme::ICON_UNKNOWN,
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing (every icon fits a 40 × 40 box around `center`)
// ---------------------------------------------------------------------------

fn fill(color: Rgb565) -> PrimitiveStyle<Rgb565> {
    PrimitiveStyle::with_fill(color)
}

fn stroke(color: Rgb565) -> PrimitiveStyle<Rgb565> {
    PrimitiveStyle::with_stroke(color, 2)
}

fn cloud<D>(d: &mut D, c: Point, scale: u32, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let s = scale as i32;
    Circle::with_center(c + Point::new(-6 * s / 4, 2 * s / 4), 12 * scale / 4)
        .into_styled(fill(color))
        .draw(d)?;
    Circle::with_center(c + Point::new(0, -3 * s / 4), 16 * scale / 4)
        .into_styled(fill(color))
        .draw(d)?;
    Circle::with_center(c + Point::new(7 * s / 4, s / 4), 13 * scale / 4)
        .into_styled(fill(color))
        .draw(d)?;
    Rectangle::new(c + Point::new(-6 * s / 4, s / 4), Size::new(13 * scale / 4, 6 * scale / 4))
        .into_styled(fill(color))
        .draw(d)
}

fn sun<D>(d: &mut D, c: Point, radius: i32, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Circle::with_center(c, (radius * 2) as u32)
        .into_styled(fill(color))
        .draw(d)?;
    const RAYS: [(i32, i32); 8] = [(10, 0), (7, 7), (0, 10), (-7, 7), (-10, 0), (-7, -7), (0, -10), (7, -7)];
    for (dx, dy) in RAYS {
        let inner = c + Point::new(dx * (radius + 3) / 10, dy * (radius + 3) / 10);
        let outer = c + Point::new(dx * (radius + 8) / 10, dy * (radius + 8) / 10);
        Line::new(inner, outer).into_styled(stroke(color)).draw(d)?;
    }
    Ok(())
}

/// Draw `icon` centred on `center`, erasing its box to `bg` first.
pub fn draw<D>(d: &mut D, icon: WeatherIcon, center: Point, color: Rgb565, bg: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Rectangle::with_center(center, Size::new(44, 44))
        .into_styled(fill(bg))
        .draw(d)?;

    let c = center;
    match icon {
        WeatherIcon::Sun => sun(d, c, 9, color)?,
        WeatherIcon::Moon => {
            Circle::with_center(c, 26).into_styled(fill(color)).draw(d)?;
            Circle::with_center(c + Point::new(7, -5), 22)
                .into_styled(fill(bg))
                .draw(d)?;
        }
        WeatherIcon::FewClouds => {
            sun(d, c + Point::new(-7, -8), 6, color)?;
            cloud(d, c + Point::new(3, 4), 3, bg)?;
            cloud(d, c + Point::new(3, 5), 3, color)?;
        }
        WeatherIcon::ScatteredClouds | WeatherIcon::Clouds => cloud(d, c, 4, color)?,
        WeatherIcon::BrokenClouds => {
            cloud(d, c + Point::new(5, -6), 3, color)?;
            cloud(d, c + Point::new(-3, 5), 3, bg)?;
            cloud(d, c + Point::new(-3, 6), 3, color)?;
        }
        WeatherIcon::Overcast => cloud(d, c, 5, color)?,
        WeatherIcon::Rain | WeatherIcon::Drizzle => {
            let top = c + Point::new(0, -6);
            cloud(d, top, 4, color)?;
            for dx in [-9, 0, 9] {
                let start = c + Point::new(dx, 8);
                if icon == WeatherIcon::Rain {
                    Line::new(start, start + Point::new(-4, 10))
                        .into_styled(stroke(color))
                        .draw(d)?;
                } else {
                    Circle::with_center(start + Point::new(-2, 5), 4)
                        .into_styled(fill(color))
                        .draw(d)?;
                }
            }
        }
        WeatherIcon::Thunder => {
            cloud(d, c + Point::new(0, -6), 4, color)?;
            let bolt = [
                c + Point::new(2, 6),
                c + Point::new(-4, 13),
                c + Point::new(2, 13),
                c + Point::new(-3, 20),
            ];
            Polyline::new(&bolt).into_styled(stroke(color)).draw(d)?;
        }
        WeatherIcon::Snow => {
            cloud(d, c + Point::new(0, -6), 4, color)?;
            for dx in [-10, 0, 10] {
                let flake = c + Point::new(dx, 14);
                Line::new(flake + Point::new(-3, 0), flake + Point::new(3, 0))
                    .into_styled(stroke(color))
                    .draw(d)?;
                Line::new(flake + Point::new(0, -3), flake + Point::new(0, 3))
                    .into_styled(stroke(color))
                    .draw(d)?;
            }
        }
        WeatherIcon::Mist => {
            for (i, w) in [28, 36, 24].into_iter().enumerate() {
                let y = c.y - 10 + 10 * i as i32;
                Line::new(Point::new(c.x - w / 2, y), Point::new(c.x + w / 2, y))
                    .into_styled(stroke(color))
                    .draw(d)?;
            }
        }
        WeatherIcon::Unknown => {
            Triangle::new(c + Point::new(0, -16), c + Point::new(-16, 14), c + Point::new(16, 14))
                .into_styled(stroke(color))
                .draw(d)?;
            Line::new(c + Point::new(0, -6), c + Point::new(0, 4))
                .into_styled(stroke(color))
                .draw(d)?;
            Circle::with_center(c + Point::new(0, 9), 3)
                .into_styled(fill(color))
                .draw(d)?;
        }
    }
    Ok(())
}
