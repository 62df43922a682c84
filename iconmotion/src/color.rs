//! RGBA color and the palettes effects interpolate between

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ColorError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Componentwise linear interpolation, t is clamped to [0, 1]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Opacity as a fraction, what svg calls fill-opacity
    pub fn opacity(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// `#rrggbb`, ignoring alpha; pair with [`Color::opacity`]
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);
    pub const RED: Self = Self::rgb(0xF4, 0x43, 0x36);
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(hex) = s.strip_prefix('#') else {
            return Err(ColorError::InvalidFormat(s.to_string()));
        };
        // from_str_radix alone would take a sign, e.g. "+f"
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidFormat(s.to_string()));
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let a = if hex.len() == 8 { byte(6)? } else { 0xFF };
        Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a == 0xFF {
            write!(f, "{}", self.to_hex_rgb())
        } else {
            write!(f, "{}{:02x}", self.to_hex_rgb(), self.a)
        }
    }
}

/// The four colors bubbles cycle through
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubblesColor {
    pub dot_primary: Color,
    pub dot_secondary: Color,
    pub dot_third: Color,
    pub dot_last: Color,
}

impl BubblesColor {
    pub fn as_array(&self) -> [Color; 4] {
        [
            self.dot_primary,
            self.dot_secondary,
            self.dot_third,
            self.dot_last,
        ]
    }
}

impl Default for BubblesColor {
    fn default() -> Self {
        // Taken from https://m2.material.io/design/color/the-color-system.html#tools-for-picking-colors
        // "2014 Material Design color palettes"
        Self {
            dot_primary: Color::rgb(0xFF, 0xC1, 0x07),
            dot_secondary: Color::rgb(0xFF, 0x98, 0x00),
            dot_third: Color::rgb(0xFF, 0x57, 0x22),
            dot_last: Color::rgb(0xF4, 0x43, 0x36),
        }
    }
}

/// The two colors the expanding circle moves between
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleColor {
    pub start: Color,
    pub end: Color,
}

impl Default for CircleColor {
    fn default() -> Self {
        Self {
            start: Color::rgb(0xFF, 0x57, 0x22),
            end: Color::rgb(0xFF, 0xC1, 0x07),
        }
    }
}

/// Distinct colors for plotting several series side by side, cycles after nine
pub fn nth_series_color(n: usize) -> Color {
    const COLORS: [Color; 9] = [
        Color::rgb(0x3F, 0x51, 0xB5),
        Color::rgb(0xE9, 0x1E, 0x63),
        Color::rgb(0x00, 0x96, 0x88),
        Color::rgb(0xFF, 0x98, 0x00),
        Color::rgb(0x9C, 0x27, 0xB0),
        Color::rgb(0x4C, 0xAF, 0x50),
        Color::rgb(0x21, 0x96, 0xF3),
        Color::rgb(0x79, 0x55, 0x48),
        Color::rgb(0x60, 0x7D, 0x8B),
    ];
    COLORS[n % COLORS.len()]
}

#[cfg(test)]
mod tests {
    use crate::error::ColorError;

    use super::{nth_series_color, Color};

    #[test]
    fn series_colors_cycle() {
        assert_eq!(nth_series_color(2), nth_series_color(11));
        assert_ne!(nth_series_color(0), nth_series_color(1));
    }

    #[test]
    fn parse_rgb() {
        assert_eq!(Ok(Color::rgb(0xF4, 0x43, 0x36)), "#f44336".parse());
    }

    #[test]
    fn parse_rgba() {
        assert_eq!(Ok(Color::rgba(0, 0, 0, 0x80)), "#00000080".parse());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            Err(ColorError::InvalidFormat("f44336".to_string())),
            "f44336".parse::<Color>()
        );
        assert_eq!(
            Err(ColorError::InvalidFormat("#gg4336".to_string())),
            "#gg4336".parse::<Color>()
        );
        assert!("#fff".parse::<Color>().is_err());
    }

    #[test]
    fn parse_rejects_signed_digits() {
        assert_eq!(
            Err(ColorError::InvalidFormat("#+f+f+f".to_string())),
            "#+f+f+f".parse::<Color>()
        );
        assert!("#-1-1-1".parse::<Color>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = Color::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!("#12345678", color.to_string());
        assert_eq!(Ok(Color::RED), Color::RED.to_string().parse());
    }

    #[test]
    fn lerp_endpoints_and_middle() {
        let (a, b) = (Color::BLACK, Color::WHITE);
        assert_eq!(a, a.lerp(b, 0.0));
        assert_eq!(b, a.lerp(b, 1.0));
        assert_eq!(Color::rgb(128, 128, 128), a.lerp(b, 0.5));
        assert_eq!(b, a.lerp(b, 7.0), "t should clamp");
    }
}
