//! Colors and palettes

use std::fmt;

use crate::error::ThemeError;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or `#rgb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Result<Self, ThemeError> {
        let invalid = || ThemeError::InvalidColor(hex.to_string());
        let digits = hex.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&digits[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };

        match digits.len() {
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                a: byte(6)?,
                ..Color::rgb(byte(0)?, byte(2)?, byte(4)?)
            }),
            3 => Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            _ => Err(invalid()),
        }
    }

    /// Same color with a new alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Same color with alpha scaled by `opacity` (0.0 - 1.0)
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    /// Linear blend toward `other` (t = 0 keeps self)
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Ordered list of theme colors
///
/// Indexing wraps around, so modes can ask for any stop of a short palette.
/// An empty palette reads as opaque white.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    /// Parse every entry as a hex color
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, ThemeError> {
        hex.iter()
            .map(|h| Color::from_hex(h.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Color at `index`, wrapping past the end
    pub fn get(&self, index: usize) -> Color {
        if self.colors.is_empty() {
            return Color::WHITE;
        }
        self.colors[index % self.colors.len()]
    }

    /// Replace the color at `index`; returns false when out of range
    pub fn set(&mut self, index: usize, color: Color) -> bool {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::from_hex("#00f2ff").unwrap(), Color::rgb(0, 242, 255));
        assert_eq!(Color::from_hex("ff00e6").unwrap(), Color::rgb(255, 0, 230));
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#05050540").unwrap(), Color::rgb(5, 5, 5).with_alpha(0x40));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        assert!(Color::from_hex("#ééé").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_parse_hex_rejects_signs() {
        assert!(Color::from_hex("#+1+2+3").is_err());
        assert!(Color::from_hex("#-1-2-3").is_err());
        assert!(Color::from_hex("+f+").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let c = Color::rgb(0x29, 0x00, 0x38);
        assert_eq!(c.to_string(), "#290038");
        assert_eq!(c.with_alpha(0x40).to_string(), "#29003840");
    }

    #[test]
    fn test_palette_wraps() {
        let palette = Palette::new(vec![Color::BLACK, Color::WHITE, Color::rgb(1, 2, 3)]);
        assert_eq!(palette.get(4), Color::WHITE);
        assert_eq!(palette.get(3), Color::BLACK);
    }

    #[test]
    fn test_empty_palette_is_white() {
        assert_eq!(Palette::default().get(2), Color::WHITE);
    }

    #[test]
    fn test_opacity_and_lerp() {
        assert_eq!(Color::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.0), Color::BLACK);
    }
}
