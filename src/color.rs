//! Hex colour parsing for template styles.

use image::Rgba;

use crate::error::CardpressError;

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Placeholder fill for image slots without a picture.
    pub const PLACEHOLDER: Color = Color::rgb(0xf0, 0xf0, 0xf0);
    /// Label colour inside an empty image slot.
    pub const PLACEHOLDER_TEXT: Color = Color::rgb(0x99, 0x99, 0x99);
    /// Grid line colour of the editor preview.
    pub const GRID: Color = Color::rgb(0xe0, 0xe0, 0xe0);
    /// The faint outline drawn around a canvas that has no border style.
    pub const HAIRLINE: Color = Color::rgba(0, 0, 0, 13);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    ///
    /// ```
    /// use cardpress::color::Color;
    ///
    /// assert_eq!(Color::parse("#ff8000").unwrap(), Color::rgb(255, 128, 0));
    /// assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
    /// assert!(Color::parse("blue").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, CardpressError> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || CardpressError::Validation(format!("Invalid colour '{}'", s));

        if !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };

        match hex.len() {
            3 => Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(invalid()),
        }
    }

    /// Parse, falling back to `default` for missing or malformed values.
    pub fn parse_or(s: Option<&str>, default: Color) -> Self {
        s.and_then(|s| Color::parse(s).ok()).unwrap_or(default)
    }

    /// Multiply alpha by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let opacity = if opacity.is_finite() { opacity.clamp(0.0, 1.0) } else { 1.0 };
        Self {
            a: (self.a as f64 * opacity).round() as u8,
            ..self
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// CSS `rgba()` notation.
    pub fn to_css(self) -> String {
        let alpha = self.a as f64 / 255.0;
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, (alpha * 1000.0).round() / 1000.0)
    }
}

/// Source-over blend of `src` onto `dst`, with extra `coverage` in 0..=1.
///
/// Coverage carries anti-aliasing or clip-mask weights; `1.0` is a plain
/// paint of `src`.
#[inline]
pub fn blend_over(dst: &mut Rgba<u8>, src: Color, coverage: f32) {
    let sa = (src.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mix = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let c = (s * sa + d * da * (1.0 - sa)) / out_a;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(src.r, dst.0[0]),
        mix(src.g, dst.0[1]),
        mix(src.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ]);
}
