use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGB color. Equality and hashing are by exact channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse a palette key such as `"(12, 34, 56)"` or `"12,34,56"`.
    ///
    /// Components past the third are ignored. Returns `None` when fewer than
    /// three components are present or any of the first three is not a
    /// number in `0..=255`.
    pub fn parse_key(key: &str) -> Option<Self> {
        let trimmed = key.trim().trim_start_matches('(').trim_end_matches(')');
        let mut parts = trimmed.split(',').map(|p| p.trim().parse::<u8>());
        let r = parts.next()?.ok()?;
        let g = parts.next()?.ok()?;
        let b = parts.next()?.ok()?;
        Some(Color { r, g, b })
    }
}

impl From<[u8; 3]> for Color {
    fn from(c: [u8; 3]) -> Self {
        Color::new(c[0], c[1], c[2])
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::new(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Perceptual distance between two colors using the "redmean" weighting.
///
/// Red and blue errors are weighted by the mean red level of the pair.
pub fn color_distance(a: Color, b: Color) -> f64 {
    let (r1, g1, b1) = (a.r as f64, a.g as f64, a.b as f64);
    let (r2, g2, b2) = (b.r as f64, b.g as f64, b.b as f64);
    let r_mean = (r1 + r2) / 2.0;

    let dr = r1 - r2;
    let dg = g1 - g2;
    let db = b1 - b2;

    ((2.0 + r_mean / 256.0) * dr * dr
        + 4.0 * dg * dg
        + (2.0 + (255.0 - r_mean) / 256.0) * db * db)
        .sqrt()
}
