use crate::color::Color;
use crate::error::{ConvertError, Result};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Row-major grid of decoded RGB pixels. Never has zero area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConvertError::ImageDecode(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }
        if pixels.len() != width * height {
            return Err(ConvertError::ImageDecode(format!(
                "expected {} pixels for {}x{}, got {}",
                width * height,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(PixelGrid {
            width,
            height,
            pixels,
        })
    }

    /// Build a grid from rows of equal length.
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ConvertError::ImageDecode("ragged pixel rows".to_string()));
        }
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    pub fn from_rgb_image(img: &RgbImage) -> Result<Self> {
        let pixels = img.pixels().map(|p| Color::from(p.0)).collect();
        Self::new(img.width() as usize, img.height() as usize, pixels)
    }

    /// Collapse any decoded image to RGB, discarding alpha.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        Self::from_rgb_image(&img.to_rgb8())
    }

    /// Decode an image file (format guessed from its contents and extension).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| ConvertError::ImageDecode(format!("{}: {}", path.display(), e)))?;
        Self::from_dynamic_image(&img)
    }

    pub fn from_memory(data: &[u8]) -> Result<Self> {
        let img =
            image::load_from_memory(data).map_err(|e| ConvertError::ImageDecode(e.to_string()))?;
        Self::from_dynamic_image(&img)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[Color] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}
