use crate::error::Result;
use crate::formats::schem;
use crate::palette::PaletteIndex;
use crate::palette_source;
use crate::pixel_grid::PixelGrid;
use crate::settings::ConvertSettings;
use crate::voxel_grid::VoxelGrid;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Aspect ratios closer than this are treated as equal.
const RATIO_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub output_path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub block_count: usize,
    pub palette_len: usize,
    pub fallback_cells: usize,
    pub elapsed: Duration,
}

/// Fit `target` to the aspect ratio of `original`, keeping the limiting axis.
pub fn best_ratio(original: (usize, usize), target: (usize, usize)) -> (usize, usize) {
    let (orig_w, orig_h) = (original.0.max(1) as f64, original.1.max(1) as f64);
    let (target_w, target_h) = (target.0.max(1), target.1.max(1));
    let orig_ratio = orig_w / orig_h;
    let target_ratio = target_w as f64 / target_h as f64;

    if (orig_ratio - target_ratio).abs() < RATIO_TOLERANCE {
        return (target_w, target_h);
    }

    if orig_ratio > target_ratio {
        (target_w, ((target_w as f64 / orig_ratio) as usize).max(1))
    } else {
        (((target_h as f64 * orig_ratio) as usize).max(1), target_h)
    }
}

/// Decide the voxel grid size. No target means the native image size.
pub fn resolve_target_size(
    original: (usize, usize),
    target: Option<(usize, usize)>,
    keep_aspect_ratio: bool,
) -> (usize, usize) {
    match target {
        None => (original.0.max(1), original.1.max(1)),
        Some(target) if keep_aspect_ratio => best_ratio(original, target),
        Some((w, h)) => (w.max(1), h.max(1)),
    }
}

/// Runs the whole pipeline: palette, image, sizing, classification, output.
pub struct Converter {
    settings: ConvertSettings,
}

impl Converter {
    pub fn new(settings: ConvertSettings) -> Self {
        Converter { settings }
    }

    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    pub fn load_palette(&self) -> Result<PaletteIndex> {
        palette_source::load_palette(&self.settings.block_dir, &self.settings.selected_blocks)
    }

    /// Convert the image at `input` into a schematic at `output`.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        target: Option<(usize, usize)>,
    ) -> Result<ConversionSummary> {
        let start = Instant::now();
        let palette = self.load_palette()?;
        let pixels = PixelGrid::open(input)?;
        debug!(
            "Decoded {} ({}x{})",
            input.display(),
            pixels.width(),
            pixels.height()
        );
        self.run(&pixels, &palette, output, target, start)
    }

    /// Convert already decoded pixels with an already loaded palette.
    pub fn convert_pixels(
        &self,
        pixels: &PixelGrid,
        palette: &PaletteIndex,
        output: &Path,
        target: Option<(usize, usize)>,
    ) -> Result<ConversionSummary> {
        self.run(pixels, palette, output, target, Instant::now())
    }

    fn run(
        &self,
        pixels: &PixelGrid,
        palette: &PaletteIndex,
        output: &Path,
        target: Option<(usize, usize)>,
        start: Instant,
    ) -> Result<ConversionSummary> {
        let (width, height) =
            resolve_target_size(pixels.dimensions(), target, self.settings.keep_aspect_ratio);
        schem::check_size(width, height)?;
        if let Some(requested) = target {
            if requested != (width, height) {
                info!(
                    "Using {}x{} instead of {}x{} (source is {}x{})",
                    width,
                    height,
                    requested.0,
                    requested.1,
                    pixels.width(),
                    pixels.height()
                );
            }
        }

        let grid = VoxelGrid::generate(pixels, palette, width, height);
        debug!(
            "Classified {} cells into {} block types",
            grid.volume(),
            grid.palette().len()
        );

        let output = schem::with_schem_extension(output);
        let name = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let options = self
            .settings
            .schem_options(&name, chrono::Utc::now().timestamp_millis());
        let output_path = schem::save_schem(&output, &grid, &options)?;

        let summary = ConversionSummary {
            output_path,
            width,
            height,
            block_count: grid.volume(),
            palette_len: grid.palette().len(),
            fallback_cells: grid.fallback_cells(),
            elapsed: start.elapsed(),
        };
        info!(
            "Converted to {} ({}x{}, {} blocks)",
            summary.output_path.display(),
            summary.width,
            summary.height,
            summary.block_count
        );
        Ok(summary)
    }
}
