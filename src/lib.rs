//! Turn raster images into single-layer block pixel art stored as Sponge
//! `.schem` schematics.
//!
//! The pipeline averages image regions down to the target size, matches every
//! averaged color against a palette of block colors and writes the resulting
//! grid as NBT.

pub mod block_mapping;
pub mod color;
pub mod converter;
pub mod downsample;
pub mod error;
pub mod formats;
pub mod palette;
pub mod palette_source;
pub mod pixel_grid;
pub mod settings;
pub mod voxel_grid;

pub use block_mapping::BlockMapping;
pub use color::{color_distance, Color};
pub use converter::{ConversionSummary, Converter};
pub use error::{ConvertError, Result};
pub use palette::PaletteIndex;
pub use pixel_grid::PixelGrid;
pub use settings::ConvertSettings;
pub use voxel_grid::{BlockPalette, VoxelGrid};
