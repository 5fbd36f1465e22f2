use crate::block_mapping::BlockMapping;
use crate::downsample::{downsample, Cell};
use crate::palette::PaletteIndex;
use crate::pixel_grid::PixelGrid;
use log::warn;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Deduplicated block names in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPalette {
    names: Vec<SmolStr>,
    index: FxHashMap<SmolStr, usize>,
}

impl BlockPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `name`, appending it if it has not been seen yet.
    pub fn get_or_insert(&mut self, name: &SmolStr) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.clone());
        self.index.insert(name.clone(), i);
        i
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(SmolStr::as_str)
    }
}

impl<S: Into<SmolStr>> FromIterator<S> for BlockPalette {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut palette = BlockPalette::new();
        for name in iter {
            let name: SmolStr = name.into();
            palette.get_or_insert(&name);
        }
        palette
    }
}

/// A `width x height x depth` grid of block palette ids.
///
/// Ids are stored z-major, then y, then x, which is also the order the
/// schematic's block data is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    width: usize,
    height: usize,
    depth: usize,
    blocks: Vec<usize>,
    palette: BlockPalette,
    fallback_cells: usize,
}

impl VoxelGrid {
    /// Downsample `pixels` to the target size and classify every cell against
    /// `palette_index`. The result is a single layer deep.
    pub fn generate(
        pixels: &PixelGrid,
        palette_index: &PaletteIndex,
        target_width: usize,
        target_height: usize,
    ) -> Self {
        let width = target_width.max(1);
        let height = target_height.max(1);
        let cells = downsample(pixels, width, height);
        Self::classify(width, height, &cells, palette_index)
    }

    /// Build a single-layer grid from caller-supplied `cells`. Returns `None`
    /// unless the cells cover every position of `width x height` exactly once.
    pub fn from_cells(
        width: usize,
        height: usize,
        cells: &[Cell],
        palette_index: &PaletteIndex,
    ) -> Option<Self> {
        if width == 0 || height == 0 || cells.len() != width * height {
            return None;
        }
        let mut seen = vec![false; cells.len()];
        for cell in cells {
            if cell.x >= width || cell.y >= height {
                return None;
            }
            let slot = &mut seen[cell.y * width + cell.x];
            if *slot {
                return None;
            }
            *slot = true;
        }
        Some(Self::classify(width, height, cells, palette_index))
    }

    /// Classification runs in parallel; palette ids are then assigned in one
    /// sequential row-major pass so the id order is reproducible. `cells` must
    /// cover the grid.
    fn classify(
        width: usize,
        height: usize,
        cells: &[Cell],
        palette_index: &PaletteIndex,
    ) -> Self {
        let matches: Vec<(&BlockMapping, bool)> = cells
            .par_iter()
            .map(|cell| palette_index.find_closest(cell.color))
            .collect();

        let mut palette = BlockPalette::new();
        let mut blocks = vec![0usize; width * height];
        let mut fallback_cells = 0;
        for (cell, (mapping, matched)) in cells.iter().zip(matches) {
            if !matched {
                fallback_cells += 1;
            }
            blocks[cell.y * width + cell.x] = palette.get_or_insert(&mapping.name);
        }

        if fallback_cells > 0 {
            warn!(
                "{} cells had no palette match and used {}",
                fallback_cells,
                palette_index.fallback()
            );
        }

        VoxelGrid {
            width,
            height,
            depth: 1,
            blocks,
            palette,
            fallback_cells,
        }
    }

    /// Assemble a grid from raw ids. Returns `None` when the id count does not
    /// match the dimensions or an id is out of palette range.
    pub fn from_parts(
        (width, height, depth): (usize, usize, usize),
        blocks: Vec<usize>,
        palette: BlockPalette,
    ) -> Option<Self> {
        if blocks.len() != width * height * depth || blocks.iter().any(|&b| b >= palette.len()) {
            return None;
        }
        Some(VoxelGrid {
            width,
            height,
            depth,
            blocks,
            palette,
            fallback_cells: 0,
        })
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height + y) * self.width + x
    }

    pub fn get_block_id(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        Some(self.blocks[self.index(x, y, z)])
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Option<&str> {
        self.get_block_id(x, y, z).and_then(|id| self.palette.get(id))
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    pub fn palette(&self) -> &BlockPalette {
        &self.palette
    }

    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    /// Number of cells that were filled with the palette index's fallback block.
    pub fn fallback_cells(&self) -> usize {
        self.fallback_cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn two_color_index() -> PaletteIndex {
        PaletteIndex::load([
            (Color::new(255, 0, 0), BlockMapping::new("red_concrete")),
            (Color::new(0, 0, 255), BlockMapping::new("blue_concrete")),
            (Color::new(250, 5, 5), BlockMapping::new("red_concrete").with_data(1)),
        ])
        .unwrap()
    }

    #[test]
    fn test_palette_is_first_seen_and_deduplicated() {
        let pixels = PixelGrid::from_rows(vec![vec![
            Color::new(0, 0, 255),
            Color::new(255, 0, 0),
            Color::new(250, 5, 5),
            Color::new(0, 0, 250),
        ]])
        .unwrap();
        let grid = VoxelGrid::generate(&pixels, &two_color_index(), 4, 1);

        assert_eq!(
            grid.palette().iter().collect::<Vec<_>>(),
            vec!["blue_concrete", "red_concrete"]
        );
        assert_eq!(grid.blocks(), &[0, 1, 1, 0]);
        assert!(grid.blocks().iter().all(|&b| b < grid.palette().len()));
        assert_eq!(grid.fallback_cells(), 0);
    }

    #[test]
    fn test_generate_is_single_layer() {
        let pixels = PixelGrid::from_rows(vec![
            vec![Color::new(255, 0, 0); 4],
            vec![Color::new(0, 0, 255); 4],
        ])
        .unwrap();
        let grid = VoxelGrid::generate(&pixels, &two_color_index(), 2, 2);
        assert_eq!(grid.dimensions(), (2, 2, 1));
        assert_eq!(grid.get_block(1, 0, 0), Some("red_concrete"));
        assert_eq!(grid.get_block(0, 1, 0), Some("blue_concrete"));
        assert_eq!(grid.get_block(0, 0, 1), None);
        assert_eq!(grid.get_block(2, 0, 0), None);
    }

    #[test]
    fn test_empty_index_uses_fallback_as_regular_block() {
        let pixels = PixelGrid::from_rows(vec![vec![Color::new(1, 2, 3); 2]]).unwrap();
        let grid = VoxelGrid::generate(&pixels, &PaletteIndex::new(), 2, 1);
        assert_eq!(
            grid.palette().iter().collect::<Vec<_>>(),
            vec![crate::block_mapping::FALLBACK_BLOCK]
        );
        assert_eq!(grid.blocks(), &[0, 0]);
        assert_eq!(grid.fallback_cells(), 2);
    }

    #[test]
    fn test_from_cells_rejects_foreign_cells() {
        let index = two_color_index();
        let red = Color::new(255, 0, 0);
        let cell = |x, y| Cell { x, y, color: red };

        let grid = VoxelGrid::from_cells(2, 1, &[cell(1, 0), cell(0, 0)], &index).unwrap();
        assert_eq!(grid.blocks(), &[0, 0]);

        assert!(VoxelGrid::from_cells(2, 1, &[cell(0, 0), cell(5, 0)], &index).is_none());
        assert!(VoxelGrid::from_cells(2, 1, &[cell(0, 0), cell(0, 1)], &index).is_none());
        assert!(VoxelGrid::from_cells(2, 1, &[cell(0, 0), cell(0, 0)], &index).is_none());
        assert!(VoxelGrid::from_cells(2, 1, &[cell(0, 0)], &index).is_none());
        assert!(VoxelGrid::from_cells(0, 0, &[], &index).is_none());
    }

    #[test]
    fn test_from_parts_validates() {
        let palette: BlockPalette = ["a", "b", "a"].into_iter().collect();
        assert_eq!(palette.len(), 2);
        assert!(VoxelGrid::from_parts((2, 1, 1), vec![0, 1], palette.clone()).is_some());
        assert!(VoxelGrid::from_parts((2, 1, 1), vec![0, 2], palette.clone()).is_none());
        assert!(VoxelGrid::from_parts((3, 1, 1), vec![0, 1], palette).is_none());
    }
}
