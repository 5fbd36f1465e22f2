use crate::block_mapping::BlockMapping;
use crate::color::{color_distance, Color};
use crate::error::{ConvertError, Result};
use rustc_hash::FxHashMap;

/// Color to block lookup used to classify averaged cell colors.
///
/// Entries keep the position of the first insertion of their color; a later
/// insert with the same color replaces the mapping in place. Scans therefore
/// always run in a fixed order and ties resolve to the earliest entry.
#[derive(Debug, Clone)]
pub struct PaletteIndex {
    entries: Vec<(Color, BlockMapping)>,
    index: FxHashMap<Color, usize>,
    fallback: BlockMapping,
}

impl Default for PaletteIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteIndex {
    pub fn new() -> Self {
        PaletteIndex {
            entries: Vec::new(),
            index: FxHashMap::default(),
            fallback: BlockMapping::fallback(),
        }
    }

    /// Build an index from `(color, block)` pairs. Later pairs overwrite
    /// earlier pairs sharing the same color.
    pub fn load<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Color, BlockMapping)>,
    {
        let mut palette = Self::new();
        palette.extend(entries);
        if palette.is_empty() {
            return Err(ConvertError::EmptyPalette);
        }
        Ok(palette)
    }

    /// Replace the block returned by [`find_closest`](Self::find_closest)
    /// when the index is empty.
    pub fn with_fallback(mut self, fallback: BlockMapping) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallback(&self) -> &BlockMapping {
        &self.fallback
    }

    /// Insert a mapping, returning the mapping it replaced if the color was
    /// already registered.
    pub fn insert(&mut self, color: Color, mapping: BlockMapping) -> Option<BlockMapping> {
        match self.index.get(&color) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, mapping)),
            None => {
                self.index.insert(color, self.entries.len());
                self.entries.push((color, mapping));
                None
            }
        }
    }

    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Color, BlockMapping)>,
    {
        for (color, mapping) in entries {
            self.insert(color, mapping);
        }
    }

    pub fn get(&self, color: Color) -> Option<&BlockMapping> {
        self.index.get(&color).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, &BlockMapping)> {
        self.entries.iter().map(|(c, m)| (*c, m))
    }

    /// Find the block whose registered color is perceptually closest to
    /// `target`.
    ///
    /// The second element is `false` when the index is empty and the fallback
    /// block was returned instead; this is not an error.
    pub fn find_closest(&self, target: Color) -> (&BlockMapping, bool) {
        if let Some(exact) = self.get(target) {
            return (exact, true);
        }

        let mut best: Option<&BlockMapping> = None;
        let mut best_distance = f64::MAX;
        for (color, mapping) in &self.entries {
            let distance = color_distance(target, *color);
            if distance < best_distance {
                best_distance = distance;
                best = Some(mapping);
            }
        }

        match best {
            Some(mapping) => (mapping, true),
            None => (&self.fallback, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> BlockMapping {
        BlockMapping::new("minecraft:red_concrete")
    }

    fn blue() -> BlockMapping {
        BlockMapping::new("minecraft:blue_concrete")
    }

    #[test]
    fn test_single_entry_matches_everything() {
        let palette = PaletteIndex::load([(Color::new(0, 0, 0), red())]).unwrap();
        for target in [
            Color::new(0, 0, 0),
            Color::new(255, 255, 255),
            Color::new(3, 200, 17),
        ] {
            let (block, matched) = palette.find_closest(target);
            assert!(matched);
            assert_eq!(block, &red());
        }
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let palette = PaletteIndex::load([
            (Color::new(255, 0, 0), red()),
            (Color::new(0, 0, 255), blue()),
            (Color::new(255, 0, 0), BlockMapping::new("minecraft:red_wool")),
        ])
        .unwrap();

        assert_eq!(palette.len(), 2);
        let colors: Vec<Color> = palette.iter().map(|(c, _)| c).collect();
        assert_eq!(colors, vec![Color::new(255, 0, 0), Color::new(0, 0, 255)]);
        assert_eq!(
            palette.get(Color::new(255, 0, 0)).map(|b| b.get_name()),
            Some("minecraft:red_wool")
        );
    }

    #[test]
    fn test_ties_resolve_to_first_inserted() {
        // Both candidates are exactly 10 green steps away from the target.
        let palette = PaletteIndex::load([
            (Color::new(0, 90, 0), red()),
            (Color::new(0, 110, 0), blue()),
        ])
        .unwrap();
        let (block, _) = palette.find_closest(Color::new(0, 100, 0));
        assert_eq!(block, &red());

        let reversed = PaletteIndex::load([
            (Color::new(0, 110, 0), blue()),
            (Color::new(0, 90, 0), red()),
        ])
        .unwrap();
        let (block, _) = reversed.find_closest(Color::new(0, 100, 0));
        assert_eq!(block, &blue());
    }

    #[test]
    fn test_nearest_color_wins() {
        let palette = PaletteIndex::load([
            (Color::new(255, 0, 0), red()),
            (Color::new(0, 0, 255), blue()),
        ])
        .unwrap();
        assert_eq!(palette.find_closest(Color::new(200, 30, 40)).0, &red());
        assert_eq!(palette.find_closest(Color::new(20, 30, 180)).0, &blue());
    }

    #[test]
    fn test_empty_palette() {
        assert!(matches!(
            PaletteIndex::load(Vec::new()),
            Err(ConvertError::EmptyPalette)
        ));

        let palette = PaletteIndex::new();
        let (block, matched) = palette.find_closest(Color::new(10, 20, 30));
        assert!(!matched);
        assert_eq!(block.get_name(), crate::block_mapping::FALLBACK_BLOCK);
        assert_eq!(block.data, 0);
    }
}
