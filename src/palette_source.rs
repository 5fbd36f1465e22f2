//! Loading of palette sources from a block directory.
//!
//! A source is a `<name>.json` file mapping color keys such as `"(R, G, B)"`
//! to either `{"block_name": ..., "block_data": ...}` or `[name, data]`.
//! Lines starting with `#` are comments; a leading `# text` line names the
//! source for display.

use crate::block_mapping::BlockMapping;
use crate::color::Color;
use crate::error::{ConvertError, Result};
use crate::palette::PaletteIndex;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSION: &str = "json";

/// A palette source file discovered in a block directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSource {
    pub name: String,
    pub display_name: String,
    pub path: PathBuf,
}

/// List the palette sources available in `block_dir`, sorted by name.
pub fn list_sources(block_dir: &Path) -> Result<Vec<PaletteSource>> {
    if !block_dir.is_dir() {
        return Err(ConvertError::PaletteSourceMissing(block_dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in fs::read_dir(block_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let name = name.to_string();
        let display_name = fs::read_to_string(&path)
            .ok()
            .and_then(|text| display_name(&text))
            .unwrap_or_else(|| name.clone());
        sources.push(PaletteSource {
            name,
            display_name,
            path,
        });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

/// Load the selected sources from `block_dir` into one palette index.
///
/// Sources are applied in `selected` order, so a later source overrides an
/// earlier one on equal colors. Unknown names, unreadable files and malformed
/// entries are skipped with a warning.
pub fn load_palette<S: AsRef<str>>(block_dir: &Path, selected: &[S]) -> Result<PaletteIndex> {
    if !block_dir.is_dir() {
        return Err(ConvertError::PaletteSourceMissing(block_dir.to_path_buf()));
    }

    let mut palette = PaletteIndex::new();
    for name in selected {
        let name = name.as_ref();
        let path = block_dir.join(format!("{}.{}", name, SOURCE_EXTENSION));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping palette source {}: {}", path.display(), e);
                continue;
            }
        };
        match parse_source(&text) {
            Ok(entries) => {
                debug!("Loaded {} mappings from {}", entries.len(), name);
                palette.extend(entries);
            }
            Err(e) => warn!("Skipping palette source {}: {}", path.display(), e),
        }
    }

    if palette.is_empty() {
        return Err(ConvertError::BlockMappingParse(format!(
            "no usable mappings in {} (selected: {})",
            block_dir.display(),
            selected
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    debug!("Palette holds {} colors", palette.len());
    Ok(palette)
}

/// Parse one source file's text into `(color, block)` pairs in file order.
///
/// Fails only when the text is not a JSON object; individual malformed
/// entries are dropped.
pub fn parse_source(text: &str) -> std::result::Result<Vec<(Color, BlockMapping)>, String> {
    let json: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let map: Map<String, Value> =
        serde_json::from_str(&json).map_err(|e| format!("Invalid JSON: {}", e))?;

    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in &map {
        let Some(color) = Color::parse_key(key) else {
            warn!("Skipping malformed color key {:?}", key);
            continue;
        };
        match BlockMapping::from_json(value) {
            Ok(mapping) => entries.push((color, mapping)),
            Err(e) => warn!("Skipping mapping for {}: {}", key, e),
        }
    }
    Ok(entries)
}

fn display_name(text: &str) -> Option<String> {
    let first = text.lines().next()?.trim();
    let name = first.strip_prefix("# ")?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONCRETE: &str = r#"# Concrete
{
    "(255, 0, 0)": {"block_name": "minecraft:red_concrete", "block_data": 0},
    # comment lines are ignored
    "(0, 0, 255)": ["minecraft:blue_concrete", 0],
    "not a color": ["minecraft:stone", 0],
    "(1, 2, 3)": {"block_name": 5}
}
"#;

    #[test]
    fn test_parse_source_skips_malformed_entries() {
        let entries = parse_source(CONCRETE).unwrap();
        assert_eq!(
            entries,
            vec![
                (
                    Color::new(255, 0, 0),
                    BlockMapping::new("minecraft:red_concrete")
                ),
                (
                    Color::new(0, 0, 255),
                    BlockMapping::new("minecraft:blue_concrete")
                ),
            ]
        );
    }

    #[test]
    fn test_parse_source_rejects_non_object() {
        assert!(parse_source("[1, 2, 3]").is_err());
        assert!(parse_source("{ broken").is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(CONCRETE), Some("Concrete".to_string()));
        assert_eq!(display_name("{}"), None);
    }
}
