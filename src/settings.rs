use crate::error::{ConvertError, Result};
use crate::formats::schem::{SchemMetadata, SchemOptions, DEFAULT_DATA_VERSION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conversion settings. Every field has a default, so a settings JSON only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSettings {
    /// Directory holding the `<name>.json` palette sources.
    pub block_dir: PathBuf,
    /// Palette sources to load, in override order.
    pub selected_blocks: Vec<String>,
    /// Shrink an explicit target size to the image's aspect ratio.
    pub keep_aspect_ratio: bool,
    /// Gzip the output (the usual `.schem` encoding).
    pub compress: bool,
    /// Gzip level, 0-9.
    pub compression_level: u32,
    pub data_version: i32,
    /// Write a `Metadata` compound.
    pub metadata: bool,
    pub author: String,
    pub description: String,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        ConvertSettings {
            block_dir: PathBuf::from("block"),
            selected_blocks: vec!["wool".to_string(), "concrete".to_string()],
            keep_aspect_ratio: false,
            compress: true,
            compression_level: 6,
            data_version: DEFAULT_DATA_VERSION,
            metadata: true,
            author: "schempixel".to_string(),
            description: "Generated by schempixel".to_string(),
        }
    }
}

impl ConvertSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConvertError::InvalidSettings(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConvertError::InvalidSettings(e.to_string()))
    }

    /// Encoder options for a schematic called `name`, stamped with `date`
    /// (milliseconds since the Unix epoch).
    pub fn schem_options(&self, name: &str, date: i64) -> SchemOptions {
        SchemOptions {
            data_version: self.data_version,
            compression: self
                .compress
                .then(|| flate2::Compression::new(self.compression_level.min(9))),
            metadata: self.metadata.then(|| SchemMetadata {
                name: name.to_string(),
                author: self.author.clone(),
                description: self.description.clone(),
                date,
            }),
        }
    }
}
