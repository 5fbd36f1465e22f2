use std::path::PathBuf;

/// Error type for image to schematic conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Palette source directory does not exist: {}", .0.display())]
    PaletteSourceMissing(PathBuf),
    #[error("No block mappings loaded: {0}")]
    BlockMappingParse(String),
    #[error("Palette index is empty")]
    EmptyPalette,
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Schematic size {width}x{height} exceeds the {max} block limit per axis")]
    SizeOutOfRange {
        width: usize,
        height: usize,
        max: usize,
    },
    #[error("Block palette has {0} entries, more than the 256 a byte id can address")]
    PaletteTooLarge(usize),
    #[error("NBT error: {0}")]
    Nbt(String),
    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl From<quartz_nbt::io::NbtIoError> for ConvertError {
    fn from(err: quartz_nbt::io::NbtIoError) -> Self {
        match err {
            quartz_nbt::io::NbtIoError::StdIo(io) => ConvertError::Write(io),
            other => ConvertError::Nbt(other.to_string()),
        }
    }
}
