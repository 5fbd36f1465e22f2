//! Sponge schematic (`.schem`, version 2) writer and reader.

use crate::error::{ConvertError, Result};
use crate::voxel_grid::{BlockPalette, VoxelGrid};
use flate2::read::GzDecoder;
use log::debug;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

pub const SCHEM_EXTENSION: &str = "schem";
pub const SPONGE_VERSION: i32 = 2;
pub const DEFAULT_DATA_VERSION: i32 = 3100;
/// Largest extent a `Short` dimension can hold.
pub const MAX_EXTENT: usize = i16::MAX as usize;
/// Palette ids are stored in single bytes.
pub const MAX_PALETTE_LEN: usize = 256;
const ROOT_NAME: &str = "Schematic";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Optional `Metadata` compound written after the block data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
}

#[derive(Debug, Clone)]
pub struct SchemOptions {
    pub data_version: i32,
    /// Gzip level; `None` writes the raw NBT stream.
    pub compression: Option<flate2::Compression>,
    pub metadata: Option<SchemMetadata>,
}

impl Default for SchemOptions {
    fn default() -> Self {
        SchemOptions {
            data_version: DEFAULT_DATA_VERSION,
            compression: Some(flate2::Compression::default()),
            metadata: None,
        }
    }
}

/// Reject a `width` x `height` layer that does not fit in `Short` dimensions.
pub fn check_size(width: usize, height: usize) -> Result<()> {
    if width > MAX_EXTENT || height > MAX_EXTENT {
        return Err(ConvertError::SizeOutOfRange {
            width,
            height,
            max: MAX_EXTENT,
        });
    }
    Ok(())
}

/// Check that `grid` can be encoded without truncating dimensions or ids.
pub fn validate(grid: &VoxelGrid) -> Result<()> {
    let (width, height, depth) = grid.dimensions();
    check_size(width, height.max(depth))?;
    if grid.palette().len() > MAX_PALETTE_LEN {
        return Err(ConvertError::PaletteTooLarge(grid.palette().len()));
    }
    Ok(())
}

/// Build the root compound for `grid`. Callers encoding to bytes go through
/// [`validate`] first; dimensions and ids are narrowed here.
///
/// The image plane is laid flat: grid x maps to `Width`, grid y to `Length`
/// and the single layer to `Height`.
pub fn to_nbt(grid: &VoxelGrid, options: &SchemOptions) -> NbtCompound {
    let (width, height, depth) = grid.dimensions();
    let mut root = NbtCompound::new();

    root.insert("Version", NbtTag::Int(SPONGE_VERSION));
    root.insert("DataVersion", NbtTag::Int(options.data_version));
    root.insert("Width", NbtTag::Short(width as i16));
    root.insert("Height", NbtTag::Short(depth as i16));
    root.insert("Length", NbtTag::Short(height as i16));
    root.insert("Offset", NbtTag::IntArray(vec![0, 0, 0]));

    let mut palette = NbtCompound::new();
    for (id, name) in grid.palette().iter().enumerate() {
        palette.insert(name.to_string(), NbtTag::Int(id as i32));
    }
    root.insert("Palette", NbtTag::Compound(palette));

    // Blocks are already stored z, then y, then x.
    let block_data: Vec<i8> = grid.blocks().iter().map(|&id| id as u8 as i8).collect();
    root.insert("BlockData", NbtTag::ByteArray(block_data));
    root.insert("BlockEntities", NbtTag::List(NbtList::new()));

    if let Some(meta) = &options.metadata {
        let mut metadata = NbtCompound::new();
        metadata.insert("Author", NbtTag::String(meta.author.clone()));
        metadata.insert("Name", NbtTag::String(meta.name.clone()));
        metadata.insert("Date", NbtTag::Long(meta.date));
        metadata.insert("Description", NbtTag::String(meta.description.clone()));
        root.insert("Metadata", NbtTag::Compound(metadata));
    }

    root
}

/// Serialize `grid` into `writer`. Fails on grids [`validate`] rejects and
/// on I/O failures of the sink.
pub fn write_schem<W: Write>(writer: &mut W, grid: &VoxelGrid, options: &SchemOptions) -> Result<()> {
    validate(grid)?;
    let root = to_nbt(grid, options);
    match options.compression {
        Some(level) => {
            let mut encoder = flate2::write::GzEncoder::new(writer, level);
            quartz_nbt::io::write_nbt(&mut encoder, Some(ROOT_NAME), &root, Flavor::Uncompressed)?;
            encoder.finish()?;
        }
        None => {
            quartz_nbt::io::write_nbt(writer, Some(ROOT_NAME), &root, Flavor::Uncompressed)?;
        }
    }
    Ok(())
}

pub fn to_schem(grid: &VoxelGrid, options: &SchemOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_schem(&mut buf, grid, options)?;
    Ok(buf)
}

/// Append `.schem` unless `path` already ends with it (case-insensitively).
pub fn with_schem_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SCHEM_EXTENSION));
    if has_extension {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(SCHEM_EXTENSION);
        PathBuf::from(name)
    }
}

/// Write `grid` to `path` (suffixed with `.schem` if needed) and return the
/// path actually written.
pub fn save_schem(path: &Path, grid: &VoxelGrid, options: &SchemOptions) -> Result<PathBuf> {
    let path = with_schem_extension(path);
    validate(grid)?;
    let mut writer = BufWriter::new(File::create(&path)?);
    write_schem(&mut writer, grid, options)?;
    writer.flush()?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Fields read back from a Sponge v2 schematic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSchem {
    pub version: i32,
    pub data_version: i32,
    pub width: i16,
    pub height: i16,
    pub length: i16,
    /// `(block name, id)` pairs ordered by id.
    pub palette: Vec<(String, i32)>,
    pub block_data: Vec<u8>,
    pub metadata: Option<SchemMetadata>,
}

impl DecodedSchem {
    pub fn block_name(&self, id: u8) -> Option<&str> {
        self.palette
            .iter()
            .find(|(_, i)| *i == id as i32)
            .map(|(name, _)| name.as_str())
    }

    /// Rebuild a voxel grid, mapping `Width`/`Length`/`Height` back onto
    /// x/y/z. Fails when palette ids are not dense or block data references
    /// an unknown id.
    pub fn to_voxel_grid(&self) -> Result<VoxelGrid> {
        for (expected, (name, id)) in self.palette.iter().enumerate() {
            if *id != expected as i32 {
                return Err(ConvertError::Nbt(format!(
                    "Palette id {} for {} is not contiguous",
                    id, name
                )));
            }
        }
        let palette: BlockPalette = self.palette.iter().map(|(name, _)| name.as_str()).collect();
        let dims = (
            self.width as usize,
            self.length as usize,
            self.height as usize,
        );
        let blocks = self.block_data.iter().map(|&b| b as usize).collect();
        VoxelGrid::from_parts(dims, blocks, palette)
            .ok_or_else(|| ConvertError::Nbt("Block data does not match palette or size".into()))
    }
}

pub fn is_schem(data: &[u8]) -> bool {
    let Ok(root) = read_root(data) else {
        return false;
    };
    root.get::<_, i32>("Version").is_ok()
        && root.get::<_, &NbtCompound>("Palette").is_ok()
        && root.inner().contains_key("BlockData")
}

/// Decode a schematic, gzip-compressed or raw.
pub fn from_schem(data: &[u8]) -> Result<DecodedSchem> {
    let root = read_root(data)?;

    let mut palette = Vec::new();
    for (name, tag) in get_compound(&root, "Palette")?.inner() {
        match tag {
            NbtTag::Int(id) => palette.push((name.clone(), *id)),
            other => {
                return Err(ConvertError::Nbt(format!(
                    "Palette entry {} is not an int: {:?}",
                    name, other
                )))
            }
        }
    }
    palette.sort_by_key(|(_, id)| *id);

    let block_data = match root.inner().get("BlockData") {
        Some(NbtTag::ByteArray(bytes)) => bytes.iter().map(|&b| b as u8).collect(),
        _ => return Err(ConvertError::Nbt("Missing BlockData byte array".into())),
    };

    let metadata = match root.inner().get("Metadata") {
        Some(NbtTag::Compound(meta)) => Some(SchemMetadata {
            name: get_string(meta, "Name"),
            author: get_string(meta, "Author"),
            description: get_string(meta, "Description"),
            date: match meta.inner().get("Date") {
                Some(NbtTag::Long(date)) => *date,
                _ => 0,
            },
        }),
        _ => None,
    };

    Ok(DecodedSchem {
        version: get_int(&root, "Version")?,
        data_version: get_int(&root, "DataVersion")?,
        width: get_short(&root, "Width")?,
        height: get_short(&root, "Height")?,
        length: get_short(&root, "Length")?,
        palette,
        block_data,
        metadata,
    })
}

fn read_root(data: &[u8]) -> Result<NbtCompound> {
    let (root, _) = if data.starts_with(&GZIP_MAGIC) {
        let mut gz = GzDecoder::new(data);
        quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)?
    } else {
        let mut cursor = Cursor::new(data);
        quartz_nbt::io::read_nbt(&mut cursor, Flavor::Uncompressed)?
    };
    Ok(root)
}

fn get_compound<'a>(root: &'a NbtCompound, key: &str) -> Result<&'a NbtCompound> {
    match root.inner().get(key) {
        Some(NbtTag::Compound(compound)) => Ok(compound),
        _ => Err(ConvertError::Nbt(format!("Missing compound {}", key))),
    }
}

fn get_int(root: &NbtCompound, key: &str) -> Result<i32> {
    match root.inner().get(key) {
        Some(NbtTag::Int(value)) => Ok(*value),
        _ => Err(ConvertError::Nbt(format!("Missing int {}", key))),
    }
}

fn get_short(root: &NbtCompound, key: &str) -> Result<i16> {
    match root.inner().get(key) {
        Some(NbtTag::Short(value)) => Ok(*value),
        _ => Err(ConvertError::Nbt(format!("Missing short {}", key))),
    }
}

fn get_string(compound: &NbtCompound, key: &str) -> String {
    match compound.inner().get(key) {
        Some(NbtTag::String(value)) => value.clone(),
        _ => String::new(),
    }
}
