//! The `ANKITEX1` container: a 128-byte header followed by the data blocks.
//!
//! Layout of the header (all integers little-endian `u32`):
//!
//! | offset | field           |
//! |--------|-----------------|
//! | 0      | magic `ANKITEX1`|
//! | 8      | width           |
//! | 12     | height          |
//! | 16     | image count     |
//! | 20     | topology        |
//! | 24     | color format    |
//! | 28     | compression mask|
//! | 32     | normal (0 or 1) |
//! | 36     | mip level count |
//! | 40     | zero padding    |
//!
//! Blocks follow without separators: kinds in the order raw, s3tc, etc2, then
//! levels from largest to smallest, then images in input order.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::config::{ColorFormat, CompressionKind, CompressionMask, TextureTopology};
use crate::error::{AnkiTexError, Result};
use crate::model::DataBlock;

pub const ANKITEX_MAGIC: [u8; 8] = *b"ANKITEX1";
pub const HEADER_SIZE: usize = 128;
const HEADER_FIELDS_SIZE: usize = 8 + 8 * 4;

/// Fixed 128-byte container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
    pub topology: TextureTopology,
    pub color_format: ColorFormat,
    pub compression: CompressionMask,
    pub normal: bool,
    pub mip_count: u32,
}

impl FixedHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let mut cursor = &mut buf[..];
        // Writing into a fixed array of the exact size cannot fail.
        let _ = self.write(&mut cursor);
        buf
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&ANKITEX_MAGIC)?;
        w.write_u32::<LittleEndian>(self.width)?;
        w.write_u32::<LittleEndian>(self.height)?;
        w.write_u32::<LittleEndian>(self.image_count)?;
        w.write_u32::<LittleEndian>(self.topology as u32)?;
        w.write_u32::<LittleEndian>(self.color_format as u32)?;
        w.write_u32::<LittleEndian>(self.compression.bits())?;
        w.write_u32::<LittleEndian>(self.normal as u32)?;
        w.write_u32::<LittleEndian>(self.mip_count)?;
        w.write_all(&[0u8; HEADER_SIZE - HEADER_FIELDS_SIZE])
    }

    /// Reads and checks a header the way the runtime loader does.
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf)?;
        Self::from_bytes(&buf)
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let bad = |reason: String| AnkiTexError::InvalidContainer { reason };
        if buf[..8] != ANKITEX_MAGIC {
            return Err(bad("wrong magic word".into()));
        }
        let mut cursor = &buf[8..HEADER_FIELDS_SIZE];
        let width = cursor.read_u32::<LittleEndian>()?;
        let height = cursor.read_u32::<LittleEndian>()?;
        let image_count = cursor.read_u32::<LittleEndian>()?;
        let topology = cursor.read_u32::<LittleEndian>()?;
        let color_format = cursor.read_u32::<LittleEndian>()?;
        let compression = cursor.read_u32::<LittleEndian>()?;
        let normal = cursor.read_u32::<LittleEndian>()?;
        let mip_count = cursor.read_u32::<LittleEndian>()?;

        let topology = TextureTopology::from_u32(topology)
            .ok_or_else(|| bad(format!("texture type {topology}")))?;
        let color_format = ColorFormat::from_u32(color_format)
            .ok_or_else(|| bad(format!("color format {color_format}")))?;
        let compression = CompressionMask::from_bits(compression)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| bad(format!("compression mask {compression:#x}")))?;
        let normal = match normal {
            0 => false,
            1 => true,
            other => return Err(bad(format!("normal flag {other}"))),
        };
        if image_count == 0 || mip_count == 0 {
            return Err(bad(format!(
                "image count {image_count}, mip count {mip_count}"
            )));
        }
        Ok(Self {
            width,
            height,
            image_count,
            topology,
            color_format,
            compression,
            normal,
            mip_count,
        })
    }
}

/// Size of one surface of `kind` at `width` x `height`.
pub fn block_size(kind: CompressionKind, width: u32, height: u32, format: ColorFormat) -> usize {
    let (w, h) = (width as usize, height as usize);
    match kind {
        CompressionKind::Raw => w * h * format.bytes_per_pixel() as usize,
        CompressionKind::S3tc => {
            let bytes_per_block = match format {
                ColorFormat::Rgb8 => 8,
                ColorFormat::Rgba8 => 16,
            };
            w.div_ceil(4) * h.div_ceil(4) * bytes_per_block
        }
        CompressionKind::Etc2 => (w / 4) * (h / 4) * 8,
    }
}

/// Where every block of a container sits, derived from the header alone.
#[derive(Debug, Clone)]
pub struct ContainerLayout {
    pub entries: Vec<LayoutEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub kind: CompressionKind,
    pub level: u32,
    pub image_index: usize,
    pub offset: u64,
    pub size: usize,
}

impl ContainerLayout {
    pub fn from_header(header: &FixedHeader) -> Self {
        let mut entries = Vec::new();
        let mut offset = HEADER_SIZE as u64;
        for kind in header.compression.kinds() {
            let (mut w, mut h) = (header.width, header.height);
            for level in 0..header.mip_count {
                let size = block_size(kind, w, h, header.color_format);
                for image_index in 0..header.image_count as usize {
                    entries.push(LayoutEntry {
                        kind,
                        level,
                        image_index,
                        offset,
                        size,
                    });
                    offset += size as u64;
                }
                w /= 2;
                h /= 2;
            }
        }
        Self { entries }
    }

    /// Total size of the segment holding every block of `kind`.
    pub fn segment_size(&self, kind: CompressionKind) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.size as u64)
            .sum()
    }

    pub fn file_size(&self) -> u64 {
        self.entries
            .last()
            .map(|e| e.offset + e.size as u64)
            .unwrap_or(HEADER_SIZE as u64)
    }

    /// Checks that `blocks` fill this layout exactly, in order.
    pub fn check_blocks(&self, blocks: &[DataBlock]) -> Result<()> {
        if blocks.len() != self.entries.len() {
            return Err(AnkiTexError::InvalidContainer {
                reason: format!(
                    "expected {} blocks, got {}",
                    self.entries.len(),
                    blocks.len()
                ),
            });
        }
        for (entry, block) in self.entries.iter().zip(blocks) {
            if entry.kind != block.kind
                || entry.level != block.level
                || entry.image_index != block.image_index
                || entry.size != block.len()
            {
                return Err(AnkiTexError::InvalidContainer {
                    reason: format!(
                        "block out of place: expected {} level {} image {} ({} bytes), got {} level {} image {} ({} bytes)",
                        entry.kind,
                        entry.level,
                        entry.image_index,
                        entry.size,
                        block.kind,
                        block.level,
                        block.image_index,
                        block.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Writes `header` and `blocks` to `path`.
///
/// The blocks are checked against the header's layout before anything is
/// written. Bytes go to a staging file next to `path`, which is renamed over
/// `path` only once everything has been flushed; on error nothing appears at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_container(path: &Path, header: &FixedHeader, blocks: &[DataBlock]) -> Result<u64> {
    let layout = ContainerLayout::from_header(header);
    layout.check_blocks(blocks)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir)?;
    {
        let mut w = std::io::BufWriter::new(staging.as_file_mut());
        header.write(&mut w)?;
        for b in blocks {
            w.write_all(&b.data)?;
        }
        w.flush()?;
    }
    staging.as_file().sync_all()?;
    debug!(staging = %staging.path().display(), "container staged");
    staging.persist(path).map_err(|e| AnkiTexError::Io(e.error))?;

    let size = layout.file_size();
    info!(bytes = size, blocks = blocks.len(), "container written");
    Ok(size)
}
