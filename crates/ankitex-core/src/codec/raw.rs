use std::path::Path;
use tracing::{debug, warn};

use super::Encoder;
use crate::config::{ColorFormat, CompressionKind};
use crate::error::{AnkiTexError, Result};
use crate::model::{DataBlock, IntermediateImage, MipLevel};
use crate::tga::{TGA_HEADER_SIZE, TGA_TYPE_TRUECOLOR, TGA_TYPE_TRUECOLOR_RLE, TgaHeader};

/// Stores the intermediate image uncompressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPassthrough;

impl Encoder for RawPassthrough {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Raw
    }

    fn encode(&self, image: &IntermediateImage, level: &MipLevel) -> Result<DataBlock> {
        let bytes = std::fs::read(&image.path)?;
        let data = extract_raw(&bytes, level, image.format, &image.path)?;
        debug!(level = level.index, image = image.image_index, bytes = data.len(), "raw block");
        Ok(DataBlock {
            kind: CompressionKind::Raw,
            level: level.index,
            image_index: image.image_index,
            data,
        })
    }
}

/// Extracts top-down RGB(A) pixels from an uncompressed truecolor TGA.
///
/// The header must describe exactly `target` at 24 bpp (`Rgb8`) or 32 bpp
/// (`Rgba8`). Blue and red are swapped per pixel; bottom-up files are flipped.
/// The result is exactly `width * height * bytes_per_pixel` bytes.
pub fn extract_raw(
    bytes: &[u8],
    target: &MipLevel,
    format: ColorFormat,
    path: &Path,
) -> Result<Vec<u8>> {
    let bad = |reason: String| AnkiTexError::UnexpectedRawLayout {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < TGA_HEADER_SIZE {
        return Err(bad(format!("file is {} bytes, too short for a header", bytes.len())));
    }
    let header = TgaHeader::read(&mut &bytes[..TGA_HEADER_SIZE])?;
    if header.image_type == TGA_TYPE_TRUECOLOR_RLE {
        return Err(bad("run-length encoded pixels, expected uncompressed".into()));
    }
    if header.image_type != TGA_TYPE_TRUECOLOR || header.color_map_type != 0 {
        return Err(bad(format!(
            "image type {} with color map {}, expected uncompressed truecolor",
            header.image_type, header.color_map_type
        )));
    }
    if header.is_right_to_left() {
        return Err(bad("right-to-left pixel order".into()));
    }
    let expected_depth = format.bytes_per_pixel() as u8 * 8;
    if header.pixel_depth != expected_depth {
        return Err(bad(format!(
            "{} bpp, expected {} for {}",
            header.pixel_depth, expected_depth, format
        )));
    }
    if u32::from(header.width) != target.width || u32::from(header.height) != target.height {
        return Err(bad(format!(
            "{}x{}, expected {}",
            header.width,
            header.height,
            target.size_str()
        )));
    }

    let bpp = format.bytes_per_pixel() as usize;
    let row_len = target.width as usize * bpp;
    let size = row_len * target.height as usize;
    let start = TGA_HEADER_SIZE + header.id_length as usize;
    let end = start + size;
    if bytes.len() < end {
        return Err(bad(format!(
            "pixel data is {} bytes, expected {}",
            bytes.len().saturating_sub(start),
            size
        )));
    }
    if bytes.len() > end {
        warn!(path = %path.display(), extra = bytes.len() - end, "trailing data after TGA pixels");
    }

    let pixels = &bytes[start..end];
    let mut out = Vec::with_capacity(size);
    let mut push_row = |row: &[u8]| {
        for px in row.chunks_exact(bpp) {
            out.push(px[2]);
            out.push(px[1]);
            out.push(px[0]);
            if bpp == 4 {
                out.push(px[3]);
            }
        }
    };
    if header.is_top_down() {
        pixels.chunks_exact(row_len).for_each(&mut push_row);
    } else {
        pixels.chunks_exact(row_len).rev().for_each(&mut push_row);
    }
    Ok(out)
}
