use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{AdapterState, EncodeSettings, Encoder};
use crate::config::{ColorFormat, CompressionKind};
use crate::container::block_size;
use crate::dds::{DDS_HEADER_SIZE, DdsHeader, FOURCC_DXT1, FOURCC_DXT5};
use crate::error::{AnkiTexError, Result};
use crate::model::{DataBlock, IntermediateImage, MipLevel};
use crate::tools::{CompressionService, EncodeRequest};

/// Runs an S3TC encoder and keeps the payload of the DDS it produces.
pub struct S3tcEncoder {
    service: Arc<dyn CompressionService>,
    settings: EncodeSettings,
}

impl S3tcEncoder {
    pub fn new(service: Arc<dyn CompressionService>, settings: EncodeSettings) -> Self {
        Self { service, settings }
    }
}

impl Encoder for S3tcEncoder {
    fn kind(&self) -> CompressionKind {
        CompressionKind::S3tc
    }

    fn encode(&self, image: &IntermediateImage, level: &MipLevel) -> Result<DataBlock> {
        let unit = format!("{}@{}", image.image_index, level.size_str());
        debug!(unit, state = %AdapterState::Encoding, encoder = self.service.name());
        let req = EncodeRequest {
            input: &image.path,
            out_dir: &self.settings.scratch,
            format: image.format,
            fast: self.settings.fast,
            normal: self.settings.normal,
        };
        let dds = self.service.encode(&req)?;

        debug!(unit, state = %AdapterState::Validating, file = %dds.display());
        let bytes = std::fs::read(&dds)?;
        let data = validate_dds(&bytes, level, image.format, &dds).inspect_err(|e| {
            debug!(unit, state = %AdapterState::Rejected, "{e}");
        })?;
        debug!(unit, state = %AdapterState::Accepted, bytes = data.len());
        Ok(DataBlock {
            kind: CompressionKind::S3tc,
            level: level.index,
            image_index: image.image_index,
            data,
        })
    }
}

/// FourCC an S3TC block of `format` must carry.
pub fn expected_four_cc(format: ColorFormat) -> [u8; 4] {
    match format {
        ColorFormat::Rgb8 => FOURCC_DXT1,
        ColorFormat::Rgba8 => FOURCC_DXT5,
    }
}

/// Checks a DDS file produced for one mip level and returns its payload.
///
/// The dimensions must match `target` and the FourCC must be DXT1 for `Rgb8`
/// or DXT5 for `Rgba8`. Only the first surface is kept.
pub fn validate_dds(
    bytes: &[u8],
    target: &MipLevel,
    format: ColorFormat,
    path: &Path,
) -> Result<Vec<u8>> {
    let bad = |reason: String| AnkiTexError::UnexpectedCodecFormat {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.len() < DDS_HEADER_SIZE {
        return Err(bad(format!("file is {} bytes, too short for a DDS header", bytes.len())));
    }
    let header = DdsHeader::read(&mut &bytes[..DDS_HEADER_SIZE])?
        .ok_or_else(|| bad("wrong DDS magic".into()))?;
    if header.width != target.width || header.height != target.height {
        return Err(bad(format!(
            "{}x{}, expected {}",
            header.width,
            header.height,
            target.size_str()
        )));
    }
    let want = expected_four_cc(format);
    if header.pixel_format.four_cc != want {
        return Err(bad(format!(
            "FourCC {:?}, expected {:?} for {}",
            header.four_cc_str(),
            String::from_utf8_lossy(&want),
            format
        )));
    }

    let size = block_size(CompressionKind::S3tc, target.width, target.height, format);
    let end = DDS_HEADER_SIZE + size;
    if bytes.len() < end {
        return Err(bad(format!(
            "payload is {} bytes, expected {}",
            bytes.len() - DDS_HEADER_SIZE,
            size
        )));
    }
    if bytes.len() > end {
        warn!(path = %path.display(), extra = bytes.len() - end, "trailing data after DDS surface");
    }
    Ok(bytes[DDS_HEADER_SIZE..end].to_vec())
}
