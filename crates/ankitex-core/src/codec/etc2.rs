use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{AdapterState, EncodeSettings, Encoder};
use crate::config::{ColorFormat, CompressionKind};
use crate::container::block_size;
use crate::error::{AnkiTexError, Result};
use crate::model::{DataBlock, IntermediateImage, MipLevel};
use crate::pkm::{PKM_HEADER_SIZE, PkmHeader};
use crate::tools::{CompressionService, EncodeRequest};

/// Runs an ETC2 encoder and keeps the payload of the PKM it produces.
pub struct Etc2Encoder {
    service: Arc<dyn CompressionService>,
    settings: EncodeSettings,
}

impl Etc2Encoder {
    pub fn new(service: Arc<dyn CompressionService>, settings: EncodeSettings) -> Self {
        Self { service, settings }
    }
}

impl Encoder for Etc2Encoder {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Etc2
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
        let pkm = self.service.encode(&req)?;

        debug!(unit, state = %AdapterState::Validating, file = %pkm.display());
        let bytes = std::fs::read(&pkm)?;
        let data = validate_pkm(&bytes, level, image.format, &pkm).inspect_err(|e| {
            debug!(unit, state = %AdapterState::Rejected, "{e}");
        })?;
        debug!(unit, state = %AdapterState::Accepted, bytes = data.len());
        Ok(DataBlock {
            kind: CompressionKind::Etc2,
            level: level.index,
            image_index: image.image_index,
            data,
        })
    }
}

/// Checks a PKM file produced for one mip level and returns its payload.
///
/// The magic must be `PKM 20` and the (block-padded) dimensions must equal
/// `target`; mip levels are never smaller than one block, so no padding occurs.
pub fn validate_pkm(
    bytes: &[u8],
    target: &MipLevel,
    format: ColorFormat,
    path: &Path,
) -> Result<Vec<u8>> {
    let bad = |reason: String| AnkiTexError::UnexpectedCodecFormat {
        path: path.to_path_buf(),
        reason,
    };
    if bytes.len() < PKM_HEADER_SIZE {
        return Err(bad(format!("file is {} bytes, too short for a PKM header", bytes.len())));
    }
    let header = PkmHeader::read(&mut &bytes[..PKM_HEADER_SIZE])?;
    if !header.is_v20() {
        return Err(bad(format!(
            "magic {:?}, expected \"PKM 20\"",
            String::from_utf8_lossy(&header.magic)
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

    let size = block_size(CompressionKind::Etc2, target.width, target.height, format);
    let end = PKM_HEADER_SIZE + size;
    if bytes.len() < end {
        return Err(bad(format!(
            "payload is {} bytes, expected {}",
            bytes.len() - PKM_HEADER_SIZE,
            size
        )));
    }
    if bytes.len() > end {
        warn!(path = %path.display(), extra = bytes.len() - end, "trailing data after PKM payload");
    }
    Ok(bytes[PKM_HEADER_SIZE..end].to_vec())
}
