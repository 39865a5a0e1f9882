use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{ColorFormat, CompressionKind};

/// One level of the mip chain. Level 0 is the full-size image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MipLevel {
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

impl MipLevel {
    pub fn new(index: u32, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
        }
    }

    /// `WxH`, as used for scratch file names and tool arguments.
    pub fn size_str(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// What the probe learned about one source image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ColorFormat,
    pub width: u32,
    pub height: u32,
}

/// Uncompressed image produced by the resize stage for one (level, image) pair.
///
/// The file lives in the job's scratch directory and is only valid while that
/// directory exists.
#[derive(Debug, Clone)]
pub struct IntermediateImage {
    pub path: PathBuf,
    pub image_index: usize,
    pub level: MipLevel,
    pub format: ColorFormat,
}

/// Texel payload of one (kind, level, image) unit, with every vendor header stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub kind: CompressionKind,
    pub level: u32,
    pub image_index: usize,
    pub data: Vec<u8>,
}

impl DataBlock {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
    pub color_format: ColorFormat,
    pub levels: Vec<MipLevel>,
    pub kinds: Vec<CompressionKind>,
    pub block_count: usize,
    pub bytes_written: u64,
}

impl ConvertReport {
    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let kinds: Vec<String> = self.kinds.iter().map(|k| k.to_string()).collect();
        format!(
            "{}x{} {} x{}, {} level(s), kinds [{}], {} block(s), {} bytes",
            self.width,
            self.height,
            self.color_format,
            self.image_count,
            self.levels.len(),
            kinds.join(", "),
            self.block_count,
            self.bytes_written,
        )
    }
}
