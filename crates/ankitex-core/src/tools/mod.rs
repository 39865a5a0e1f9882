use std::path::{Path, PathBuf};

use crate::config::ColorFormat;
use crate::error::Result;
use crate::model::ImageInfo;

pub mod native;
pub mod process;

pub use native::NativeImageTools;
pub use process::{EtcPack, ImageMagick, NvCompress};

/// Reports the color format and size of a source image.
///
/// Must answer `Rgba8` only when the image carries alpha that is not fully
/// opaque everywhere, and must fail when the channel depth cannot be established.
pub trait ImageIntrospector: Send + Sync {
    fn identify(&self, path: &Path) -> Result<ImageInfo>;
}

/// One resize job: write `source` scaled to `width` x `height` to `output`
/// as an uncompressed truecolor TGA.
#[derive(Debug, Clone, Copy)]
pub struct ResizeRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub width: u32,
    pub height: u32,
    /// Force the alpha channel on (32 bpp) or off (24 bpp).
    pub alpha: bool,
    /// Convert sRGB input to linear RGB.
    pub to_linear: bool,
}

pub trait ResizeService: Send + Sync {
    /// Returns the path of the written intermediate image.
    fn resize(&self, req: &ResizeRequest<'_>) -> Result<PathBuf>;
}

/// One encode job: compress `input` into a vendor container inside `out_dir`.
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub input: &'a Path,
    pub out_dir: &'a Path,
    pub format: ColorFormat,
    pub fast: bool,
    pub normal: bool,
}

/// A block-compression encoder (S3TC or ETC2).
pub trait CompressionService: Send + Sync {
    fn name(&self) -> &str;
    /// Returns the path of the vendor container (DDS or PKM) it produced.
    fn encode(&self, req: &EncodeRequest<'_>) -> Result<PathBuf>;
}

/// Base file name without extension, `"image"` when there is none.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into())
}
