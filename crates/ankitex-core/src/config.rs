use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Texture topology stored in the container header.
///
/// Only a tag for the runtime: the block layout is the same for every topology,
/// the count of images per level is what differs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[repr(u32)]
pub enum TextureTopology {
    #[serde(rename = "2D")]
    TwoD = 1,
    Cube = 2,
    #[serde(rename = "3D")]
    ThreeD = 3,
    #[serde(rename = "2DArray")]
    TwoDArray = 4,
}

impl TextureTopology {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::TwoD),
            2 => Some(Self::Cube),
            3 => Some(Self::ThreeD),
            4 => Some(Self::TwoDArray),
            _ => None,
        }
    }
}

impl FromStr for TextureTopology {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2d" => Ok(Self::TwoD),
            "cube" => Ok(Self::Cube),
            "3d" => Ok(Self::ThreeD),
            "2darray" | "2d_array" => Ok(Self::TwoDArray),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TextureTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TwoD => "2D",
            Self::Cube => "Cube",
            Self::ThreeD => "3D",
            Self::TwoDArray => "2DArray",
        })
    }
}

/// Pixel format of every image in the container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[repr(u32)]
pub enum ColorFormat {
    #[serde(rename = "RGB8")]
    Rgb8 = 1,
    #[serde(rename = "RGBA8")]
    Rgba8 = 2,
}

impl ColorFormat {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Rgb8),
            2 => Some(Self::Rgba8),
            _ => None,
        }
    }

    /// Bytes per pixel of the uncompressed representation.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba8)
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rgb8 => "RGB8",
            Self::Rgba8 => "RGBA8",
        })
    }
}

/// A single stored representation of the texel data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    Raw,
    S3tc,
    Etc2,
}

impl CompressionKind {
    /// All kinds in container order.
    pub const ORDERED: [CompressionKind; 3] =
        [CompressionKind::Raw, CompressionKind::S3tc, CompressionKind::Etc2];

    pub fn mask(self) -> CompressionMask {
        match self {
            Self::Raw => CompressionMask::RAW,
            Self::S3tc => CompressionMask::S3TC,
            Self::Etc2 => CompressionMask::ETC2,
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Raw => "raw",
            Self::S3tc => "s3tc",
            Self::Etc2 => "etc2",
        })
    }
}

bitflags! {
    /// Set of stored representations, written verbatim into the header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CompressionMask: u32 {
        const RAW = 1 << 0;
        const S3TC = 1 << 1;
        const ETC2 = 1 << 2;
    }
}

impl CompressionMask {
    /// Present kinds in container order (Raw, S3TC, ETC2).
    pub fn kinds(self) -> impl Iterator<Item = CompressionKind> {
        CompressionKind::ORDERED
            .into_iter()
            .filter(move |k| self.contains(k.mask()))
    }
}

/// Sampling hint for the runtime. Not used while packaging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum TextureFilter {
    Default = 0,
    Linear = 1,
    Nearest = 2,
}

impl FromStr for TextureFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            _ => Err(()),
        }
    }
}

/// Immutable settings for one conversion. Built once, then passed by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    #[serde(default = "default_topology")]
    pub topology: TextureTopology,
    /// Ask the encoders for their fast (lower quality) mode.
    #[serde(default)]
    pub fast: bool,
    /// Texture is a normal map. Forbidden with RGBA8 sources.
    #[serde(default)]
    pub normal: bool,
    /// Drop alpha: the container is always RGB8.
    #[serde(default)]
    pub no_alpha: bool,
    #[serde(default = "default_compression")]
    pub compression: CompressionMask,
    /// Treat sources as sRGB and store linear RGB. RGB8 only.
    #[serde(default)]
    pub to_linear: bool,
    #[serde(default = "default_filter")]
    pub filter: TextureFilter,
    /// Upper bound on the number of mip levels.
    #[serde(default = "default_max_mips")]
    pub max_mips: u32,
    /// Reject non-square sources instead of accepting any power-of-two rectangle.
    #[serde(default)]
    pub require_square: bool,
    /// Run units of work on the rayon pool when the `parallel` feature is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            topology: default_topology(),
            fast: false,
            normal: false,
            no_alpha: false,
            compression: default_compression(),
            to_linear: false,
            filter: default_filter(),
            max_mips: default_max_mips(),
            require_square: false,
            parallel: default_parallel(),
        }
    }
}

impl ConvertConfig {
    /// Validates the flags that can be checked without looking at any image.
    ///
    /// Returns an error if:
    /// - no compression kind is selected
    /// - the mip level cap is zero
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AnkiTexError;

        if self.compression.is_empty() {
            return Err(AnkiTexError::InvalidConfig(
                "at least one of raw, s3tc or etc2 must be stored".into(),
            ));
        }
        if self.max_mips == 0 {
            return Err(AnkiTexError::InvalidConfig(
                "mip level cap must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Final color format once the probed format of the sources is known.
    pub fn resolve_color_format(&self, probed: ColorFormat) -> ColorFormat {
        if self.no_alpha { ColorFormat::Rgb8 } else { probed }
    }
}

fn default_topology() -> TextureTopology {
    TextureTopology::TwoD
}
fn default_compression() -> CompressionMask {
    CompressionMask::S3TC
}
fn default_filter() -> TextureFilter {
    TextureFilter::Default
}
fn default_max_mips() -> u32 {
    0xFFFF
}
fn default_parallel() -> bool {
    false
}

/// Builder for `ConvertConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct ConvertConfigBuilder {
    cfg: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ConvertConfig::default(),
        }
    }
    pub fn topology(mut self, v: TextureTopology) -> Self {
        self.cfg.topology = v;
        self
    }
    pub fn fast(mut self, v: bool) -> Self {
        self.cfg.fast = v;
        self
    }
    pub fn normal(mut self, v: bool) -> Self {
        self.cfg.normal = v;
        self
    }
    pub fn no_alpha(mut self, v: bool) -> Self {
        self.cfg.no_alpha = v;
        self
    }
    pub fn compression(mut self, v: CompressionMask) -> Self {
        self.cfg.compression = v;
        self
    }
    pub fn to_linear(mut self, v: bool) -> Self {
        self.cfg.to_linear = v;
        self
    }
    pub fn filter(mut self, v: TextureFilter) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn max_mips(mut self, v: u32) -> Self {
        self.cfg.max_mips = v;
        self
    }
    pub fn require_square(mut self, v: bool) -> Self {
        self.cfg.require_square = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> ConvertConfig {
        self.cfg
    }
}

impl ConvertConfig {
    /// Create a fluent builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder::new()
    }
}
