//! Core library for packaging source images into `ANKITEX1` texture containers.
//!
//! - Probe: every source image must share one color format and size
//! - Mips: a power-of-two chain down to 4x4, optionally capped
//! - Codecs: raw RGB(A), S3TC (DXT1/DXT5 via DDS) and ETC2 (via PKM), each validated before use
//! - Container: a 128-byte header followed by blocks in kind, level, image order
//!
//! Collaborators (probing, resizing, block compression) sit behind traits in
//! [`tools`]; the `image` crate backs a native implementation and
//! ImageMagick, nvcompress and etcpack back process-driven ones.
//!
//! Quick example:
//! ```ignore
//! use ankitex_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let cfg = ConvertConfig::builder()
//!     .compression(CompressionMask::RAW)
//!     .build();
//! let report = convert(&["diffuse.png".into()], "diffuse.ankitex".as_ref(), &cfg, &Collaborators::native())?;
//! println!("{}", report.summary());
//! # Ok(()) }
//! ```

pub mod codec;
pub mod config;
pub mod container;
pub mod dds;
pub mod error;
pub mod mips;
pub mod model;
pub mod pipeline;
pub mod pkm;
pub mod probe;
pub mod tga;
pub mod tools;

pub use config::*;
pub use error::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `ankitex_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::codec::{Encoder, Etc2Encoder, RawPassthrough, S3tcEncoder};
    pub use crate::config::{
        ColorFormat, CompressionKind, CompressionMask, ConvertConfig, ConvertConfigBuilder,
        TextureFilter, TextureTopology,
    };
    pub use crate::container::{ContainerLayout, FixedHeader, write_container};
    pub use crate::error::{AnkiTexError, ErrorCategory, Result};
    pub use crate::mips::plan_mip_chain;
    pub use crate::model::{ConvertReport, DataBlock, ImageInfo, IntermediateImage, MipLevel};
    pub use crate::pipeline::{Collaborators, convert};
    pub use crate::tools::{
        CompressionService, EtcPack, ImageIntrospector, ImageMagick, NativeImageTools,
        NvCompress, ResizeService,
    };
}
