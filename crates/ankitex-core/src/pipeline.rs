use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};

use crate::codec::{AdapterState, EncodeSettings, Encoder, Etc2Encoder, RawPassthrough, S3tcEncoder};
use crate::config::{ColorFormat, CompressionKind, ConvertConfig, TextureTopology};
use crate::container::{FixedHeader, write_container};
use crate::error::{AnkiTexError, Result};
use crate::mips::plan_mip_chain;
use crate::model::{ConvertReport, DataBlock, IntermediateImage, MipLevel};
use crate::probe::probe_image_set;
use crate::tools::{
    CompressionService, ImageIntrospector, ImageMagick, NativeImageTools, ResizeRequest,
    ResizeService, file_stem,
};

/// The external services one conversion talks to.
///
/// Raw-only conversions need just the introspector and the resizer; each
/// block-compressed kind needs its encoder.
#[derive(Clone)]
pub struct Collaborators {
    pub introspector: Arc<dyn ImageIntrospector>,
    pub resizer: Arc<dyn ResizeService>,
    pub s3tc: Option<Arc<dyn CompressionService>>,
    pub etc2: Option<Arc<dyn CompressionService>>,
}

impl Collaborators {
    /// Probing and resizing in-process via the `image` crate, no encoders.
    pub fn native() -> Self {
        let tools = Arc::new(NativeImageTools);
        Self {
            introspector: tools.clone(),
            resizer: tools,
            s3tc: None,
            etc2: None,
        }
    }

    /// Probing and resizing through ImageMagick at `convert_path`, no encoders.
    pub fn image_magick(convert_path: impl Into<PathBuf>) -> Self {
        let magick = Arc::new(ImageMagick::new(convert_path));
        Self {
            introspector: magick.clone(),
            resizer: magick,
            s3tc: None,
            etc2: None,
        }
    }

    pub fn with_s3tc(mut self, service: Arc<dyn CompressionService>) -> Self {
        self.s3tc = Some(service);
        self
    }

    pub fn with_etc2(mut self, service: Arc<dyn CompressionService>) -> Self {
        self.etc2 = Some(service);
        self
    }

    fn service_for(&self, kind: CompressionKind) -> Result<Option<&Arc<dyn CompressionService>>> {
        let slot = match kind {
            CompressionKind::Raw => return Ok(None),
            CompressionKind::S3tc => &self.s3tc,
            CompressionKind::Etc2 => &self.etc2,
        };
        slot.as_ref().map(Some).ok_or_else(|| {
            AnkiTexError::InvalidConfig(format!("{kind} storage selected but no {kind} encoder is configured"))
        })
    }
}

/// Checks the number of source images against what `topology` requires.
pub fn check_image_count(topology: TextureTopology, count: usize) -> Result<()> {
    let expected = match topology {
        TextureTopology::TwoD if count != 1 => "exactly 1",
        TextureTopology::Cube if count != 6 => "exactly 6",
        TextureTopology::ThreeD | TextureTopology::TwoDArray if count == 0 => "at least 1",
        TextureTopology::ThreeD | TextureTopology::TwoDArray if count == 1 => {
            warn!(%topology, "{topology} texture with a single image");
            return Ok(());
        }
        _ => return Ok(()),
    };
    Err(AnkiTexError::ImageCount {
        topology,
        expected,
        actual: count,
    })
}

/// One encoder per selected kind, in container order.
pub fn build_encoders(
    cfg: &ConvertConfig,
    tools: &Collaborators,
    settings: &EncodeSettings,
) -> Result<Vec<Box<dyn Encoder>>> {
    let mut encoders: Vec<Box<dyn Encoder>> = Vec::new();
    for kind in cfg.compression.kinds() {
        let service = tools.service_for(kind)?;
        let encoder: Box<dyn Encoder> = match (kind, service) {
            (CompressionKind::S3tc, Some(s)) => Box::new(S3tcEncoder::new(s.clone(), settings.clone())),
            (CompressionKind::Etc2, Some(s)) => Box::new(Etc2Encoder::new(s.clone(), settings.clone())),
            _ => Box::new(RawPassthrough),
        };
        encoders.push(encoder);
    }
    Ok(encoders)
}

/// Runs `f` over every unit and returns the results in unit order.
///
/// The first error wins; with the `parallel` feature and `parallel` set the
/// units run on the rayon pool.
fn run_units<T, U, F>(units: &[T], parallel: bool, f: F) -> Result<Vec<U>>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            return units.par_iter().map(&f).collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    units.iter().map(f).collect()
}

fn intermediate_name(image_index: usize, source: &Path, level: &MipLevel) -> String {
    format!("{image_index:02}_{}.{}.tga", file_stem(source), level.size_str())
}

/// Packages `inputs` into an ANKITEX1 container at `output`.
///
/// Every check runs before any work is handed to a collaborator, and every
/// unit is encoded and validated before the container is written. On error
/// nothing is created at `output`; the scratch directory is removed on every path.
#[instrument(skip_all, fields(output = %output.display()))]
pub fn convert(
    inputs: &[PathBuf],
    output: &Path,
    cfg: &ConvertConfig,
    tools: &Collaborators,
) -> Result<ConvertReport> {
    cfg.validate()?;
    for kind in cfg.compression.kinds() {
        tools.service_for(kind)?;
    }
    check_image_count(cfg.topology, inputs.len())?;

    info!(images = inputs.len(), topology = %cfg.topology, "probing source images");
    let probed = probe_image_set(tools.introspector.as_ref(), inputs)?;
    if cfg.normal && probed.format == ColorFormat::Rgba8 {
        return Err(AnkiTexError::InvalidConfig(
            "normal maps cannot have an alpha channel".into(),
        ));
    }
    if cfg.require_square && probed.width != probed.height {
        return Err(AnkiTexError::NotSquare {
            width: probed.width,
            height: probed.height,
        });
    }
    let format = cfg.resolve_color_format(probed.format);
    if cfg.to_linear && format == ColorFormat::Rgba8 {
        return Err(AnkiTexError::InvalidConfig(
            "linear RGB conversion is only supported for RGB8 images".into(),
        ));
    }
    let levels = plan_mip_chain(probed.width, probed.height, cfg.max_mips)?;
    info!(
        width = probed.width,
        height = probed.height,
        %format,
        levels = levels.len(),
        "planned mip chain"
    );

    let scratch = tempfile::Builder::new().suffix("_ankitex").tempdir()?;
    debug!(scratch = %scratch.path().display(), "scratch directory");
    let settings = EncodeSettings {
        scratch: scratch.path().to_path_buf(),
        fast: cfg.fast,
        normal: cfg.normal,
    };
    let encoders = build_encoders(cfg, tools, &settings)?;

    let resize_units: Vec<(usize, MipLevel)> = levels
        .iter()
        .flat_map(|level| (0..inputs.len()).map(move |i| (i, *level)))
        .collect();
    info!(units = resize_units.len(), "resizing");
    let intermediates = run_units(&resize_units, cfg.parallel, |&(i, level)| {
        let source = &inputs[i];
        let path = scratch.path().join(intermediate_name(i, source, &level));
        let written = tools.resizer.resize(&ResizeRequest {
            source,
            output: &path,
            width: level.width,
            height: level.height,
            alpha: format.has_alpha(),
            to_linear: cfg.to_linear,
        })?;
        debug!(image = i, level = level.index, path = %written.display(), "intermediate ready");
        Ok(IntermediateImage {
            path: written,
            image_index: i,
            level,
            format,
        })
    })?;

    let encode_units: Vec<(&dyn Encoder, &IntermediateImage)> = encoders
        .iter()
        .flat_map(|e| intermediates.iter().map(move |im| (e.as_ref(), im)))
        .collect();
    for (encoder, image) in &encode_units {
        trace!(
            kind = %encoder.kind(),
            image = image.image_index,
            level = image.level.index,
            state = %AdapterState::Pending,
            "queued"
        );
    }
    info!(units = encode_units.len(), "encoding");
    let blocks: Vec<DataBlock> = run_units(&encode_units, cfg.parallel, |(encoder, image)| {
        encoder.encode(image, &image.level)
    })?;

    let header = FixedHeader {
        width: probed.width,
        height: probed.height,
        image_count: inputs.len() as u32,
        topology: cfg.topology,
        color_format: format,
        compression: cfg.compression,
        normal: cfg.normal,
        mip_count: levels.len() as u32,
    };
    let bytes_written = write_container(output, &header, &blocks)?;

    if let Err(e) = scratch.close() {
        warn!("failed to remove scratch directory: {e}");
    }

    Ok(ConvertReport {
        output: output.to_path_buf(),
        width: header.width,
        height: header.height,
        image_count: header.image_count,
        color_format: format,
        levels,
        kinds: cfg.compression.kinds().collect(),
        block_count: blocks.len(),
        bytes_written,
    })
}
