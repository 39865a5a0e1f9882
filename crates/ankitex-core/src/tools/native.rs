//! In-process probing and resizing on top of the `image` crate.

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageReader, RgbaImage};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use super::{ImageIntrospector, ResizeRequest, ResizeService};
use crate::config::ColorFormat;
use crate::error::{AnkiTexError, Result};
use crate::model::ImageInfo;
use crate::tga::TgaHeader;

/// Probes and resizes with the `image` crate. Resampling uses Lanczos3.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeImageTools;

fn load_image(p: &Path) -> Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

/// True when any pixel is less than fully opaque.
pub fn has_real_alpha(img: &DynamicImage) -> bool {
    if !img.color().has_alpha() {
        return false;
    }
    img.to_rgba8().pixels().any(|p| p[3] != u8::MAX)
}

fn srgb_to_linear_lut() -> &'static [u8; 256] {
    static LUT: OnceLock<[u8; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        let mut lut = [0u8; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            let c = i as f32 / 255.0;
            let l = if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            };
            *v = (l * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        lut
    })
}

/// Writes `rgba` as an uncompressed, bottom-up BGR(A) TGA.
pub fn write_tga(path: &Path, rgba: &RgbaImage, alpha: bool) -> Result<()> {
    let (w, h) = rgba.dimensions();
    let (w16, h16) = match (u16::try_from(w), u16::try_from(h)) {
        (Ok(a), Ok(b)) => (a, b),
        _ => {
            return Err(AnkiTexError::InvalidConfig(format!(
                "{w}x{h} does not fit in a TGA header"
            )));
        }
    };
    let bpp: usize = if alpha { 4 } else { 3 };
    let file = std::fs::File::create(path)?;
    let mut out = BufWriter::new(file);
    TgaHeader::truecolor(w16, h16, (bpp * 8) as u8).write(&mut out)?;
    let mut row = Vec::with_capacity(w as usize * bpp);
    for y in (0..h).rev() {
        row.clear();
        for x in 0..w {
            let p = rgba.get_pixel(x, y);
            row.extend_from_slice(&[p[2], p[1], p[0]]);
            if alpha {
                row.push(p[3]);
            }
        }
        out.write_all(&row)?;
    }
    out.flush()?;
    Ok(())
}

impl ImageIntrospector for NativeImageTools {
    fn identify(&self, path: &Path) -> Result<ImageInfo> {
        let img = load_image(path)?;
        let depth = match img.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => 8,
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => 16,
            ColorType::Rgb32F | ColorType::Rgba32F => 32,
            other => {
                return Err(AnkiTexError::Probe {
                    path: path.to_path_buf(),
                    reason: format!("unknown channel depth for {other:?}"),
                });
            }
        };
        let format = if has_real_alpha(&img) {
            ColorFormat::Rgba8
        } else {
            ColorFormat::Rgb8
        };
        let info = ImageInfo {
            format,
            width: img.width(),
            height: img.height(),
        };
        debug!(path = %path.display(), depth, ?info, "identified");
        Ok(info)
    }
}

impl ResizeService for NativeImageTools {
    fn resize(&self, req: &ResizeRequest<'_>) -> Result<PathBuf> {
        let img = load_image(req.source)?;
        let mut rgba = img.to_rgba8();
        if rgba.dimensions() != (req.width, req.height) {
            rgba = imageops::resize(&rgba, req.width, req.height, FilterType::Lanczos3);
        }
        if req.to_linear {
            let lut = srgb_to_linear_lut();
            for p in rgba.pixels_mut() {
                for c in 0..3 {
                    p[c] = lut[p[c] as usize];
                }
            }
        }
        write_tga(req.output, &rgba, req.alpha)?;
        Ok(req.output.to_path_buf())
    }
}
