#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ankitex_core::container::block_size;
use ankitex_core::dds::{DdsHeader, FOURCC_DXT1, FOURCC_DXT5};
use ankitex_core::pkm::{PKM_TYPE_ETC2_RGB, PKM_TYPE_ETC2_RGBA, PkmHeader};
use ankitex_core::prelude::*;
use ankitex_core::tga::TgaHeader;
use ankitex_core::tools::{EncodeRequest, ResizeRequest};
use image::{Rgb, RgbImage, Rgba, RgbaImage};

pub fn write_rgb_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let img = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 7]));
    let path = dir.join(name);
    img.save(&path).expect("save png");
    path
}

/// RGBA image whose top-left pixel has alpha `corner_alpha`; every other pixel is opaque.
pub fn write_rgba_png(dir: &Path, name: &str, w: u32, h: u32, corner_alpha: u8) -> PathBuf {
    let img = RgbaImage::from_fn(w, h, |x, y| {
        let a = if x == 0 && y == 0 { corner_alpha } else { 255 };
        Rgba([x as u8, y as u8, 9, a])
    });
    let path = dir.join(name);
    img.save(&path).expect("save png");
    path
}

pub fn tga_dims(path: &Path) -> (u32, u32) {
    let mut f = File::open(path).expect("open tga");
    let h = TgaHeader::read(&mut f).expect("tga header");
    (u32::from(h.width), u32::from(h.height))
}

fn stem(path: &Path) -> String {
    path.file_stem().unwrap().to_string_lossy().into_owned()
}

/// Answers every probe with the entry for the path, or `default`.
pub struct FakeProbe {
    pub default: ImageInfo,
    pub per_path: HashMap<PathBuf, ImageInfo>,
}

impl FakeProbe {
    pub fn uniform(format: ColorFormat, width: u32, height: u32) -> Self {
        Self {
            default: ImageInfo { format, width, height },
            per_path: HashMap::new(),
        }
    }
}

impl ImageIntrospector for FakeProbe {
    fn identify(&self, path: &Path) -> ankitex_core::Result<ImageInfo> {
        Ok(*self.per_path.get(path).unwrap_or(&self.default))
    }
}

/// Counts calls and always fails.
#[derive(Default)]
pub struct CountingResizer {
    pub calls: AtomicUsize,
}

impl CountingResizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResizeService for CountingResizer {
    fn resize(&self, _req: &ResizeRequest<'_>) -> ankitex_core::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AnkiTexError::Collaborator {
            tool: "counting".into(),
            reason: "not expected to run".into(),
        })
    }
}

/// Resizes in-process until call `fail_on` (1-based), which fails.
pub struct FailingResizer {
    pub fail_on: usize,
    pub calls: AtomicUsize,
}

impl FailingResizer {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ResizeService for FailingResizer {
    fn resize(&self, req: &ResizeRequest<'_>) -> ankitex_core::Result<PathBuf> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(AnkiTexError::Collaborator {
                tool: "resize".into(),
                reason: format!("failed on call {call}"),
            });
        }
        NativeImageTools.resize(req)
    }
}

/// Writes a DDS for the intermediate it is given. The payload is filled with
/// the low byte of the level width.
#[derive(Default)]
pub struct FakeDds {
    pub four_cc: Option<[u8; 4]>,
    pub last_dir: Mutex<Option<PathBuf>>,
}

impl FakeDds {
    pub fn with_four_cc(four_cc: [u8; 4]) -> Self {
        Self {
            four_cc: Some(four_cc),
            last_dir: Mutex::new(None),
        }
    }

    pub fn last_dir(&self) -> Option<PathBuf> {
        self.last_dir.lock().unwrap().clone()
    }
}

impl CompressionService for FakeDds {
    fn name(&self) -> &str {
        "fake-dds"
    }

    fn encode(&self, req: &EncodeRequest<'_>) -> ankitex_core::Result<PathBuf> {
        *self.last_dir.lock().unwrap() = Some(req.out_dir.to_path_buf());
        let (w, h) = tga_dims(req.input);
        let four_cc = self.four_cc.unwrap_or(match req.format {
            ColorFormat::Rgb8 => FOURCC_DXT1,
            ColorFormat::Rgba8 => FOURCC_DXT5,
        });
        let size = block_size(CompressionKind::S3tc, w, h, req.format);
        let out = req.out_dir.join(format!("{}.dds", stem(req.input)));
        let mut f = File::create(&out)?;
        DdsHeader::compressed(w, h, four_cc, size as u32).write(&mut f)?;
        f.write_all(&vec![w as u8; size])?;
        Ok(out)
    }
}

/// Writes a PKM for the intermediate it is given, with a configurable magic.
pub struct FakePkm {
    pub magic: [u8; 6],
}

impl Default for FakePkm {
    fn default() -> Self {
        Self { magic: *b"PKM 20" }
    }
}

impl CompressionService for FakePkm {
    fn name(&self) -> &str {
        "fake-pkm"
    }

    fn encode(&self, req: &EncodeRequest<'_>) -> ankitex_core::Result<PathBuf> {
        let (w, h) = tga_dims(req.input);
        let ty = match req.format {
            ColorFormat::Rgb8 => PKM_TYPE_ETC2_RGB,
            ColorFormat::Rgba8 => PKM_TYPE_ETC2_RGBA,
        };
        let mut header = PkmHeader::new(ty, w as u16, h as u16);
        header.magic = self.magic;
        let size = block_size(CompressionKind::Etc2, w, h, req.format);
        let out = req.out_dir.join(format!("{}.pkm", stem(req.input)));
        let mut f = File::create(&out)?;
        header.write(&mut f)?;
        f.write_all(&vec![0xE7; size])?;
        Ok(out)
    }
}
