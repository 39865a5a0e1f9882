//! Collaborators backed by external executables: ImageMagick, nvcompress and etcpack.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;
use tracing::{debug, trace};

use super::{
    CompressionService, EncodeRequest, ImageIntrospector, ResizeRequest, ResizeService, file_stem,
};
use crate::config::ColorFormat;
use crate::error::{AnkiTexError, Result};
use crate::model::ImageInfo;

/// Runs `cmd` to completion; a spawn failure or non-zero exit is a collaborator error.
fn run_tool(cmd: &mut Command, tool: &str) -> Result<Output> {
    trace!(?cmd, "spawn");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| AnkiTexError::collaborator(tool, format!("cannot start: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnkiTexError::collaborator(
            tool,
            format!("exit status {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(output)
}

/// `identify` and `convert` from ImageMagick.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    convert: PathBuf,
    identify: PathBuf,
}

impl ImageMagick {
    /// Uses `convert_path` for resizing and the `identify` next to it (or on `PATH`).
    pub fn new(convert_path: impl Into<PathBuf>) -> Self {
        let convert = convert_path.into();
        let sibling = convert.with_file_name("identify");
        let identify = if sibling.is_file() {
            sibling
        } else {
            PathBuf::from("identify")
        };
        Self { convert, identify }
    }

    /// Parses `"<w> <h> <depth> <channels> <opaque>"` as printed by
    /// `identify -format "%w %h %z %[channels] %[opaque]"`.
    pub fn parse_identify(path: &Path, line: &str) -> Result<ImageInfo> {
        let probe_err = |reason: &str| AnkiTexError::Probe {
            path: path.to_path_buf(),
            reason: format!("{reason} in {:?}", line.trim()),
        };
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(probe_err("truncated identify output"));
        }
        let width: u32 = fields[0].parse().map_err(|_| probe_err("bad width"))?;
        let height: u32 = fields[1].parse().map_err(|_| probe_err("bad height"))?;
        let depth: u32 = fields[2]
            .parse()
            .map_err(|_| probe_err("unknown channel depth"))?;
        if depth == 0 {
            return Err(probe_err("unknown channel depth"));
        }
        let channels = fields[3].to_ascii_lowercase();
        let opaque = fields[4].eq_ignore_ascii_case("true");
        let has_alpha = channels.ends_with('a') && !opaque;
        let format = if has_alpha {
            ColorFormat::Rgba8
        } else {
            ColorFormat::Rgb8
        };
        Ok(ImageInfo {
            format,
            width,
            height,
        })
    }

    /// Arguments for `convert` that produce one intermediate TGA.
    pub fn resize_args(req: &ResizeRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![req.source.into()];
        if req.to_linear {
            args.extend(["-set", "colorspace", "sRGB", "-colorspace", "RGB"].map(OsString::from));
        }
        // Keeps gray-looking inputs from being written as grayscale TGAs.
        args.extend(["-type", "TrueColor"].map(OsString::from));
        args.push("-resize".into());
        args.push(format!("{}x{}!", req.width, req.height).into());
        args.push("-alpha".into());
        args.push(if req.alpha { "activate" } else { "deactivate" }.into());
        args.extend(["-compress", "None"].map(OsString::from));
        args.push(req.output.into());
        args
    }
}

impl ImageIntrospector for ImageMagick {
    fn identify(&self, path: &Path) -> Result<ImageInfo> {
        let mut target = path.as_os_str().to_owned();
        target.push("[0]");
        let out = run_tool(
            Command::new(&self.identify)
                .arg("-format")
                .arg("%w %h %z %[channels] %[opaque]\n")
                .arg(target),
            "identify",
        )?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        let info = Self::parse_identify(path, stdout.lines().next().unwrap_or(""))?;
        debug!(path = %path.display(), ?info, "identified");
        Ok(info)
    }
}

impl ResizeService for ImageMagick {
    fn resize(&self, req: &ResizeRequest<'_>) -> Result<PathBuf> {
        run_tool(
            Command::new(&self.convert).args(Self::resize_args(req)),
            "convert",
        )?;
        Ok(req.output.to_path_buf())
    }
}

/// S3TC encoder: NVIDIA Texture Tools `nvcompress`.
#[derive(Debug, Clone)]
pub struct NvCompress {
    program: PathBuf,
}

impl Default for NvCompress {
    fn default() -> Self {
        Self::new("nvcompress")
    }
}

impl NvCompress {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn encode_args(req: &EncodeRequest<'_>, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-silent".into(), "-nomips".into()];
        if req.fast {
            args.push("-fast".into());
        }
        match (req.format, req.normal) {
            (ColorFormat::Rgb8, false) => args.push("-bc1".into()),
            (ColorFormat::Rgb8, true) => args.push("-bc1n".into()),
            (ColorFormat::Rgba8, false) => args.extend(["-alpha", "-bc3"].map(OsString::from)),
            (ColorFormat::Rgba8, true) => args.extend(["-alpha", "-bc3n"].map(OsString::from)),
        }
        args.push(req.input.into());
        args.push(output.into());
        args
    }
}

impl CompressionService for NvCompress {
    fn name(&self) -> &str {
        "nvcompress"
    }

    fn encode(&self, req: &EncodeRequest<'_>) -> Result<PathBuf> {
        let output = req.out_dir.join(format!("{}.dds", file_stem(req.input)));
        run_tool(
            Command::new(&self.program)
                .args(Self::encode_args(req, &output)),
            self.name(),
        )?;
        Ok(output)
    }
}

/// ETC2 encoder: Ericsson `etcpack`.
///
/// etcpack shells out to `convert` and only looks for it in its working
/// directory, so the tool is copied into `out_dir` unless a copy is already there.
#[derive(Debug)]
pub struct EtcPack {
    program: PathBuf,
    convert_path: PathBuf,
    staging: Mutex<()>,
}

impl EtcPack {
    pub fn new(program: impl Into<PathBuf>, convert_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            convert_path: convert_path.into(),
            staging: Mutex::new(()),
        }
    }

    pub fn encode_args(req: &EncodeRequest<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            req.input.into(),
            req.out_dir.into(),
            "-c".into(),
            "etc2".into(),
        ];
        if req.fast {
            args.extend(["-s", "fast"].map(OsString::from));
        }
        args.push("-f".into());
        args.push(
            match req.format {
                ColorFormat::Rgb8 => "RGB",
                ColorFormat::Rgba8 => "RGBA",
            }
            .into(),
        );
        args
    }

    /// Copies the convert tool into `out_dir` once; returns the staged path.
    pub fn stage_convert(&self, out_dir: &Path) -> Result<PathBuf> {
        let name = self.convert_path.file_name().ok_or_else(|| {
            AnkiTexError::InvalidConfig(format!(
                "convert path {} has no file name",
                self.convert_path.display()
            ))
        })?;
        let staged = out_dir.join(name);
        let _guard = self
            .staging
            .lock()
            .map_err(|_| AnkiTexError::collaborator("etcpack", "staging lock poisoned"))?;
        if !staged.is_file() {
            std::fs::copy(&self.convert_path, &staged)?;
            debug!(path = %staged.display(), "staged convert for etcpack");
        }
        Ok(staged)
    }
}

impl CompressionService for EtcPack {
    fn name(&self) -> &str {
        "etcpack"
    }

    fn encode(&self, req: &EncodeRequest<'_>) -> Result<PathBuf> {
        self.stage_convert(req.out_dir)?;
        run_tool(
            Command::new(&self.program)
                .args(Self::encode_args(req))
                .current_dir(req.out_dir),
            self.name(),
        )?;
        Ok(req.out_dir.join(format!("{}.pkm", file_stem(req.input))))
    }
}
