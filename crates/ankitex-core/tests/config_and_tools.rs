use std::ffi::OsString;
use std::path::Path;

use ankitex_core::prelude::*;
use ankitex_core::tools::{EncodeRequest, ResizeRequest};

#[test]
fn default_config_stores_s3tc_with_uncapped_mips() {
    let cfg = ConvertConfig::default();
    assert_eq!(cfg.topology, TextureTopology::TwoD);
    assert_eq!(cfg.compression, CompressionMask::S3TC);
    assert_eq!(cfg.max_mips, 0xFFFF);
    assert_eq!(cfg.filter, TextureFilter::Default);
    assert!(!cfg.require_square);
    assert!(cfg.validate().is_ok());
}

#[test]
fn validate_rejects_empty_mask_and_zero_cap() {
    let cfg = ConvertConfig::builder()
        .compression(CompressionMask::empty())
        .build();
    let err = cfg.validate().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);

    let cfg = ConvertConfig::builder().max_mips(0).build();
    assert!(matches!(cfg.validate(), Err(AnkiTexError::InvalidConfig(_))));
}

#[test]
fn no_alpha_resolves_to_rgb8() {
    let cfg = ConvertConfig::builder().no_alpha(true).build();
    assert_eq!(cfg.resolve_color_format(ColorFormat::Rgba8), ColorFormat::Rgb8);
    let cfg = ConvertConfig::default();
    assert_eq!(cfg.resolve_color_format(ColorFormat::Rgba8), ColorFormat::Rgba8);
}

#[test]
fn enums_parse_case_insensitively() {
    assert_eq!("2D".parse::<TextureTopology>(), Ok(TextureTopology::TwoD));
    assert_eq!("cube".parse::<TextureTopology>(), Ok(TextureTopology::Cube));
    assert_eq!("3d".parse::<TextureTopology>(), Ok(TextureTopology::ThreeD));
    assert_eq!("2DArray".parse::<TextureTopology>(), Ok(TextureTopology::TwoDArray));
    assert!("1D".parse::<TextureTopology>().is_err());
    assert_eq!("Nearest".parse::<TextureFilter>(), Ok(TextureFilter::Nearest));
    assert!("cubic".parse::<TextureFilter>().is_err());
    assert_eq!(TextureTopology::from_u32(4), Some(TextureTopology::TwoDArray));
    assert_eq!(ColorFormat::from_u32(3), None);
}

#[test]
fn mask_kinds_follow_container_order() {
    let mask = CompressionMask::ETC2 | CompressionMask::RAW;
    let kinds: Vec<CompressionKind> = mask.kinds().collect();
    assert_eq!(kinds, vec![CompressionKind::Raw, CompressionKind::Etc2]);
    assert_eq!(CompressionKind::S3tc.mask().bits(), 2);
}

#[test]
fn identify_output_parsing() {
    let p = Path::new("img.png");
    let rgb = ImageMagick::parse_identify(p, "256 128 8 srgb True\n").unwrap();
    assert_eq!(
        rgb,
        ImageInfo {
            format: ColorFormat::Rgb8,
            width: 256,
            height: 128
        }
    );
    let rgba = ImageMagick::parse_identify(p, "64 64 8 srgba False").unwrap();
    assert_eq!(rgba.format, ColorFormat::Rgba8);
    // Alpha channel present but every pixel opaque.
    let opaque = ImageMagick::parse_identify(p, "64 64 8 srgba True").unwrap();
    assert_eq!(opaque.format, ColorFormat::Rgb8);

    let err = ImageMagick::parse_identify(p, "64 64 0 srgb True").unwrap_err();
    assert!(matches!(err, AnkiTexError::Probe { .. }));
    assert!(ImageMagick::parse_identify(p, "64 64").is_err());
    assert!(ImageMagick::parse_identify(p, "").is_err());
}

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn convert_arguments() {
    let req = ResizeRequest {
        source: Path::new("in.png"),
        output: Path::new("out.tga"),
        width: 64,
        height: 32,
        alpha: false,
        to_linear: true,
    };
    assert_eq!(
        strings(ImageMagick::resize_args(&req)),
        [
            "in.png", "-set", "colorspace", "sRGB", "-colorspace", "RGB", "-type", "TrueColor",
            "-resize", "64x32!", "-alpha", "deactivate", "-compress", "None", "out.tga"
        ]
    );
    let req = ResizeRequest {
        alpha: true,
        to_linear: false,
        ..req
    };
    let args = strings(ImageMagick::resize_args(&req));
    assert!(!args.contains(&"-colorspace".to_string()));
    assert!(args.windows(2).any(|w| w == ["-alpha", "activate"]));
}

#[test]
fn nvcompress_arguments() {
    let req = EncodeRequest {
        input: Path::new("a.tga"),
        out_dir: Path::new("scratch"),
        format: ColorFormat::Rgba8,
        fast: true,
        normal: false,
    };
    assert_eq!(
        strings(NvCompress::encode_args(&req, Path::new("scratch/a.dds"))),
        ["-silent", "-nomips", "-fast", "-alpha", "-bc3", "a.tga", "scratch/a.dds"]
    );
    let req = EncodeRequest {
        format: ColorFormat::Rgb8,
        fast: false,
        normal: true,
        ..req
    };
    assert_eq!(
        strings(NvCompress::encode_args(&req, Path::new("o.dds"))),
        ["-silent", "-nomips", "-bc1n", "a.tga", "o.dds"]
    );
}

#[test]
fn etcpack_arguments() {
    let req = EncodeRequest {
        input: Path::new("a.tga"),
        out_dir: Path::new("scratch"),
        format: ColorFormat::Rgb8,
        fast: true,
        normal: false,
    };
    assert_eq!(
        strings(EtcPack::encode_args(&req)),
        ["a.tga", "scratch", "-c", "etc2", "-s", "fast", "-f", "RGB"]
    );
    let req = EncodeRequest {
        format: ColorFormat::Rgba8,
        fast: false,
        ..req
    };
    assert_eq!(
        strings(EtcPack::encode_args(&req)),
        ["a.tga", "scratch", "-c", "etc2", "-f", "RGBA"]
    );
}

#[test]
fn failing_tool_is_a_collaborator_error() {
    let dir = tempfile::tempdir().unwrap();
    let nv = NvCompress::new(dir.path().join("no-such-nvcompress"));
    let req = EncodeRequest {
        input: Path::new("a.tga"),
        out_dir: dir.path(),
        format: ColorFormat::Rgb8,
        fast: false,
        normal: false,
    };
    let err = nv.encode(&req).unwrap_err();
    assert!(matches!(err, AnkiTexError::Collaborator { .. }));
    assert_eq!(err.category(), ErrorCategory::Collaborator);
}

#[test]
fn etcpack_stages_convert_once_per_directory() {
    let tools = tempfile::tempdir().unwrap();
    let convert = tools.path().join("convert");
    std::fs::write(&convert, b"#!/bin/sh\n").unwrap();
    let etc = EtcPack::new(tools.path().join("no-such-etcpack"), &convert);

    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let staged = etc.stage_convert(a.path()).unwrap();
    assert_eq!(staged, a.path().join("convert"));
    assert_eq!(etc.stage_convert(a.path()).unwrap(), staged);
    assert_eq!(std::fs::read_dir(a.path()).unwrap().count(), 1);

    let other = etc.stage_convert(b.path()).unwrap();
    assert!(other.is_file());

    // A removed copy is staged again.
    std::fs::remove_file(&staged).unwrap();
    etc.stage_convert(a.path()).unwrap();
    assert!(staged.is_file());

    let req = EncodeRequest {
        input: Path::new("a.tga"),
        out_dir: b.path(),
        format: ColorFormat::Rgb8,
        fast: false,
        normal: false,
    };
    let err = etc.encode(&req).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Collaborator);
    assert!(other.is_file());
}

#[test]
fn report_summary_lists_levels_and_kinds() {
    let report = ConvertReport {
        output: "t.ankitex".into(),
        width: 8,
        height: 8,
        image_count: 1,
        color_format: ColorFormat::Rgb8,
        levels: vec![MipLevel::new(0, 8, 8), MipLevel::new(1, 4, 4)],
        kinds: vec![CompressionKind::Raw],
        block_count: 2,
        bytes_written: 128 + 192 + 48,
    };
    assert!(report.summary().contains("2 level(s)"));
    assert!(report.summary().contains("raw"));
}
