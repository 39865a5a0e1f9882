use std::path::Path;

use ankitex_core::codec::etc2::validate_pkm;
use ankitex_core::codec::raw::extract_raw;
use ankitex_core::codec::s3tc::{expected_four_cc, validate_dds};
use ankitex_core::dds::{DdsHeader, FOURCC_DXT1, FOURCC_DXT5};
use ankitex_core::pkm::{PKM_TYPE_ETC2_RGB, PkmHeader};
use ankitex_core::prelude::*;
use ankitex_core::tga::TgaHeader;

fn dds_bytes(w: u32, h: u32, four_cc: [u8; 4], payload: usize) -> Vec<u8> {
    let mut out = Vec::new();
    DdsHeader::compressed(w, h, four_cc, payload as u32)
        .write(&mut out)
        .unwrap();
    out.extend((0..payload).map(|i| i as u8));
    out
}

fn pkm_bytes(magic: [u8; 6], w: u16, h: u16, payload: usize) -> Vec<u8> {
    let mut header = PkmHeader::new(PKM_TYPE_ETC2_RGB, w, h);
    header.magic = magic;
    let mut out = Vec::new();
    header.write(&mut out).unwrap();
    out.extend(std::iter::repeat_n(0xAB, payload));
    out
}

fn path() -> &'static Path {
    Path::new("unit.bin")
}

#[test]
fn dds_accepts_matching_four_cc() {
    let level = MipLevel::new(0, 8, 8);
    let rgb = validate_dds(&dds_bytes(8, 8, FOURCC_DXT1, 32), &level, ColorFormat::Rgb8, path())
        .expect("dxt1 for rgb8");
    assert_eq!(rgb.len(), 32);
    assert_eq!(rgb[1], 1);

    let rgba = validate_dds(&dds_bytes(8, 8, FOURCC_DXT5, 64), &level, ColorFormat::Rgba8, path())
        .expect("dxt5 for rgba8");
    assert_eq!(rgba.len(), 64);
}

#[test]
fn dds_rejects_mismatched_four_cc() {
    let level = MipLevel::new(0, 8, 8);
    for (bytes, fmt) in [
        (dds_bytes(8, 8, FOURCC_DXT5, 64), ColorFormat::Rgb8),
        (dds_bytes(8, 8, FOURCC_DXT1, 32), ColorFormat::Rgba8),
        (dds_bytes(8, 8, *b"DXT3", 64), ColorFormat::Rgba8),
        (dds_bytes(8, 8, *b"ATI2", 64), ColorFormat::Rgb8),
    ] {
        let err = validate_dds(&bytes, &level, fmt, path()).unwrap_err();
        assert!(
            matches!(err, AnkiTexError::UnexpectedCodecFormat { .. }),
            "{err}"
        );
        assert_eq!(err.category(), ErrorCategory::Collaborator);
    }
    assert_eq!(expected_four_cc(ColorFormat::Rgb8), FOURCC_DXT1);
    assert_eq!(expected_four_cc(ColorFormat::Rgba8), FOURCC_DXT5);
}

#[test]
fn dds_rejects_wrong_size_magic_and_short_payload() {
    let level = MipLevel::new(1, 8, 8);
    assert!(validate_dds(&dds_bytes(16, 8, FOURCC_DXT1, 64), &level, ColorFormat::Rgb8, path()).is_err());

    let mut bad_magic = dds_bytes(8, 8, FOURCC_DXT1, 32);
    bad_magic[..4].copy_from_slice(b"XDS ");
    assert!(validate_dds(&bad_magic, &level, ColorFormat::Rgb8, path()).is_err());

    let truncated = dds_bytes(8, 8, FOURCC_DXT1, 31);
    assert!(validate_dds(&truncated, &level, ColorFormat::Rgb8, path()).is_err());

    assert!(validate_dds(b"DDS ", &level, ColorFormat::Rgb8, path()).is_err());
}

#[test]
fn dds_trailing_bytes_are_dropped() {
    let level = MipLevel::new(0, 4, 4);
    let mut bytes = dds_bytes(4, 4, FOURCC_DXT1, 8);
    bytes.extend_from_slice(&[0xFF; 5]);
    let payload = validate_dds(&bytes, &level, ColorFormat::Rgb8, path()).unwrap();
    assert_eq!(payload, (0..8).collect::<Vec<u8>>());
}

#[test]
fn pkm_accepts_v20_with_matching_size() {
    let level = MipLevel::new(0, 16, 8);
    let payload = validate_pkm(&pkm_bytes(*b"PKM 20", 16, 8, 64), &level, ColorFormat::Rgb8, path())
        .expect("valid pkm");
    assert_eq!(payload.len(), (16 / 4) * (8 / 4) * 8);
}

#[test]
fn pkm_rejects_other_versions_and_sizes() {
    let level = MipLevel::new(0, 16, 8);
    let err = validate_pkm(&pkm_bytes(*b"PKM 10", 16, 8, 64), &level, ColorFormat::Rgb8, path())
        .unwrap_err();
    assert!(matches!(err, AnkiTexError::UnexpectedCodecFormat { .. }));

    assert!(validate_pkm(&pkm_bytes(*b"PKM 20", 8, 8, 64), &level, ColorFormat::Rgb8, path()).is_err());
    assert!(validate_pkm(&pkm_bytes(*b"PKM 20", 16, 8, 63), &level, ColorFormat::Rgb8, path()).is_err());
    assert!(validate_pkm(b"PKM 20", &level, ColorFormat::Rgb8, path()).is_err());
}

/// 2x2 BGR(A) TGA; `pixels` are given in file order.
fn tga_bytes(depth: u8, descriptor: u8, pixels: &[&[u8]]) -> Vec<u8> {
    let mut h = TgaHeader::truecolor(2, 2, depth);
    h.descriptor = descriptor;
    let mut out = Vec::new();
    h.write(&mut out).unwrap();
    for p in pixels {
        out.extend_from_slice(p);
    }
    out
}

#[test]
fn raw_swaps_channels_and_flips_bottom_up_rows() {
    // File order is bottom row first: (B,G,R) triples.
    let bytes = tga_bytes(
        24,
        0,
        &[&[1, 2, 3], &[4, 5, 6], &[7, 8, 9], &[10, 11, 12]],
    );
    let level = MipLevel::new(0, 2, 2);
    let rgb = extract_raw(&bytes, &level, ColorFormat::Rgb8, path()).unwrap();
    assert_eq!(rgb, vec![9, 8, 7, 12, 11, 10, 3, 2, 1, 6, 5, 4]);
}

#[test]
fn raw_keeps_top_down_rows_and_alpha() {
    let bytes = tga_bytes(
        32,
        0x28,
        &[&[1, 2, 3, 4], &[5, 6, 7, 8], &[9, 10, 11, 12], &[13, 14, 15, 16]],
    );
    let level = MipLevel::new(0, 2, 2);
    let rgba = extract_raw(&bytes, &level, ColorFormat::Rgba8, path()).unwrap();
    assert_eq!(
        rgba,
        vec![3, 2, 1, 4, 7, 6, 5, 8, 11, 10, 9, 12, 15, 14, 13, 16]
    );
}

#[test]
fn raw_rejects_unexpected_layouts() {
    let level = MipLevel::new(0, 2, 2);
    let px: &[&[u8]] = &[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0], &[0, 0, 0]];

    // 24 bpp where 32 is expected
    let err = extract_raw(&tga_bytes(24, 0, px), &level, ColorFormat::Rgba8, path()).unwrap_err();
    assert!(matches!(err, AnkiTexError::UnexpectedRawLayout { .. }));

    // wrong size
    let other = MipLevel::new(0, 4, 4);
    assert!(extract_raw(&tga_bytes(24, 0, px), &other, ColorFormat::Rgb8, path()).is_err());

    // right-to-left
    assert!(extract_raw(&tga_bytes(24, 0x10, px), &level, ColorFormat::Rgb8, path()).is_err());

    // RLE
    let mut rle = tga_bytes(24, 0, px);
    rle[2] = 10;
    let err = extract_raw(&rle, &level, ColorFormat::Rgb8, path()).unwrap_err();
    assert!(err.to_string().contains("run-length encoded"), "{err}");

    // truncated pixels
    let full = tga_bytes(24, 0, px);
    assert!(extract_raw(&full[..full.len() - 1], &level, ColorFormat::Rgb8, path()).is_err());
}

#[test]
fn raw_skips_image_id_field() {
    let mut h = TgaHeader::truecolor(2, 2, 24);
    h.id_length = 3;
    h.descriptor = 0x20;
    let mut bytes = Vec::new();
    h.write(&mut bytes).unwrap();
    bytes.extend_from_slice(b"abc");
    bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let level = MipLevel::new(0, 2, 2);
    let rgb = extract_raw(&bytes, &level, ColorFormat::Rgb8, path()).unwrap();
    assert_eq!(&rgb[..3], &[3, 2, 1]);
}
