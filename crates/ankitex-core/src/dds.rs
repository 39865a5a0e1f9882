//! Legacy DDS header (magic + `DDSURFACEDESC2`), as written by S3TC encoders.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub const DDS_MAGIC: [u8; 4] = *b"DDS ";
/// Magic plus the 124-byte surface description.
pub const DDS_HEADER_SIZE: usize = 128;
const DDS_DESC_SIZE: u32 = 124;
const DDS_PIXELFORMAT_SIZE: u32 = 32;

pub const FOURCC_DXT1: [u8; 4] = *b"DXT1";
pub const FOURCC_DXT5: [u8; 4] = *b"DXT5";

// dwFlags
pub const DDSD_CAPS: u32 = 0x0000_0001;
pub const DDSD_HEIGHT: u32 = 0x0000_0002;
pub const DDSD_WIDTH: u32 = 0x0000_0004;
pub const DDSD_PIXELFORMAT: u32 = 0x0000_1000;
pub const DDSD_LINEARSIZE: u32 = 0x0008_0000;
// ddpfPixelFormat.dwFlags
pub const DDPF_FOURCC: u32 = 0x0000_0004;
// dwCaps1
pub const DDSCAPS_TEXTURE: u32 = 0x0000_1000;

/// DDS pixel format block (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub four_cc: [u8; 4],
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

/// The fields of a legacy DDS header that this crate looks at or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsHeader {
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub pixel_format: DdsPixelFormat,
    pub caps1: u32,
    pub caps2: u32,
}

impl DdsHeader {
    /// A header for a single-level block-compressed surface.
    pub fn compressed(width: u32, height: u32, four_cc: [u8; 4], linear_size: u32) -> Self {
        Self {
            size: DDS_DESC_SIZE,
            flags: DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE,
            height,
            width,
            pitch_or_linear_size: linear_size,
            depth: 0,
            mip_map_count: 0,
            pixel_format: DdsPixelFormat {
                size: DDS_PIXELFORMAT_SIZE,
                flags: DDPF_FOURCC,
                four_cc,
                ..Default::default()
            },
            caps1: DDSCAPS_TEXTURE,
            caps2: 0,
        }
    }

    /// Parses magic and surface description; the magic must be `DDS `.
    pub fn read<R: Read>(r: &mut R) -> std::io::Result<Option<Self>> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if magic != DDS_MAGIC {
            return Ok(None);
        }
        let size = r.read_u32::<LittleEndian>()?;
        let flags = r.read_u32::<LittleEndian>()?;
        let height = r.read_u32::<LittleEndian>()?;
        let width = r.read_u32::<LittleEndian>()?;
        let pitch_or_linear_size = r.read_u32::<LittleEndian>()?;
        let depth = r.read_u32::<LittleEndian>()?;
        let mip_map_count = r.read_u32::<LittleEndian>()?;
        let mut reserved1 = [0u8; 44];
        r.read_exact(&mut reserved1)?;

        let pf_size = r.read_u32::<LittleEndian>()?;
        let pf_flags = r.read_u32::<LittleEndian>()?;
        let mut four_cc = [0u8; 4];
        r.read_exact(&mut four_cc)?;
        let rgb_bit_count = r.read_u32::<LittleEndian>()?;
        let r_bit_mask = r.read_u32::<LittleEndian>()?;
        let g_bit_mask = r.read_u32::<LittleEndian>()?;
        let b_bit_mask = r.read_u32::<LittleEndian>()?;
        let a_bit_mask = r.read_u32::<LittleEndian>()?;

        let caps1 = r.read_u32::<LittleEndian>()?;
        let caps2 = r.read_u32::<LittleEndian>()?;
        let mut caps_reserved = [0u8; 8];
        r.read_exact(&mut caps_reserved)?;
        let _reserved2 = r.read_u32::<LittleEndian>()?;

        Ok(Some(Self {
            size,
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mip_map_count,
            pixel_format: DdsPixelFormat {
                size: pf_size,
                flags: pf_flags,
                four_cc,
                rgb_bit_count,
                r_bit_mask,
                g_bit_mask,
                b_bit_mask,
                a_bit_mask,
            },
            caps1,
            caps2,
        }))
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&DDS_MAGIC)?;
        w.write_u32::<LittleEndian>(self.size)?;
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_u32::<LittleEndian>(self.height)?;
        w.write_u32::<LittleEndian>(self.width)?;
        w.write_u32::<LittleEndian>(self.pitch_or_linear_size)?;
        w.write_u32::<LittleEndian>(self.depth)?;
        w.write_u32::<LittleEndian>(self.mip_map_count)?;
        w.write_all(&[0u8; 44])?;
        let pf = &self.pixel_format;
        w.write_u32::<LittleEndian>(pf.size)?;
        w.write_u32::<LittleEndian>(pf.flags)?;
        w.write_all(&pf.four_cc)?;
        w.write_u32::<LittleEndian>(pf.rgb_bit_count)?;
        w.write_u32::<LittleEndian>(pf.r_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.g_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.b_bit_mask)?;
        w.write_u32::<LittleEndian>(pf.a_bit_mask)?;
        w.write_u32::<LittleEndian>(self.caps1)?;
        w.write_u32::<LittleEndian>(self.caps2)?;
        w.write_all(&[0u8; 8])?;
        w.write_u32::<LittleEndian>(0)
    }

    pub fn four_cc_str(&self) -> String {
        String::from_utf8_lossy(&self.pixel_format.four_cc).into_owned()
    }
}
