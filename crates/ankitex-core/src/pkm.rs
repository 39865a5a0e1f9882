//! PKM header written by ETC encoders. All fields are big-endian.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Magic of a version 2.0 PKM file.
pub const PKM_MAGIC_V20: [u8; 6] = *b"PKM 20";
pub const PKM_HEADER_SIZE: usize = 16;

/// ETC2 RGB, no alpha.
pub const PKM_TYPE_ETC2_RGB: u16 = 1;
/// ETC2 RGBA8 with EAC alpha.
pub const PKM_TYPE_ETC2_RGBA: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PkmHeader {
    pub magic: [u8; 6],
    pub texture_type: u16,
    /// Width rounded up to a multiple of 4.
    pub width: u16,
    /// Height rounded up to a multiple of 4.
    pub height: u16,
    pub orig_width: u16,
    pub orig_height: u16,
}

impl PkmHeader {
    pub fn new(texture_type: u16, width: u16, height: u16) -> Self {
        Self {
            magic: PKM_MAGIC_V20,
            texture_type,
            width: width.div_ceil(4) * 4,
            height: height.div_ceil(4) * 4,
            orig_width: width,
            orig_height: height,
        }
    }

    pub fn read<R: Read>(r: &mut R) -> std::io::Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        Ok(Self {
            magic,
            texture_type: r.read_u16::<BigEndian>()?,
            width: r.read_u16::<BigEndian>()?,
            height: r.read_u16::<BigEndian>()?,
            orig_width: r.read_u16::<BigEndian>()?,
            orig_height: r.read_u16::<BigEndian>()?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_u16::<BigEndian>(self.texture_type)?;
        w.write_u16::<BigEndian>(self.width)?;
        w.write_u16::<BigEndian>(self.height)?;
        w.write_u16::<BigEndian>(self.orig_width)?;
        w.write_u16::<BigEndian>(self.orig_height)
    }

    pub fn is_v20(&self) -> bool {
        self.magic == PKM_MAGIC_V20
    }
}
