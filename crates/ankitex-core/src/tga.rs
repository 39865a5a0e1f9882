//! Uncompressed truecolor TGA, the interchange format of the resize stage.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

pub const TGA_HEADER_SIZE: usize = 18;
/// Uncompressed true-color image.
pub const TGA_TYPE_TRUECOLOR: u8 = 2;
/// Run-length encoded true-color image.
pub const TGA_TYPE_TRUECOLOR_RLE: u8 = 10;

const DESC_RIGHT_TO_LEFT: u8 = 0x10;
const DESC_TOP_TO_BOTTOM: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_first: u16,
    pub color_map_length: u16,
    pub color_map_entry_size: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

impl TgaHeader {
    /// Header of a bottom-up uncompressed BGR(A) image.
    pub fn truecolor(width: u16, height: u16, pixel_depth: u8) -> Self {
        Self {
            id_length: 0,
            color_map_type: 0,
            image_type: TGA_TYPE_TRUECOLOR,
            color_map_first: 0,
            color_map_length: 0,
            color_map_entry_size: 0,
            x_origin: 0,
            y_origin: 0,
            width,
            height,
            pixel_depth,
            descriptor: if pixel_depth == 32 { 8 } else { 0 },
        }
    }

    pub fn read<R: Read>(r: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            id_length: r.read_u8()?,
            color_map_type: r.read_u8()?,
            image_type: r.read_u8()?,
            color_map_first: r.read_u16::<LittleEndian>()?,
            color_map_length: r.read_u16::<LittleEndian>()?,
            color_map_entry_size: r.read_u8()?,
            x_origin: r.read_u16::<LittleEndian>()?,
            y_origin: r.read_u16::<LittleEndian>()?,
            width: r.read_u16::<LittleEndian>()?,
            height: r.read_u16::<LittleEndian>()?,
            pixel_depth: r.read_u8()?,
            descriptor: r.read_u8()?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u8(self.id_length)?;
        w.write_u8(self.color_map_type)?;
        w.write_u8(self.image_type)?;
        w.write_u16::<LittleEndian>(self.color_map_first)?;
        w.write_u16::<LittleEndian>(self.color_map_length)?;
        w.write_u8(self.color_map_entry_size)?;
        w.write_u16::<LittleEndian>(self.x_origin)?;
        w.write_u16::<LittleEndian>(self.y_origin)?;
        w.write_u16::<LittleEndian>(self.width)?;
        w.write_u16::<LittleEndian>(self.height)?;
        w.write_u8(self.pixel_depth)?;
        w.write_u8(self.descriptor)
    }

    /// Rows are stored top row first.
    pub fn is_top_down(&self) -> bool {
        self.descriptor & DESC_TOP_TO_BOTTOM != 0
    }

    pub fn is_right_to_left(&self) -> bool {
        self.descriptor & DESC_RIGHT_TO_LEFT != 0
    }
}
