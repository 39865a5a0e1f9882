use crate::error::{AnkiTexError, Result};
use crate::model::MipLevel;

/// Smallest edge a level may have; block codecs work on 4x4 texel blocks.
pub const MIN_MIP_DIM: u32 = 4;

pub fn is_pow2(v: u32) -> bool {
    v != 0 && (v & (v - 1)) == 0
}

/// Plans the mip chain for a `width` x `height` base image.
///
/// Level k+1 halves both edges of level k. The chain stops before any level
/// with an edge below 4 and holds at most `max_levels` entries.
pub fn plan_mip_chain(width: u32, height: u32, max_levels: u32) -> Result<Vec<MipLevel>> {
    if !is_pow2(width) || !is_pow2(height) {
        return Err(AnkiTexError::NotPowerOfTwo { width, height });
    }
    if width < MIN_MIP_DIM || height < MIN_MIP_DIM {
        return Err(AnkiTexError::TooSmall { width, height });
    }

    let mut levels = Vec::new();
    let (mut w, mut h) = (width, height);
    while w >= MIN_MIP_DIM && h >= MIN_MIP_DIM && (levels.len() as u32) < max_levels {
        levels.push(MipLevel::new(levels.len() as u32, w, h));
        w /= 2;
        h /= 2;
    }
    Ok(levels)
}
