//! One byte per voxel: block light in the low nibble, skylight in the high nibble.

pub const MAX_LIGHT: u8 = 15;

#[inline]
pub fn block_nibble(packed: u8) -> u8 {
    packed & 0x0F
}

#[inline]
pub fn sky_nibble(packed: u8) -> u8 {
    packed >> 4
}

#[inline]
pub fn with_block(packed: u8, level: u8) -> u8 {
    (packed & 0xF0) | (level.min(MAX_LIGHT))
}

#[inline]
pub fn with_sky(packed: u8, level: u8) -> u8 {
    (packed & 0x0F) | (level.min(MAX_LIGHT) << 4)
}

#[inline]
pub fn pack(block: u8, sky: u8) -> u8 {
    with_sky(with_block(0, block), sky)
}
