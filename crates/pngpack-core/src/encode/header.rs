//! Fixed-layout payloads: the PNG signature, IHDR and gAMA.

use crate::options::ColorType;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Size of the IHDR payload.
pub const IHDR_LENGTH: usize = 13;

/// Largest width or height PNG allows (2^31 - 1).
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// The values written into the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
}

impl ImageHeader {
    /// Serialize to the 13-byte IHDR payload.
    ///
    /// Compression method, filter method and interlace method are always 0.
    pub fn to_payload(&self) -> [u8; IHDR_LENGTH] {
        let mut buf = [0u8; IHDR_LENGTH];
        buf[0..4].copy_from_slice(&self.width.to_be_bytes());
        buf[4..8].copy_from_slice(&self.height.to_be_bytes());
        buf[8] = self.bit_depth;
        buf[9] = self.color_type.code();
        // buf[10..13]: compression, filter, interlace
        buf
    }
}

/// The gAMA payload for an already-scaled gamma value.
#[inline]
pub fn gamma_payload(scaled: u32) -> [u8; 4] {
    scaled.to_be_bytes()
}
