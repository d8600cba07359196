//! PNG chunk framing.
//!
//! Every chunk on the wire is laid out as:
//!
//! ```text
//! [ length (4, BE) ][ type (4) ][ payload (length) ][ crc (4, BE) ]
//! ```
//!
//! The CRC covers the type code and the payload, never the length field.

use std::fmt;

use crate::crc::Crc32;
use crate::error::PackError;

/// Largest payload a chunk length field may declare (2^31 - 1).
pub const MAX_CHUNK_LENGTH: usize = i32::MAX as usize;

/// Bytes of framing around every payload: length, type and CRC.
pub const CHUNK_OVERHEAD: usize = 12;

/// A four-byte chunk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    /// Image header.
    pub const IHDR: ChunkType = ChunkType(*b"IHDR");
    /// Image gamma.
    #[allow(non_upper_case_globals)]
    pub const gAMA: ChunkType = ChunkType(*b"gAMA");
    /// Compressed image data.
    pub const IDAT: ChunkType = ChunkType(*b"IDAT");
    /// Image trailer.
    pub const IEND: ChunkType = ChunkType(*b"IEND");

    /// Build a type from its big-endian integer form (e.g. `0x49484452` for IHDR).
    pub const fn from_u32(code: u32) -> Self {
        ChunkType(code.to_be_bytes())
    }

    /// The big-endian integer form of this type code.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// The four ASCII bytes of the code, as written on the wire.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// Reject payloads longer than `max`.
#[inline]
fn check_payload_len(length: usize, max: usize) -> Result<u32, PackError> {
    if length > max {
        return Err(PackError::PayloadTooLarge { length, max });
    }
    Ok(length as u32)
}

/// Append a framed chunk to `out`.
///
/// Nothing is written if the payload is too large.
pub fn write_chunk(out: &mut Vec<u8>, chunk_type: ChunkType, payload: &[u8]) -> Result<(), PackError> {
    write_chunk_within(out, chunk_type, payload, MAX_CHUNK_LENGTH)
}

fn write_chunk_within(
    out: &mut Vec<u8>,
    chunk_type: ChunkType,
    payload: &[u8],
    max: usize,
) -> Result<(), PackError> {
    let length = check_payload_len(payload.len(), max)?;

    out.reserve(payload.len() + CHUNK_OVERHEAD);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(chunk_type.as_bytes());
    out.extend_from_slice(payload);

    let mut crc = Crc32::new();
    crc.update(chunk_type.as_bytes());
    crc.update(payload);
    out.extend_from_slice(&crc.finalize().to_be_bytes());

    Ok(())
}

/// Frame `payload` as a standalone chunk of the given type.
///
/// An empty payload produces a 12-byte chunk with a zero length field.
pub fn frame(chunk_type: ChunkType, payload: &[u8]) -> Result<Vec<u8>, PackError> {
    let mut out = Vec::with_capacity(payload.len() + CHUNK_OVERHEAD);
    write_chunk(&mut out, chunk_type, payload)?;
    Ok(out)
}

/// Same as [`frame`], taking the type as a big-endian integer code.
pub fn frame_u32(type_code: u32, payload: &[u8]) -> Result<Vec<u8>, PackError> {
    frame(ChunkType::from_u32(type_code), payload)
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::ChunkType;

    /// A chunk split back out of an encoded stream.
    #[derive(Debug, Clone)]
    pub struct ParsedChunk {
        pub chunk_type: ChunkType,
        pub payload: Vec<u8>,
        pub crc: u32,
    }

    /// Split a byte stream (without signature) into chunks.
    pub fn split_chunks(mut bytes: &[u8]) -> Vec<ParsedChunk> {
        let mut chunks = Vec::new();
        while !bytes.is_empty() {
            let len = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
            let chunk_type = ChunkType(bytes[4..8].try_into().unwrap());
            let payload = bytes[8..8 + len].to_vec();
            let crc = u32::from_be_bytes(bytes[8 + len..12 + len].try_into().unwrap());
            chunks.push(ParsedChunk {
                chunk_type,
                payload,
                crc,
            });
            bytes = &bytes[12 + len..];
        }
        chunks
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
