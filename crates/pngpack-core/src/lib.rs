//! pngpack Core - PNG container encoder
//!
//! This crate turns raw truecolor pixel data into a PNG byte stream: the
//! signature, an IHDR header, an optional gAMA chunk, one IDAT chunk per
//! compressed segment and the IEND trailer, each framed with its length and
//! CRC-32.
//!
//! The pixel payload passes through two pluggable stages:
//! - a [`FilterStage`] that applies per-scanline PNG filters
//! - a [`CompressionStage`] that deflates the filtered bytes into segments
//!
//! # Usage
//!
//! ```ignore
//! use pngpack_core::{Packer, PackerOptions};
//!
//! let packer = Packer::new(PackerOptions::default())?;
//! for chunk in packer.pack(&pixels, width, height, None)? {
//!     sink.write_all(&chunk?)?;
//! }
//! ```

pub mod chunk;
pub mod crc;
pub mod deflate;
pub mod encode;
pub mod error;
pub mod filter;
pub mod options;

pub use chunk::{frame, frame_u32, write_chunk, ChunkType, CHUNK_OVERHEAD, MAX_CHUNK_LENGTH};
pub use crc::{crc32, Crc32};
pub use deflate::{CompressionError, CompressionStage, SegmentStream, ZlibStage};
pub use encode::{
    pixels_from_image, ImageHeader, PackEvent, PackReceiver, PackState, PackStream, Packer,
    PNG_SIGNATURE,
};
pub use error::PackError;
pub use filter::{AdaptiveFilter, FilterStage};
pub use options::{
    ColorType, DeflateOptions, DeflateStrategy, FilterOptions, FilterSelection, FilterType,
    PackerOptions,
};
