//! The PNG packer: validates input once, then drives the chunk stream.

use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use log::debug;

use super::header::{ImageHeader, MAX_DIMENSION};
use super::stream::{PackStream, PendingImage};
use crate::deflate::{CompressionStage, ZlibStage};
use crate::error::PackError;
use crate::filter::{AdaptiveFilter, FilterStage};
use crate::options::{gamma_to_fixed, PackerOptions};

/// Encodes raw pixels into PNG byte streams.
///
/// A `Packer` holds validated options plus the filter and compression
/// stages. It carries no per-image state, so one instance can serve any
/// number of concurrent pack operations.
#[derive(Clone)]
pub struct Packer {
    options: PackerOptions,
    filter: Arc<dyn FilterStage>,
    compression: Arc<dyn CompressionStage>,
}

impl fmt::Debug for Packer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Packer {
    /// Create a packer with the default filter and zlib stages.
    ///
    /// # Errors
    ///
    /// Returns `PackError::InvalidConfiguration` if any option is out of range.
    pub fn new(options: PackerOptions) -> Result<Self, PackError> {
        Self::with_stages(options, Arc::new(AdaptiveFilter), Arc::new(ZlibStage))
    }

    /// Create a packer with custom filter and compression stages.
    pub fn with_stages(
        options: PackerOptions,
        filter: Arc<dyn FilterStage>,
        compression: Arc<dyn CompressionStage>,
    ) -> Result<Self, PackError> {
        options.validate()?;
        Ok(Self {
            options,
            filter,
            compression,
        })
    }

    /// The validated options this packer was built with.
    pub fn options(&self) -> &PackerOptions {
        &self.options
    }

    /// Start packing an image.
    ///
    /// # Arguments
    ///
    /// * `pixels` - Row-major samples, `width * height * bytes_per_pixel` bytes
    ///   (16-bit samples big-endian)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `gamma` - Optional gamma; overrides `PackerOptions::gamma`
    ///
    /// # Errors
    ///
    /// Dimension, pixel-length and gamma problems are reported here, before
    /// any byte is produced. Compression failures arrive later through the
    /// returned stream.
    pub fn pack<'a>(
        &self,
        pixels: &'a [u8],
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<PackStream<'a>, PackError> {
        self.prepare(Cow::Borrowed(pixels), width, height, gamma)
    }

    /// Pack an image into a single buffer.
    pub fn pack_to_vec(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<Vec<u8>, PackError> {
        let mut out = Vec::new();
        for chunk in self.pack(pixels, width, height, gamma)? {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Pack an image straight into a writer, returning the bytes written.
    ///
    /// On error the writer holds a truncated stream with no IEND chunk.
    pub fn pack_into<W: Write>(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        gamma: Option<f64>,
        sink: &mut W,
    ) -> Result<u64, PackError> {
        let mut written = 0u64;
        for chunk in self.pack(pixels, width, height, gamma)? {
            let chunk = chunk?;
            sink.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        sink.flush()?;
        Ok(written)
    }

    pub(crate) fn prepare<'a>(
        &self,
        pixels: Cow<'a, [u8]>,
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<PackStream<'a>, PackError> {
        if width == 0 || height == 0 {
            return Err(PackError::invalid_config(format!(
                "dimensions {width}x{height} must be non-zero"
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PackError::invalid_config(format!(
                "dimensions {width}x{height} exceed the PNG limit of {MAX_DIMENSION}"
            )));
        }

        let bytes_per_pixel = self.options.bytes_per_pixel();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(bytes_per_pixel))
            .ok_or_else(|| {
                PackError::invalid_config(format!("image {width}x{height} is too large to address"))
            })?;
        if pixels.len() != expected {
            return Err(PackError::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }

        let gamma = gamma_to_fixed(gamma.or(self.options.gamma))?;

        let header = ImageHeader {
            width,
            height,
            bit_depth: self.options.bit_depth,
            color_type: self.options.color_type,
        };
        debug!(
            "packing {}x{} image (color type {}, bit depth {}, gamma {:?})",
            width,
            height,
            header.color_type.code(),
            header.bit_depth,
            gamma
        );

        Ok(PackStream::new(
            header,
            gamma,
            PendingImage {
                pixels,
                bytes_per_pixel,
                filter: Arc::clone(&self.filter),
                filter_options: self.options.filter_options(),
                compression: Arc::clone(&self.compression),
                deflate_options: self.options.deflate_options(),
            },
        ))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
