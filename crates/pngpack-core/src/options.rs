//! Encoder configuration.
//!
//! [`PackerOptions`] carries every knob with a default, so callers only set
//! what they care about. The options are validated once by
//! [`crate::Packer::new`] and are read-only afterward.

use serde::{Deserialize, Serialize};

use crate::error::PackError;

/// Default size of each compressed segment (and therefore of each IDAT chunk).
pub const DEFAULT_DEFLATE_CHUNK_SIZE: usize = 32 * 1024;

/// Smallest segment size the compression stage accepts.
pub const MIN_DEFLATE_CHUNK_SIZE: usize = 64;

/// Default deflate level (maximum compression).
pub const DEFAULT_DEFLATE_LEVEL: u32 = 9;

/// Fixed-point scale for the gAMA chunk.
pub const GAMMA_DIVISION: f64 = 100_000.0;

/// PNG color types supported by the packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ColorType {
    /// RGB, three samples per pixel.
    Truecolor = 2,
    /// RGBA, four samples per pixel.
    #[default]
    TruecolorAlpha = 6,
}

impl ColorType {
    /// Samples per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            ColorType::Truecolor => 3,
            ColorType::TruecolorAlpha => 4,
        }
    }

    /// Bytes per pixel at the given bit depth.
    #[inline]
    pub const fn bytes_per_pixel(self, bit_depth: u8) -> usize {
        self.channels() * (bit_depth as usize / 8)
    }

    /// The color type code written into IHDR.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ColorType {
    type Error = PackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ColorType::Truecolor),
            6 => Ok(ColorType::TruecolorAlpha),
            other => Err(PackError::invalid_config(format!(
                "unsupported color type {other} (expected 2 or 6)"
            ))),
        }
    }
}

impl From<ColorType> for u8 {
    fn from(value: ColorType) -> Self {
        value.code()
    }
}

/// zlib compression strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum DeflateStrategy {
    Default = 0,
    Filtered = 1,
    HuffmanOnly = 2,
    #[default]
    Rle = 3,
    Fixed = 4,
}

impl TryFrom<u8> for DeflateStrategy {
    type Error = PackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeflateStrategy::Default),
            1 => Ok(DeflateStrategy::Filtered),
            2 => Ok(DeflateStrategy::HuffmanOnly),
            3 => Ok(DeflateStrategy::Rle),
            4 => Ok(DeflateStrategy::Fixed),
            other => Err(PackError::invalid_config(format!(
                "unknown deflate strategy {other}"
            ))),
        }
    }
}

impl From<DeflateStrategy> for u8 {
    fn from(value: DeflateStrategy) -> Self {
        value as u8
    }
}

/// The five PNG scanline filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];
}

impl TryFrom<u8> for FilterType {
    type Error = PackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FilterType::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| PackError::invalid_config(format!("unknown filter type {value}")))
    }
}

impl From<FilterType> for u8 {
    fn from(value: FilterType) -> Self {
        value as u8
    }
}

/// Which filters the filter stage may choose from for each scanline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterSelection {
    /// Try every filter and keep the cheapest per row.
    #[default]
    Adaptive,
    /// Restrict the candidates; a single entry forces that filter.
    Only(Vec<FilterType>),
}

impl FilterSelection {
    /// The candidate filters, in ascending code order.
    pub fn candidates(&self) -> Vec<FilterType> {
        match self {
            FilterSelection::Adaptive => FilterType::ALL.to_vec(),
            FilterSelection::Only(list) => {
                let mut list = list.clone();
                list.sort_by_key(|f| *f as u8);
                list.dedup();
                list
            }
        }
    }
}

/// Options handed to the filter stage.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub filter_type: FilterSelection,
}

/// Options handed to the compression stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateOptions {
    /// Maximum bytes per emitted segment.
    pub chunk_size: usize,
    /// Compression level, 0-9.
    pub level: u32,
    pub strategy: DeflateStrategy,
}

/// Configuration for a [`crate::Packer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackerOptions {
    /// Size of each compressed segment in bytes
    pub deflate_chunk_size: usize,
    /// Deflate level (0-9)
    pub deflate_level: u32,
    pub deflate_strategy: DeflateStrategy,
    /// Bits per sample (8 or 16)
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub filter_type: FilterSelection,
    /// Gamma written as a gAMA chunk when no per-call value is given
    pub gamma: Option<f64>,
}

impl Default for PackerOptions {
    fn default() -> Self {
        Self {
            deflate_chunk_size: DEFAULT_DEFLATE_CHUNK_SIZE,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
            deflate_strategy: DeflateStrategy::default(),
            bit_depth: 8,
            color_type: ColorType::default(),
            filter_type: FilterSelection::default(),
            gamma: None,
        }
    }
}

impl PackerOptions {
    /// Create options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), PackError> {
        if self.deflate_chunk_size < MIN_DEFLATE_CHUNK_SIZE {
            return Err(PackError::invalid_config(format!(
                "deflate chunk size {} is below the minimum of {}",
                self.deflate_chunk_size, MIN_DEFLATE_CHUNK_SIZE
            )));
        }
        if self.deflate_level > 9 {
            return Err(PackError::invalid_config(format!(
                "deflate level {} is outside 0-9",
                self.deflate_level
            )));
        }
        if self.bit_depth != 8 && self.bit_depth != 16 {
            return Err(PackError::invalid_config(format!(
                "bit depth {} is not supported for truecolor images (expected 8 or 16)",
                self.bit_depth
            )));
        }
        if let FilterSelection::Only(list) = &self.filter_type {
            if list.is_empty() {
                return Err(PackError::invalid_config(
                    "filter selection must name at least one filter",
                ));
            }
        }
        gamma_to_fixed(self.gamma)?;
        Ok(())
    }

    /// Bytes per pixel for the configured color type and bit depth.
    pub fn bytes_per_pixel(&self) -> usize {
        self.color_type.bytes_per_pixel(self.bit_depth)
    }

    pub(crate) fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            bit_depth: self.bit_depth,
            color_type: self.color_type,
            filter_type: self.filter_type.clone(),
        }
    }

    pub(crate) fn deflate_options(&self) -> DeflateOptions {
        DeflateOptions {
            chunk_size: self.deflate_chunk_size,
            level: self.deflate_level,
            strategy: self.deflate_strategy,
        }
    }
}

/// Convert a gamma value to the gAMA fixed-point form.
///
/// `None` and `0.0` both mean "no gAMA chunk".
pub fn gamma_to_fixed(gamma: Option<f64>) -> Result<Option<u32>, PackError> {
    let gamma = match gamma {
        None => return Ok(None),
        Some(g) if g == 0.0 => return Ok(None),
        Some(g) => g,
    };

    if !gamma.is_finite() || gamma < 0.0 {
        return Err(PackError::invalid_config(format!(
            "gamma must be a finite, non-negative number (got {gamma})"
        )));
    }

    let scaled = (gamma * GAMMA_DIVISION).floor();
    if scaled > u32::MAX as f64 {
        return Err(PackError::invalid_config(format!(
            "gamma {gamma} is too large for the gAMA chunk"
        )));
    }

    Ok(Some(scaled as u32))
}
