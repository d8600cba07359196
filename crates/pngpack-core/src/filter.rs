//! Scanline filtering ahead of compression.
//!
//! The filter stage turns raw pixel rows into filtered rows, each prefixed
//! with the byte that names the filter used. The packer treats it as a
//! collaborator behind [`FilterStage`]; [`AdaptiveFilter`] is the default.
//!
//! # Heuristic
//!
//! For every row, each candidate filter is applied and the one with the
//! smallest sum of absolute residuals (bytes read as signed) wins. Ties go to
//! the lowest filter code, so a flat image always chooses `None`.

use crate::options::{FilterOptions, FilterType};

/// Preprocess raw scanlines into the filtered byte layout PNG expects.
pub trait FilterStage: Send + Sync {
    /// Filter `height` rows of `width * bytes_per_pixel` bytes each.
    ///
    /// Callers guarantee `pixels.len() == width * height * bytes_per_pixel`.
    /// The output holds `height * (1 + width * bytes_per_pixel)` bytes.
    fn filter(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &FilterOptions,
        bytes_per_pixel: usize,
    ) -> Vec<u8>;
}

/// Per-row minimum-sum-of-absolute-differences filter selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveFilter;

impl FilterStage for AdaptiveFilter {
    fn filter(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &FilterOptions,
        bytes_per_pixel: usize,
    ) -> Vec<u8> {
        let stride = width as usize * bytes_per_pixel;
        let height = height as usize;
        let candidates = options.filter_type.candidates();

        let mut out = Vec::with_capacity(height * (stride + 1));
        let zero_row = vec![0u8; stride];
        let mut scratch = vec![0u8; stride];
        let mut best = vec![0u8; stride];

        for y in 0..height {
            let row = &pixels[y * stride..(y + 1) * stride];
            let prev = if y == 0 {
                &zero_row[..]
            } else {
                &pixels[(y - 1) * stride..y * stride]
            };

            if let [only] = candidates.as_slice() {
                apply_filter(*only, row, prev, bytes_per_pixel, &mut best);
                out.push(*only as u8);
                out.extend_from_slice(&best);
                continue;
            }

            let mut best_filter = FilterType::None;
            let mut best_sum = u64::MAX;
            for &candidate in &candidates {
                apply_filter(candidate, row, prev, bytes_per_pixel, &mut scratch);
                let sum = sum_abs(&scratch);
                if sum < best_sum {
                    best_sum = sum;
                    best_filter = candidate;
                    std::mem::swap(&mut best, &mut scratch);
                }
            }

            out.push(best_filter as u8);
            out.extend_from_slice(&best);
        }

        out
    }
}

/// Apply one filter to `row`, writing residuals into `out`.
pub fn apply_filter(filter: FilterType, row: &[u8], prev: &[u8], bpp: usize, out: &mut [u8]) {
    match filter {
        FilterType::None => out.copy_from_slice(row),
        FilterType::Sub => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                out[i] = row[i].wrapping_sub(left);
            }
        }
        FilterType::Up => {
            for i in 0..row.len() {
                out[i] = row[i].wrapping_sub(prev[i]);
            }
        }
        FilterType::Average => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                let avg = ((left as u16 + prev[i] as u16) / 2) as u8;
                out[i] = row[i].wrapping_sub(avg);
            }
        }
        FilterType::Paeth => {
            for i in 0..row.len() {
                let (left, upper_left) = if i >= bpp {
                    (row[i - bpp], prev[i - bpp])
                } else {
                    (0, 0)
                };
                out[i] = row[i].wrapping_sub(paeth_predictor(left, prev[i], upper_left));
            }
        }
    }
}

/// The Paeth predictor used by filter type 4.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[inline]
fn sum_abs(residuals: &[u8]) -> u64 {
    residuals
        .iter()
        .map(|&b| (b as i8).unsigned_abs() as u64)
        .sum()
}



// ============================================================================
// Property-Based Tests
// ============================================================================
