//! Compression stage: filtered scanlines in, zlib segments out.
//!
//! A [`CompressionStage`] is started once with the whole filtered buffer and
//! hands back a [`SegmentStream`]. The stream is the pull-side view of the
//! usual data/error/end callbacks:
//!
//! - `Some(Ok(bytes))` - a compressed segment is ready
//! - `Some(Err(e))` - the compressor failed; nothing further is produced
//! - `None` - all input consumed and flushed
//!
//! Dropping the stream early releases the compressor.

use log::{debug, trace};
use miniz_oxide::deflate::core::{
    compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};
use thiserror::Error;

use crate::options::DeflateOptions;

/// zlib window size (32K) as log2; a positive value also selects the zlib wrapper.
const ZLIB_WINDOW_BITS: i32 = 15;

/// Errors reported by a compression stage.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The deflate engine returned a failure status.
    #[error("deflate error: {0:?}")]
    Deflate(TDEFLStatus),

    /// The compressor stopped making progress before the stream ended.
    #[error("compressor stalled after consuming {consumed} bytes")]
    Stalled { consumed: usize },

    /// Error raised by a custom stage.
    #[error("{0}")]
    Other(String),
}

/// Ordered compressed segments produced from one input.
pub type SegmentStream = Box<dyn Iterator<Item = Result<Vec<u8>, CompressionError>> + Send>;

/// A streaming compressor that accepts one closed input.
pub trait CompressionStage: Send + Sync {
    /// Take ownership of the complete input and return its compressed segments.
    fn start(&self, options: DeflateOptions, input: Vec<u8>) -> SegmentStream;
}

/// zlib-wrapped deflate via `miniz_oxide`, honouring level and strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibStage;

impl CompressionStage for ZlibStage {
    fn start(&self, options: DeflateOptions, input: Vec<u8>) -> SegmentStream {
        debug!(
            "deflating {} bytes (level {}, strategy {:?}, segments of {} bytes)",
            input.len(),
            options.level,
            options.strategy,
            options.chunk_size
        );
        Box::new(ZlibSegments::new(options, input))
    }
}

/// Pulls fixed-size output segments out of a single zlib stream.
pub(crate) struct ZlibSegments {
    compressor: Box<CompressorOxide>,
    input: Vec<u8>,
    consumed: usize,
    chunk_size: usize,
    finished: bool,
}

impl ZlibSegments {
    pub(crate) fn new(options: DeflateOptions, input: Vec<u8>) -> Self {
        let flags = create_comp_flags_from_zip_params(
            options.level as i32,
            ZLIB_WINDOW_BITS,
            options.strategy as i32,
        );
        Self {
            compressor: Box::new(CompressorOxide::new(flags)),
            input,
            consumed: 0,
            chunk_size: options.chunk_size.max(1),
            finished: false,
        }
    }

    fn fill_segment(&mut self) -> Result<Vec<u8>, CompressionError> {
        let mut out = vec![0u8; self.chunk_size];
        let mut filled = 0;

        while filled < self.chunk_size {
            let (status, read, written) = compress(
                &mut self.compressor,
                &self.input[self.consumed..],
                &mut out[filled..],
                TDEFLFlush::Finish,
            );
            self.consumed += read;
            filled += written;

            match status {
                TDEFLStatus::Done => {
                    self.finished = true;
                    break;
                }
                TDEFLStatus::Okay => {
                    if read == 0 && written == 0 {
                        return Err(CompressionError::Stalled {
                            consumed: self.consumed,
                        });
                    }
                }
                failed => return Err(CompressionError::Deflate(failed)),
            }
        }

        out.truncate(filled);
        Ok(out)
    }
}

impl Iterator for ZlibSegments {
    type Item = Result<Vec<u8>, CompressionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.fill_segment() {
            Ok(segment) if segment.is_empty() => None,
            Ok(segment) => {
                trace!(
                    "deflate segment of {} bytes ({}/{} input consumed)",
                    segment.len(),
                    self.consumed,
                    self.input.len()
                );
                Some(Ok(segment))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DeflateStrategy;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn options(chunk_size: usize) -> DeflateOptions {
        DeflateOptions {
            chunk_size,
            level: 9,
            strategy: DeflateStrategy::Rle,
        }
    }

    fn inflate(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    fn noisy(len: usize) -> Vec<u8> {
        let mut state = 0x1234_5678u32;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect()
    }

    #[test]
    fn test_roundtrip_single_segment() {
        let input = b"hello hello hello hello".to_vec();
        let segments: Vec<_> = ZlibStage
            .start(options(32 * 1024), input.clone())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(inflate(&segments[0]), input);
    }

    #[test]
    fn test_segments_respect_chunk_size() {
        let input = noisy(10_000);
        let segments: Vec<Vec<u8>> = ZlibStage
            .start(options(256), input.clone())
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(segments.len() > 1, "incompressible input should span segments");
        for seg in &segments[..segments.len() - 1] {
            assert_eq!(seg.len(), 256);
        }
        assert!(!segments.last().unwrap().is_empty());
        assert!(segments.last().unwrap().len() <= 256);

        assert_eq!(inflate(&segments.concat()), input);
    }

    #[test]
    fn test_empty_input_still_produces_stream() {
        let segments: Vec<Vec<u8>> = ZlibStage
            .start(options(1024), Vec::new())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(segments.len(), 1);
        assert!(inflate(&segments[0]).is_empty());
    }

    #[test]
    fn test_zlib_header() {
        let mut stream = ZlibStage.start(options(1024), vec![0u8; 100]);
        let first = stream.next().unwrap().unwrap();
        // CMF: deflate with 32K window
        assert_eq!(first[0], 0x78);
        assert_eq!(((first[0] as u16) << 8 | first[1] as u16) % 31, 0);
    }

    #[test]
    fn test_stream_fuses_after_end() {
        let mut stream = ZlibStage.start(options(1024), vec![1u8; 10]);
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_level_zero_stores() {
        let input = noisy(500);
        let stored: Vec<u8> = ZlibStage
            .start(
                DeflateOptions {
                    level: 0,
                    ..options(4096)
                },
                input.clone(),
            )
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat();

        assert!(stored.len() > input.len());
        assert_eq!(inflate(&stored), input);
    }

    fn deflate_with(strategy: DeflateStrategy, input: &[u8]) -> Vec<u8> {
        ZlibStage
            .start(
                DeflateOptions {
                    strategy,
                    ..options(64 * 1024)
                },
                input.to_vec(),
            )
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat()
    }

    #[test]
    fn test_strategy_shapes_output() {
        // Period-37 pattern with no repeated neighbours: only long-distance
        // matches help, which RLE and Huffman-only both skip
        let pattern: Vec<u8> = (0..37u32).map(|i| (i * 7) as u8).collect();
        let input: Vec<u8> = pattern.iter().copied().cycle().take(8192).collect();

        let default = deflate_with(DeflateStrategy::Default, &input);
        let rle = deflate_with(DeflateStrategy::Rle, &input);
        let huffman = deflate_with(DeflateStrategy::HuffmanOnly, &input);

        assert_ne!(rle, default);
        assert_ne!(huffman, default);
        assert!(default.len() < rle.len());
        assert!(default.len() < huffman.len());

        for compressed in [&default, &rle, &huffman] {
            assert_eq!(inflate(compressed), input);
        }
    }

    #[test]
    fn test_rle_matches_runs() {
        let input: Vec<u8> = (0..64u8).flat_map(|b| std::iter::repeat(b).take(128)).collect();

        let rle = deflate_with(DeflateStrategy::Rle, &input);
        let huffman = deflate_with(DeflateStrategy::HuffmanOnly, &input);

        assert!(rle.len() < huffman.len());
        assert_eq!(inflate(&rle), input);
        assert_eq!(inflate(&huffman), input);
    }
}
