//! The chunk-by-chunk output of one pack operation.
//!
//! [`PackStream`] walks a strictly forward state machine:
//!
//! ```text
//! Start -> SignatureEmitted -> HeaderEmitted -> [GammaEmitted]
//!       -> Compressing -> (IDAT per segment) -> Terminated
//! ```
//!
//! Any compressor or framing error moves it to `Failed`. Once terminated or
//! failed, the stream yields nothing more, so a failed encode never ends with
//! an IEND chunk.

use std::borrow::Cow;
use std::iter::FusedIterator;
use std::sync::Arc;

use log::{debug, trace, warn};

use super::header::{gamma_payload, ImageHeader, PNG_SIGNATURE};
use crate::chunk::{frame, ChunkType};
use crate::deflate::{CompressionStage, SegmentStream};
use crate::error::PackError;
use crate::filter::FilterStage;
use crate::options::{DeflateOptions, FilterOptions};

/// Where a [`PackStream`] is in the container layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackState {
    Start,
    SignatureEmitted,
    HeaderEmitted,
    GammaEmitted,
    Compressing,
    Terminated,
    Failed,
}

/// Everything needed to start compression, held until the header is out.
pub(crate) struct PendingImage<'a> {
    pub pixels: Cow<'a, [u8]>,
    pub bytes_per_pixel: usize,
    pub filter: Arc<dyn FilterStage>,
    pub filter_options: FilterOptions,
    pub compression: Arc<dyn CompressionStage>,
    pub deflate_options: DeflateOptions,
}

/// Iterator over the framed chunks of one PNG, in output order.
///
/// The first item is the signature, the last (on success) is IEND. Each item
/// is a complete byte range; nothing already yielded is revisited.
pub struct PackStream<'a> {
    state: PackState,
    header: ImageHeader,
    gamma: Option<u32>,
    pending: Option<PendingImage<'a>>,
    segments: Option<SegmentStream>,
    data_chunks: usize,
}

impl<'a> PackStream<'a> {
    pub(crate) fn new(header: ImageHeader, gamma: Option<u32>, pending: PendingImage<'a>) -> Self {
        Self {
            state: PackState::Start,
            header,
            gamma,
            pending: Some(pending),
            segments: None,
            data_chunks: 0,
        }
    }

    /// Current state of the encoder.
    pub fn state(&self) -> PackState {
        self.state
    }

    /// Number of IDAT chunks emitted so far.
    pub fn data_chunks(&self) -> usize {
        self.data_chunks
    }

    /// The header this stream writes.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    fn emit(&mut self, chunk_type: ChunkType, payload: &[u8]) -> Result<Vec<u8>, PackError> {
        match frame(chunk_type, payload) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                warn!("failed to frame {} chunk: {}", chunk_type, e);
                self.fail();
                Err(e)
            }
        }
    }

    fn fail(&mut self) {
        self.state = PackState::Failed;
        self.pending = None;
        self.segments = None;
    }

    fn begin_compression(&mut self) {
        self.state = PackState::Compressing;

        let Some(job) = self.pending.take() else {
            return;
        };

        let filtered = job.filter.filter(
            &job.pixels,
            self.header.width,
            self.header.height,
            &job.filter_options,
            job.bytes_per_pixel,
        );
        debug!(
            "filtered {} pixel bytes into {} scanline bytes",
            job.pixels.len(),
            filtered.len()
        );

        self.segments = Some(job.compression.start(job.deflate_options, filtered));
    }
}

impl Iterator for PackStream<'_> {
    type Item = Result<Vec<u8>, PackError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                PackState::Start => {
                    self.state = PackState::SignatureEmitted;
                    return Some(Ok(PNG_SIGNATURE.to_vec()));
                }
                PackState::SignatureEmitted => {
                    self.state = PackState::HeaderEmitted;
                    let payload = self.header.to_payload();
                    return Some(self.emit(ChunkType::IHDR, &payload));
                }
                PackState::HeaderEmitted => match self.gamma {
                    Some(scaled) => {
                        self.state = PackState::GammaEmitted;
                        return Some(self.emit(ChunkType::gAMA, &gamma_payload(scaled)));
                    }
                    None => self.begin_compression(),
                },
                PackState::GammaEmitted => self.begin_compression(),
                PackState::Compressing => {
                    let next = self.segments.as_mut().and_then(|s| s.next());
                    return match next {
                        Some(Ok(segment)) => {
                            self.data_chunks += 1;
                            trace!("IDAT #{} with {} bytes", self.data_chunks, segment.len());
                            Some(self.emit(ChunkType::IDAT, &segment))
                        }
                        Some(Err(e)) => {
                            warn!("compression failed after {} IDAT chunks: {}", self.data_chunks, e);
                            self.fail();
                            Some(Err(PackError::CompressionFailure(e)))
                        }
                        None => {
                            self.segments = None;
                            self.state = PackState::Terminated;
                            debug!(
                                "packed {}x{} image into {} IDAT chunks",
                                self.header.width, self.header.height, self.data_chunks
                            );
                            Some(self.emit(ChunkType::IEND, &[]))
                        }
                    };
                }
                PackState::Terminated | PackState::Failed => return None,
            }
        }
    }
}

impl FusedIterator for PackStream<'_> {}

impl Drop for PackStream<'_> {
    fn drop(&mut self) {
        if self.segments.is_some() {
            debug!(
                "pack stream dropped mid-compression after {} IDAT chunks; releasing compressor",
                self.data_chunks
            );
        }
    }
}
