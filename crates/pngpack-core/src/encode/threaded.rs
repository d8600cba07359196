//! Background packing over a bounded channel.
//!
//! [`Packer::spawn_pack`] moves the encode onto a worker thread and hands
//! chunks to the caller as [`PackEvent`]s. The channel is bounded, so the
//! worker never runs more than [`PACK_CHANNEL_CAPACITY`] chunks ahead of the
//! consumer. Dropping the [`PackReceiver`] makes the worker give up at its
//! next send and release the compressor.

use std::borrow::Cow;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, warn};

use super::packer::Packer;
use super::stream::PackStream;
use crate::error::PackError;

/// Chunks the worker may buffer ahead of the consumer.
pub const PACK_CHANNEL_CAPACITY: usize = 4;

/// One notification from a background pack.
#[derive(Debug)]
pub enum PackEvent {
    /// A framed chunk (or the signature), in output order.
    Data(Vec<u8>),
    /// The encode failed; no further events follow.
    Error(PackError),
    /// The terminator chunk has been sent; no further events follow.
    End,
}

/// Receiving side of a background pack.
pub struct PackReceiver {
    rx: Option<Receiver<PackEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl PackReceiver {
    /// Block until the next event. Returns `None` once the worker has gone.
    pub fn recv(&self) -> Option<PackEvent> {
        self.rx.as_ref()?.recv().ok()
    }

    /// Drain the stream into one buffer.
    ///
    /// # Errors
    ///
    /// Returns the worker's error, or `PackError::Disconnected` if the worker
    /// stopped without sending `End`.
    pub fn into_bytes(self) -> Result<Vec<u8>, PackError> {
        let mut out = Vec::new();
        while let Some(event) = self.recv() {
            match event {
                PackEvent::Data(bytes) => out.extend_from_slice(&bytes),
                PackEvent::Error(e) => return Err(e),
                PackEvent::End => return Ok(out),
            }
        }
        Err(PackError::Disconnected)
    }
}

impl Iterator for PackReceiver {
    type Item = PackEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

impl Drop for PackReceiver {
    fn drop(&mut self) {
        // Disconnect first so a worker blocked on a full channel wakes up.
        drop(self.rx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("pack worker panicked before finishing");
            }
        }
    }
}

impl Packer {
    /// Pack an image on a worker thread.
    ///
    /// Input validation runs on the calling thread, so configuration errors
    /// are returned here rather than as a [`PackEvent::Error`].
    pub fn spawn_pack(
        &self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        gamma: Option<f64>,
    ) -> Result<PackReceiver, PackError> {
        let stream = self.prepare(Cow::Owned(pixels), width, height, gamma)?;
        let (tx, rx) = bounded(PACK_CHANNEL_CAPACITY);

        let worker = std::thread::Builder::new()
            .name("pngpack-encoder".into())
            .spawn(move || run_pack_worker(stream, tx))?;

        Ok(PackReceiver {
            rx: Some(rx),
            worker: Some(worker),
        })
    }
}

fn run_pack_worker(stream: PackStream<'static>, tx: Sender<PackEvent>) {
    for item in stream {
        let (event, last) = match item {
            Ok(bytes) => (PackEvent::Data(bytes), false),
            Err(e) => (PackEvent::Error(e), true),
        };
        if tx.send(event).is_err() {
            debug!("pack consumer detached; abandoning encode");
            return;
        }
        if last {
            return;
        }
    }
    let _ = tx.send(PackEvent::End);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::{CompressionError, CompressionStage, SegmentStream};
    use crate::filter::AdaptiveFilter;
    use crate::options::{DeflateOptions, PackerOptions};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EndlessStage {
        produced: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
    }

    struct EndlessSegments {
        produced: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
    }

    impl Iterator for EndlessSegments {
        type Item = Result<Vec<u8>, CompressionError>;

        fn next(&mut self) -> Option<Self::Item> {
            self.produced.fetch_add(1, Ordering::SeqCst);
            Some(Ok(vec![1, 2, 3]))
        }
    }

    impl Drop for EndlessSegments {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    impl CompressionStage for EndlessStage {
        fn start(&self, _options: DeflateOptions, _input: Vec<u8>) -> SegmentStream {
            Box::new(EndlessSegments {
                produced: Arc::clone(&self.produced),
                dropped: Arc::clone(&self.dropped),
            })
        }
    }

    struct BrokenStage;

    impl CompressionStage for BrokenStage {
        fn start(&self, _options: DeflateOptions, _input: Vec<u8>) -> SegmentStream {
            Box::new(std::iter::once(Err(CompressionError::Other("boom".into()))))
        }
    }

    struct PanickingStage;

    impl CompressionStage for PanickingStage {
        fn start(&self, _options: DeflateOptions, _input: Vec<u8>) -> SegmentStream {
            Box::new(std::iter::from_fn(|| -> Option<Result<Vec<u8>, CompressionError>> {
                panic!("compressor crashed")
            }))
        }
    }

    #[test]
    fn test_spawn_matches_inline() {
        let packer = Packer::new(PackerOptions::default()).unwrap();
        let pixels: Vec<u8> = (0..8 * 8 * 4).map(|i| (i % 200) as u8).collect();

        let inline = packer.pack_to_vec(&pixels, 8, 8, Some(2.2)).unwrap();
        let spawned = packer
            .spawn_pack(pixels, 8, 8, Some(2.2))
            .unwrap()
            .into_bytes()
            .unwrap();

        assert_eq!(spawned, inline);
    }

    #[test]
    fn test_event_sequence() {
        let packer = Packer::new(PackerOptions::default()).unwrap();
        let events: Vec<PackEvent> = packer.spawn_pack(vec![0u8; 4], 1, 1, None).unwrap().collect();

        assert!(matches!(events.last(), Some(PackEvent::End)));
        assert_eq!(events.iter().filter(|e| matches!(e, PackEvent::End)).count(), 1);

        let data: Vec<&Vec<u8>> = events
            .iter()
            .filter_map(|e| match e {
                PackEvent::Data(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(data[0].len(), 8);
        assert_eq!(&data.last().unwrap()[4..8], b"IEND");
    }

    #[test]
    fn test_validation_errors_are_synchronous() {
        let packer = Packer::new(PackerOptions::default()).unwrap();
        assert!(matches!(
            packer.spawn_pack(vec![0u8; 3], 1, 1, None),
            Err(PackError::InvalidPixelData { .. })
        ));
    }

    #[test]
    fn test_compression_error_event() {
        let packer = Packer::with_stages(
            PackerOptions::default(),
            Arc::new(AdaptiveFilter),
            Arc::new(BrokenStage),
        )
        .unwrap();

        let events: Vec<PackEvent> = packer.spawn_pack(vec![0u8; 4], 1, 1, None).unwrap().collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], PackEvent::Error(PackError::CompressionFailure(_))));
        assert!(!events.iter().any(|e| matches!(e, PackEvent::End)));

        let result = packer.spawn_pack(vec![0u8; 4], 1, 1, None).unwrap().into_bytes();
        assert!(matches!(result, Err(PackError::CompressionFailure(_))));
    }

    #[test]
    fn test_detached_consumer_releases_compressor() {
        let produced = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let packer = Packer::with_stages(
            PackerOptions::default(),
            Arc::new(AdaptiveFilter),
            Arc::new(EndlessStage {
                produced: Arc::clone(&produced),
                dropped: Arc::clone(&dropped),
            }),
        )
        .unwrap();

        let receiver = packer.spawn_pack(vec![0u8; 4], 1, 1, None).unwrap();
        for _ in 0..3 {
            assert!(matches!(receiver.recv(), Some(PackEvent::Data(_))));
        }

        // Dropping joins the worker, so the compressor is gone afterward
        drop(receiver);
        assert!(dropped.load(Ordering::SeqCst));

        // Bounded channel: the worker never ran far ahead of the consumer
        assert!(produced.load(Ordering::SeqCst) <= 3 + PACK_CHANNEL_CAPACITY + 2);
    }

    #[test]
    fn test_worker_panic_surfaces_as_disconnected() {
        let packer = Packer::with_stages(
            PackerOptions::default(),
            Arc::new(AdaptiveFilter),
            Arc::new(PanickingStage),
        )
        .unwrap();

        // Signature and IHDR arrive, then the worker dies; dropping the
        // receiver must not propagate the panic
        let result = packer.spawn_pack(vec![0u8; 4], 1, 1, None).unwrap().into_bytes();
        assert!(matches!(result, Err(PackError::Disconnected)));
    }
}
