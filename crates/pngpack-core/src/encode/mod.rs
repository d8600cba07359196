//! PNG container encoding.
//!
//! This module provides functionality for:
//! - Emitting the signature, IHDR, optional gAMA, IDAT and IEND chunks in order
//! - Driving the filter and compression stages for the pixel payload
//! - Consuming the output inline, into a writer, or from a worker thread
//!
//! # Architecture
//!
//! [`Packer`] validates its options once. Each call to [`Packer::pack`]
//! validates the image and returns a [`PackStream`], an iterator that yields
//! each chunk as soon as it is framed. Compression segments are pulled one at
//! a time, so every IDAT chunk corresponds to exactly one segment.
//!
//! # Examples
//!
//! ```ignore
//! use pngpack_core::{Packer, PackerOptions};
//!
//! let packer = Packer::new(PackerOptions::default()).unwrap();
//! let pixels = vec![255u8; 2 * 2 * 4]; // White RGBA
//! let png = packer.pack_to_vec(&pixels, 2, 2, Some(1.0 / 2.2)).unwrap();
//! assert_eq!(&png[1..4], b"PNG");
//! ```

mod header;
mod image_source;
mod packer;
mod stream;
mod threaded;

pub use header::{gamma_payload, ImageHeader, IHDR_LENGTH, MAX_DIMENSION, PNG_SIGNATURE};
pub use image_source::pixels_from_image;
pub use packer::Packer;
pub use stream::{PackState, PackStream};
pub use threaded::{PackEvent, PackReceiver, PACK_CHANNEL_CAPACITY};
