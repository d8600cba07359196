//! Error types for the PNG packer.

use thiserror::Error;

use crate::deflate::CompressionError;

/// Errors that can occur while packing an image into a PNG container.
#[derive(Debug, Error)]
pub enum PackError {
    /// Options or image dimensions were rejected before any byte was emitted.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Pixel data length doesn't match the image dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// A chunk payload does not fit the 31-bit length field.
    #[error("Chunk payload too large: {length} bytes exceeds maximum of {max}")]
    PayloadTooLarge { length: usize, max: usize },

    /// The compression stage reported an error mid-stream.
    #[error("Compression failed: {0}")]
    CompressionFailure(#[from] CompressionError),

    /// Writing to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background encoder stopped without signalling the end of the stream.
    #[error("Encoder worker disconnected before end of stream")]
    Disconnected,
}

impl PackError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        PackError::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PackError::PayloadTooLarge {
            length: 10,
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "Chunk payload too large: 10 bytes exceeds maximum of 5"
        );

        let err = PackError::invalid_config("width must be non-zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: width must be non-zero"
        );
    }

    #[test]
    fn test_compression_error_converts() {
        let err: PackError = CompressionError::Stalled { consumed: 3 }.into();
        assert!(matches!(err, PackError::CompressionFailure(_)));
    }
}
