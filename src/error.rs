use std::{num::ParseIntError, path::PathBuf};

use thiserror::Error;

/// Failures that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Raw buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Image dimensions mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Invalid dimension {value:?}: {source}")]
    InvalidDimension {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Image of {width}x{height} pixels is too large")]
    TooLarge { width: u32, height: u32 },

    #[error("Bad qoir magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    #[error(
        "Invalid qoir header: {width}x{height}, {channels} channels, colorspace {colorspace}"
    )]
    InvalidHeader {
        width: u32,
        height: u32,
        channels: u8,
        colorspace: u8,
    },

    #[error("qoir stream truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("qoir run at byte {offset} has no operation to repeat")]
    DanglingRun { offset: usize },

    #[error("qoir stream has no end marker after byte {offset}")]
    MissingEndMarker { offset: usize },
}
