use std::{num::NonZeroU32, path::Path};

use anyhow::Result;
use image::RgbaImage;

use crate::error::ConvertError;

/// Bytes per pixel in a raw dump: R, G, B, A.
pub const CHANNELS: usize = 4;

/// Width and height of an image, carried out-of-band for raw dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: NonZeroU32,
    height: NonZeroU32,
}

impl Dimensions {
    pub fn new(width: NonZeroU32, height: NonZeroU32) -> Self {
        Dimensions { width, height }
    }

    /// Parse width and height from decimal command line arguments.
    pub fn from_args(width: &str, height: &str) -> Result<Self> {
        Ok(Dimensions {
            width: parse_dimension(width)?,
            height: parse_dimension(height)?,
        })
    }

    /// Dimensions of a decoded image. `None` for an empty image.
    pub fn of(image: &RgbaImage) -> Option<Self> {
        Some(Dimensions {
            width: NonZeroU32::new(image.width())?,
            height: NonZeroU32::new(image.height())?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }

    pub fn as_tuple(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Length of the raw dump for these dimensions: width * height * 4.
    pub fn byte_len(&self) -> Result<usize> {
        self.byte_len_with(CHANNELS)
    }

    /// Length of a pixel buffer with `channels` bytes per pixel.
    pub fn byte_len_with(&self, channels: usize) -> Result<usize> {
        let too_large = || ConvertError::TooLarge {
            width: self.width(),
            height: self.height(),
        };

        let width = usize::try_from(self.width()).map_err(|_| too_large())?;
        let height = usize::try_from(self.height()).map_err(|_| too_large())?;

        Ok(width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or_else(too_large)?)
    }
}

fn parse_dimension(value: &str) -> Result<NonZeroU32> {
    value.parse::<NonZeroU32>().map_err(|source| {
        ConvertError::InvalidDimension {
            value: value.to_string(),
            source,
        }
        .into()
    })
}

/// File kinds recognized by their suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Png,
    Raw,
    Qoi,
}

impl FileKind {
    pub fn extension(&self) -> &str {
        match self {
            FileKind::Png => ".png",
            FileKind::Raw => ".raw",
            FileKind::Qoi => ".qoi",
        }
    }

    /// Find the kind of a file by its name's suffix, case-sensitively.
    pub fn lookup<P: AsRef<Path>>(path: P) -> Option<FileKind> {
        let name = path.as_ref().to_str()?;

        [FileKind::Png, FileKind::Raw, FileKind::Qoi]
            .into_iter()
            .find(|kind| name.ends_with(kind.extension()))
    }
}
