use std::path::Path;

use anyhow::Result;
use image::RgbaImage;

use crate::codec::{png::PngCodec, ImageCodec};

use super::{write_output, ImageWriter};

/// Save as a PNG file.
#[derive(Debug, Clone, Default)]
pub struct PngWriter {
    codec: PngCodec,
}

impl PngWriter {
    pub fn new() -> Self {
        PngWriter {
            codec: PngCodec::new(),
        }
    }
}

impl ImageWriter for PngWriter {
    fn write<P: AsRef<Path>>(&self, image: &RgbaImage, path: P) -> Result<()> {
        let bytes = self.codec.encode(image)?;

        write_output(&bytes, path)
    }
}
