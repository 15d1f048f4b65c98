use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::{
    codec::{raw::RawCodec, ImageCodec},
    data::Dimensions,
    progress::ProgressConfig,
};

use super::{write_output, ImageWriter};

/// Save as a headerless RGBA dump.
#[derive(Debug, Clone, Default)]
pub struct RawWriter {
    progress: ProgressConfig,
}

impl RawWriter {
    pub fn new(progress: ProgressConfig) -> Self {
        RawWriter { progress }
    }
}

impl ImageWriter for RawWriter {
    fn write<P: AsRef<Path>>(&self, image: &RgbaImage, path: P) -> Result<()> {
        let dimensions = Dimensions::of(image).context("Cannot dump an empty image")?;
        let bytes = RawCodec::new(dimensions)
            .set_progress(self.progress)
            .encode(image)?;

        write_output(&bytes, path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_write_raw_length() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.raw");
        let image = RgbaImage::from_pixel(5, 3, Rgba([9, 8, 7, 6]));

        RawWriter::default().write(&image, &path)?;

        let bytes = std::fs::read(&path)?;
        assert_eq!(bytes.len(), 5 * 3 * 4);
        assert!(bytes.chunks(4).all(|pixel| pixel == [9, 8, 7, 6]));

        Ok(())
    }

    #[test]
    fn test_write_empty_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.raw");

        assert!(RawWriter::default()
            .write(&RgbaImage::new(0, 4), &path)
            .is_err());
        assert!(!path.exists());

        Ok(())
    }
}
