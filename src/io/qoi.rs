use std::path::Path;

use anyhow::Result;
use image::RgbaImage;

use crate::codec::{qoi::QoiCodec, ImageCodec};

use super::{write_output, ImageWriter};

/// Save as a qoir file.
#[derive(Debug, Clone, Default)]
pub struct QoiWriter {
    codec: QoiCodec,
}

impl QoiWriter {
    pub fn new(codec: QoiCodec) -> Self {
        QoiWriter { codec }
    }
}

impl ImageWriter for QoiWriter {
    fn write<P: AsRef<Path>>(&self, image: &RgbaImage, path: P) -> Result<()> {
        let bytes = self.codec.encode(image)?;

        write_output(&bytes, path)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::qoi::{Channels, ColorSpace, MAGIC};
    use image::Rgba;

    #[test]
    fn test_write_qoi() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.qoi");
        let image = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8, y as u8, 9, 255]));

        QoiWriter::new(QoiCodec::new(Channels::Rgb, ColorSpace::Srgb)).write(&image, &path)?;

        let bytes = std::fs::read(&path)?;
        assert_eq!(&bytes[..4], &MAGIC.to_be_bytes());
        assert_eq!(QoiCodec::default().decode(&bytes)?, image);

        Ok(())
    }
}
