use anyhow::Result;
use image::RgbaImage;

use crate::{data::Dimensions, error::ConvertError, progress::ProgressConfig};

use super::ImageCodec;

/// Headerless RGBA dump: one byte per channel, pixels in row-major order,
/// no padding between rows. Dimensions are carried out-of-band.
#[derive(Debug, Clone)]
pub struct RawCodec {
    dimensions: Dimensions,
    progress: ProgressConfig,
}

impl RawCodec {
    pub fn new(dimensions: Dimensions) -> Self {
        RawCodec {
            dimensions,
            progress: ProgressConfig::disabled(),
        }
    }

    pub fn set_progress(self, progress: ProgressConfig) -> Self {
        Self { progress, ..self }
    }
}

impl ImageCodec for RawCodec {
    fn decode<B: AsRef<[u8]>>(&self, bytes: B) -> Result<RgbaImage> {
        let bytes = bytes.as_ref();
        let expected = self.dimensions.byte_len()?;

        // `ImageBuffer::from_raw` tolerates trailing bytes, a dump must not
        if bytes.len() != expected {
            return Err(ConvertError::SizeMismatch {
                expected,
                actual: bytes.len(),
            }
            .into());
        }

        let (width, height) = self.dimensions.as_tuple();
        let image = RgbaImage::from_raw(width, height, bytes.to_vec()).ok_or(
            ConvertError::SizeMismatch {
                expected,
                actual: bytes.len(),
            },
        )?;

        Ok(image)
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        if image.dimensions() != self.dimensions.as_tuple() {
            return Err(ConvertError::DimensionMismatch {
                expected: self.dimensions.as_tuple(),
                actual: image.dimensions(),
            }
            .into());
        }

        let mut bytes: Vec<u8> = Vec::with_capacity(self.dimensions.byte_len()?);
        let progress = self.progress.rows(image.height(), "Serializing pixels...")?;

        for row in progress.track(image.rows()) {
            for pixel in row {
                bytes.extend_from_slice(&pixel.0);
            }
        }
        progress.finish();

        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgba;

    fn dimensions(width: &str, height: &str) -> Dimensions {
        Dimensions::from_args(width, height).unwrap()
    }

    #[test]
    fn test_encode_two_pixels() -> Result<()> {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 128]));

        let bytes = RawCodec::new(dimensions("2", "1")).encode(&image)?;
        assert_eq!(bytes, vec![0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0x80]);

        Ok(())
    }

    #[test]
    fn test_decode_two_pixels() -> Result<()> {
        let bytes = [0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0x80];

        let image = RawCodec::new(dimensions("2", "1")).decode(bytes)?;
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(1, 0), &Rgba([0, 255, 0, 128]));

        Ok(())
    }

    #[test]
    fn test_encode_row_major() -> Result<()> {
        // 2x2, each pixel tagged with its (x, y)
        let image = RgbaImage::from_fn(2, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));

        let bytes = RawCodec::new(dimensions("2", "2")).encode(&image)?;
        assert_eq!(bytes.len(), 2 * 2 * 4);
        assert_eq!(
            bytes,
            vec![0, 0, 0, 255, 1, 0, 0, 255, 0, 1, 0, 255, 1, 1, 0, 255]
        );

        Ok(())
    }

    #[test]
    fn test_decode_size_mismatch() {
        let codec = RawCodec::new(dimensions("2", "1"));

        for len in [0, 7, 9, 16] {
            let err = codec.decode(vec![0u8; len]).unwrap_err();
            match err.downcast_ref::<ConvertError>() {
                Some(ConvertError::SizeMismatch { expected, actual }) => {
                    assert_eq!(*expected, 8);
                    assert_eq!(*actual, len);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_encode_dimension_mismatch() {
        let image = RgbaImage::new(3, 1);
        let err = RawCodec::new(dimensions("2", "1"))
            .encode(&image)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::DimensionMismatch { .. })
        ));
    }
}
