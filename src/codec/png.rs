use std::io::Cursor;

use anyhow::Result;
use image::{ImageFormat, RgbaImage};

use crate::error::ConvertError;

use super::ImageCodec;

/// PNG codec using the default encoder settings.
///
/// Decoding sniffs the container, so any format the `image` crate reads is
/// accepted and normalized to RGBA. Missing alpha becomes fully opaque.
#[derive(Debug, Clone, Default)]
pub struct PngCodec;

impl PngCodec {
    pub fn new() -> Self {
        PngCodec
    }
}

impl ImageCodec for PngCodec {
    fn decode<B: AsRef<[u8]>>(&self, bytes: B) -> Result<RgbaImage> {
        let image = image::load_from_memory(bytes.as_ref()).map_err(ConvertError::Decode)?;

        Ok(image.to_rgba8())
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(ConvertError::Encode)?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{
        DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, LumaA, Rgb, RgbImage, Rgba,
    };

    fn png_bytes(image: DynamicImage) -> Result<Vec<u8>> {
        let mut bytes: Vec<u8> = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    #[test]
    fn test_encode_decode_pixels() -> Result<()> {
        let codec = PngCodec::new();
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 128]));

        let bytes = codec.encode(&image)?;
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = codec.decode(&bytes)?;
        assert_eq!(decoded, image);

        Ok(())
    }

    #[test]
    fn test_decode_rgb_adds_opaque_alpha() -> Result<()> {
        let mut rgb = RgbImage::new(1, 2);
        rgb.put_pixel(0, 0, Rgb([1, 2, 3]));
        rgb.put_pixel(0, 1, Rgb([4, 5, 6]));

        let bytes = png_bytes(DynamicImage::ImageRgb8(rgb))?;

        let decoded = PngCodec::new().decode(&bytes)?;
        assert_eq!(decoded.dimensions(), (1, 2));
        assert_eq!(decoded.as_raw(), &vec![1, 2, 3, 255, 4, 5, 6, 255]);

        Ok(())
    }

    #[test]
    fn test_decode_normalizes_color_types() -> Result<()> {
        // 16 bit samples are multiples of 257 so they narrow exactly
        let cases: Vec<(&str, DynamicImage, [u8; 4])> = vec![
            (
                "luma8",
                DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, image::Luma([64]))),
                [64, 64, 64, 255],
            ),
            (
                "luma_alpha8",
                DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(1, 1, LumaA([64, 128]))),
                [64, 64, 64, 128],
            ),
            (
                "rgb8",
                DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([1, 2, 3]))),
                [1, 2, 3, 255],
            ),
            (
                "rgba8",
                DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]))),
                [1, 2, 3, 4],
            ),
            (
                "luma16",
                DynamicImage::ImageLuma16(ImageBuffer::from_pixel(1, 1, image::Luma([64 * 257]))),
                [64, 64, 64, 255],
            ),
            (
                "luma_alpha16",
                DynamicImage::ImageLumaA16(ImageBuffer::from_pixel(
                    1,
                    1,
                    LumaA([64 * 257, 128 * 257]),
                )),
                [64, 64, 64, 128],
            ),
            (
                "rgb16",
                DynamicImage::ImageRgb16(ImageBuffer::from_pixel(1, 1, Rgb([257, 514, 771]))),
                [1, 2, 3, 255],
            ),
            (
                "rgba16",
                DynamicImage::ImageRgba16(ImageBuffer::from_pixel(
                    1,
                    1,
                    Rgba([257, 514, 771, 1028]),
                )),
                [1, 2, 3, 4],
            ),
        ];

        let codec = PngCodec::new();
        for (name, source, expected) in cases {
            let decoded = codec.decode(png_bytes(source)?)?;
            assert_eq!(decoded.dimensions(), (1, 1), "{}", name);
            assert_eq!(decoded.as_raw(), &expected.to_vec(), "{}", name);
        }

        Ok(())
    }

    #[test]
    fn test_decode_palette_with_transparency() -> Result<()> {
        let mut bytes: Vec<u8> = Vec::new();
        {
            let mut encoder = ::png::Encoder::new(&mut bytes, 2, 1);
            encoder.set_color(::png::ColorType::Indexed);
            encoder.set_depth(::png::BitDepth::Eight);
            encoder.set_palette(vec![255, 0, 0, 0, 255, 0]);
            encoder.set_trns(vec![255, 128]);

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&[0, 1])?;
            writer.finish()?;
        }

        let decoded = PngCodec::new().decode(&bytes)?;
        assert_eq!(decoded.as_raw(), &vec![255, 0, 0, 255, 0, 255, 0, 128]);

        Ok(())
    }

    #[test]
    fn test_decode_garbage() {
        let err = PngCodec::new().decode(b"definitely not a png").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Decode(_))
        ));
    }
}
