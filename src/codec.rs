use anyhow::Result;
use image::RgbaImage;

pub mod png;
pub mod qoi;
pub mod raw;

/// A trait for converting between encoded bytes and RGBA images.
pub trait ImageCodec {
    /// Decode bytes into an RGBA image.
    fn decode<B: AsRef<[u8]>>(&self, bytes: B) -> Result<RgbaImage>;

    /// Encode an RGBA image into bytes.
    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>>;
}
