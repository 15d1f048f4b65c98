//! The qoir image format, a QOI variant.
//!
//! A stream is a 14 byte header, a sequence of operations and an end marker.
//! All header integers are big-endian:
//!
//! ```md
//! | magic "qoir" (4) | width (4) | height (4) | channels (1) | colorspace (1) |
//! ```
//!
//! Operations describe each pixel relative to the previous one, starting from
//! opaque black:
//!
//! | op    | bytes                  | meaning                                      |
//! |-------|------------------------|----------------------------------------------|
//! | RGB   | `fe r g b`             | new color, alpha unchanged                   |
//! | RGBA  | `ff r g b a`           | new color and alpha                          |
//! | INDEX | `00iiiiii`             | color stored in slot `i` of the index        |
//! | DIFF  | `01rrggbb`             | per-channel delta in `-2..=1`, biased by 2   |
//! | LUMA  | `10gggggg rrrrbbbb`    | green delta in `-32..=31`, red/blue relative |
//! | RUN   | `11nnnnnn`             | repeat the previous *operation* `n + 1` times|
//!
//! A run repeats the previous operation, not the previous pixel, so a constant
//! gradient collapses into one DIFF followed by a RUN. Runs are capped at 62 so
//! they never collide with the RGB and RGBA tags.

use std::num::NonZeroU32;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::{data::Dimensions, error::ConvertError};

use super::ImageCodec;

pub const MAGIC: u32 = u32::from_be_bytes(*b"qoir");
pub const HEADER_LEN: usize = 14;
pub const END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

const OP_RGB: u8 = 0xfe;
const OP_RGBA: u8 = 0xff;
const OP_INDEX: u8 = 0x00;
const OP_DIFF: u8 = 0x40;
const OP_LUMA: u8 = 0x80;
const OP_RUN: u8 = 0xc0;
const MASK_2: u8 = 0xc0;

const INDEX_LEN: usize = 64;
const MAX_RUN: u8 = 62;
const START_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Bytes per pixel in the encoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channels {
    Rgb = 3,
    Rgba = 4,
}

impl Channels {
    pub fn count(&self) -> usize {
        *self as usize
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Channels::Rgb),
            4 => Some(Channels::Rgba),
            _ => None,
        }
    }
}

/// Informative only, pixels are never converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorSpace {
    Srgb = 0,
    Linear = 1,
}

impl ColorSpace {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ColorSpace::Srgb),
            1 => Some(ColorSpace::Linear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QoiHeader {
    pub dimensions: Dimensions,
    pub channels: Channels,
    pub colorspace: ColorSpace,
}

impl QoiHeader {
    pub fn new(dimensions: Dimensions, channels: Channels, colorspace: ColorSpace) -> Self {
        QoiHeader {
            dimensions,
            channels,
            colorspace,
        }
    }

    /// Length of the pixel buffer this header describes.
    pub fn pixel_len(&self) -> Result<usize> {
        self.dimensions.byte_len_with(self.channels.count())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let (width, height) = self.dimensions.as_tuple();

        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&MAGIC.to_be_bytes());
        bytes[4..8].copy_from_slice(&width.to_be_bytes());
        bytes[8..12].copy_from_slice(&height.to_be_bytes());
        bytes[12] = self.channels as u8;
        bytes[13] = self.colorspace as u8;
        bytes
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header = bytes
            .get(..HEADER_LEN)
            .ok_or(ConvertError::Truncated {
                offset: bytes.len(),
            })?;
        let read_u32 = |at: usize| {
            u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]])
        };

        let magic = read_u32(0);
        if magic != MAGIC {
            return Err(ConvertError::BadMagic {
                expected: MAGIC,
                found: magic,
            }
            .into());
        }

        let (width, height) = (read_u32(4), read_u32(8));
        let invalid = ConvertError::InvalidHeader {
            width,
            height,
            channels: header[12],
            colorspace: header[13],
        };

        match (
            NonZeroU32::new(width),
            NonZeroU32::new(height),
            Channels::from_byte(header[12]),
            ColorSpace::from_byte(header[13]),
        ) {
            (Some(width), Some(height), Some(channels), Some(colorspace)) => Ok(QoiHeader::new(
                Dimensions::new(width, height),
                channels,
                colorspace,
            )),
            _ => Err(invalid.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
    Index(u8),
    Diff { dr: i8, dg: i8, db: i8 },
    Luma { dg: i8, dr_dg: i8, db_dg: i8 },
    Run(u8),
}

impl Op {
    fn write(&self, out: &mut Vec<u8>) {
        let bias = |delta: i8, by: i8| delta.wrapping_add(by) as u8;

        match *self {
            Op::Rgb([r, g, b]) => out.extend_from_slice(&[OP_RGB, r, g, b]),
            Op::Rgba([r, g, b, a]) => out.extend_from_slice(&[OP_RGBA, r, g, b, a]),
            Op::Index(slot) => out.push(OP_INDEX | slot),
            Op::Diff { dr, dg, db } => {
                out.push(OP_DIFF | bias(dr, 2) << 4 | bias(dg, 2) << 2 | bias(db, 2))
            }
            Op::Luma { dg, dr_dg, db_dg } => {
                out.push(OP_LUMA | bias(dg, 32));
                out.push(bias(dr_dg, 8) << 4 | bias(db_dg, 8));
            }
            Op::Run(len) => out.push(OP_RUN | (len - 1)),
        }
    }

    /// Read the operation at `offset`, returning it with its encoded size.
    fn read(bytes: &[u8], offset: usize) -> Result<(Op, usize)> {
        let take = |len: usize| {
            bytes
                .get(offset + 1..offset + 1 + len)
                .ok_or(ConvertError::Truncated {
                    offset: bytes.len(),
                })
        };
        let unbias = |value: u8, by: i8| (value as i8).wrapping_sub(by);

        let tag = *bytes.get(offset).ok_or(ConvertError::Truncated { offset })?;

        let op = match tag {
            OP_RGB => {
                let rgb = take(3)?;
                (Op::Rgb([rgb[0], rgb[1], rgb[2]]), 4)
            }
            OP_RGBA => {
                let rgba = take(4)?;
                (Op::Rgba([rgba[0], rgba[1], rgba[2], rgba[3]]), 5)
            }
            _ => match tag & MASK_2 {
                OP_INDEX => (Op::Index(tag & 0x3f), 1),
                OP_DIFF => (
                    Op::Diff {
                        dr: unbias(tag >> 4 & 0x03, 2),
                        dg: unbias(tag >> 2 & 0x03, 2),
                        db: unbias(tag & 0x03, 2),
                    },
                    1,
                ),
                OP_LUMA => {
                    let rb = take(1)?[0];
                    (
                        Op::Luma {
                            dg: unbias(tag & 0x3f, 32),
                            dr_dg: unbias(rb >> 4, 8),
                            db_dg: unbias(rb & 0x0f, 8),
                        },
                        2,
                    )
                }
                _ => (Op::Run((tag & 0x3f) + 1), 1),
            },
        };

        Ok(op)
    }

    /// Apply a pixel operation on top of `prev`.
    fn apply(&self, prev: Rgba<u8>, index: &[Rgba<u8>; INDEX_LEN]) -> Rgba<u8> {
        let Rgba([r, g, b, a]) = prev;

        match *self {
            Op::Rgb([r, g, b]) => Rgba([r, g, b, a]),
            Op::Rgba(rgba) => Rgba(rgba),
            Op::Index(slot) => index[usize::from(slot)],
            Op::Diff { dr, dg, db } => Rgba([
                r.wrapping_add_signed(dr),
                g.wrapping_add_signed(dg),
                b.wrapping_add_signed(db),
                a,
            ]),
            Op::Luma { dg, dr_dg, db_dg } => Rgba([
                r.wrapping_add_signed(dg).wrapping_add_signed(dr_dg),
                g.wrapping_add_signed(dg),
                b.wrapping_add_signed(dg).wrapping_add_signed(db_dg),
                a,
            ]),
            Op::Run(_) => prev,
        }
    }
}

fn index_of(pixel: &Rgba<u8>) -> usize {
    let Rgba([r, g, b, a]) = *pixel;
    let hash = r
        .wrapping_mul(3)
        .wrapping_add(g.wrapping_mul(5))
        .wrapping_add(b.wrapping_mul(7))
        .wrapping_add(a.wrapping_mul(11));

    usize::from(hash) % INDEX_LEN
}

/// Pick the operation for `pixel`, updating the index on a miss.
fn choose_op(pixel: Rgba<u8>, prev: Rgba<u8>, index: &mut [Rgba<u8>; INDEX_LEN]) -> Op {
    let slot = index_of(&pixel);
    if index[slot] == pixel {
        return Op::Index(slot as u8);
    }
    index[slot] = pixel;

    let Rgba([r, g, b, a]) = pixel;
    if a != prev[3] {
        return Op::Rgba([r, g, b, a]);
    }

    let dr = r.wrapping_sub(prev[0]) as i8;
    let dg = g.wrapping_sub(prev[1]) as i8;
    let db = b.wrapping_sub(prev[2]) as i8;
    let dr_dg = dr.wrapping_sub(dg);
    let db_dg = db.wrapping_sub(dg);

    let small = -2..=1;
    if small.contains(&dr) && small.contains(&dg) && small.contains(&db) {
        Op::Diff { dr, dg, db }
    } else if (-32..=31).contains(&dg) && (-8..=7).contains(&dr_dg) && (-8..=7).contains(&db_dg)
    {
        Op::Luma { dg, dr_dg, db_dg }
    } else {
        Op::Rgb([r, g, b])
    }
}

/// Encode a pixel buffer with `header.channels` bytes per pixel.
pub fn encode_pixels(header: &QoiHeader, pixels: &[u8]) -> Result<Vec<u8>> {
    let expected = header.pixel_len()?;
    if pixels.len() != expected {
        return Err(ConvertError::SizeMismatch {
            expected,
            actual: pixels.len(),
        }
        .into());
    }

    let mut out = Vec::with_capacity(HEADER_LEN + expected / 2 + END_MARKER.len());
    out.extend_from_slice(&header.to_bytes());

    let mut index = [START_PIXEL; INDEX_LEN];
    let mut prev = START_PIXEL;
    let mut prev_op: Option<Op> = None;
    let mut run: u8 = 0;

    for chunk in pixels.chunks_exact(header.channels.count()) {
        let pixel = match *chunk {
            [r, g, b] => Rgba([r, g, b, 255]),
            [r, g, b, a] => Rgba([r, g, b, a]),
            _ => unreachable!("chunks are 3 or 4 bytes"),
        };

        let op = choose_op(pixel, prev, &mut index);
        if prev_op == Some(op) {
            run += 1;
            if run == MAX_RUN {
                Op::Run(run).write(&mut out);
                run = 0;
            }
        } else {
            if run > 0 {
                Op::Run(run).write(&mut out);
                run = 0;
            }
            op.write(&mut out);
        }

        prev = pixel;
        prev_op = Some(op);
    }
    if run > 0 {
        Op::Run(run).write(&mut out);
    }

    out.extend_from_slice(&END_MARKER);
    log::debug!("Encoded {} pixel bytes into {} qoir bytes", pixels.len(), out.len());

    Ok(out)
}

/// Decode a qoir stream into its header and pixel buffer.
pub fn decode_pixels(bytes: &[u8]) -> Result<(QoiHeader, Vec<u8>)> {
    let header = QoiHeader::parse(bytes)?;
    let channels = header.channels.count();
    let len = header.pixel_len()?;

    // one op byte yields at most MAX_RUN pixels
    let body = bytes.len().saturating_sub(HEADER_LEN + END_MARKER.len());
    if len / channels > body.saturating_mul(usize::from(MAX_RUN)) {
        return Err(ConvertError::Truncated {
            offset: bytes.len(),
        }
        .into());
    }

    let mut pixels: Vec<u8> = Vec::with_capacity(len);
    let mut index = [START_PIXEL; INDEX_LEN];
    let mut pixel = START_PIXEL;
    let mut prev_op: Option<Op> = None;
    let mut offset = HEADER_LEN;

    while pixels.len() < len {
        let (op, size) = Op::read(bytes, offset)?;

        let (op, times) = match op {
            Op::Run(times) => (
                prev_op.ok_or(ConvertError::DanglingRun { offset })?,
                usize::from(times),
            ),
            op => (op, 1),
        };
        offset += size;

        for _ in 0..times {
            if pixels.len() >= len {
                break;
            }
            pixel = op.apply(pixel, &index);
            index[index_of(&pixel)] = pixel;
            pixels.extend_from_slice(&pixel.0[..channels]);
        }
        prev_op = Some(op);
    }

    if bytes.get(offset..) != Some(&END_MARKER[..]) {
        return Err(ConvertError::MissingEndMarker { offset }.into());
    }

    Ok((header, pixels))
}

/// qoir codec for RGBA images
#[derive(Debug, Clone)]
pub struct QoiCodec {
    channels: Channels,
    colorspace: ColorSpace,
}

impl Default for QoiCodec {
    fn default() -> Self {
        QoiCodec {
            channels: Channels::Rgba,
            colorspace: ColorSpace::Srgb,
        }
    }
}

impl QoiCodec {
    pub fn new(channels: Channels, colorspace: ColorSpace) -> Self {
        QoiCodec {
            channels,
            colorspace,
        }
    }
}

impl ImageCodec for QoiCodec {
    fn decode<B: AsRef<[u8]>>(&self, bytes: B) -> Result<RgbaImage> {
        let (header, pixels) = decode_pixels(bytes.as_ref())?;

        let rgba = match header.channels {
            Channels::Rgba => pixels,
            Channels::Rgb => pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
                .collect(),
        };

        let (width, height) = header.dimensions.as_tuple();
        let actual = rgba.len();
        let image = RgbaImage::from_raw(width, height, rgba).ok_or(ConvertError::SizeMismatch {
            expected: header.dimensions.byte_len()?,
            actual,
        })?;

        Ok(image)
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        let dimensions = Dimensions::of(image).context("Cannot encode an empty image")?;
        let header = QoiHeader::new(dimensions, self.channels, self.colorspace);

        match self.channels {
            Channels::Rgba => encode_pixels(&header, image.as_raw()),
            Channels::Rgb => {
                let rgb: Vec<u8> = image
                    .pixels()
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect();
                encode_pixels(&header, &rgb)
            }
        }
    }
}
