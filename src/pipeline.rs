use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use image::{ImageError, RgbaImage};

use crate::{
    codec::{png::PngCodec, qoi::QoiCodec, raw::RawCodec, ImageCodec},
    data::{Dimensions, FileKind},
    error::ConvertError,
    io::{png::PngWriter, qoi::QoiWriter, raw::RawWriter, read_input, ImageWriter},
    progress::ProgressConfig,
};

pub const DEFAULT_RAW_OUTPUT: &str = "a.raw";
pub const DEFAULT_QOI_OUTPUT: &str = "a.qoi";
pub const DEFAULT_RAW_INPUT: &str = "b.raw";
pub const DEFAULT_PNG_OUTPUT: &str = "b.png";

pub const USAGE: &str =
    "usage: pngraw convert (image.png) | (image.qoi) | (image.raw) (width) (height)";
pub const RAW_USAGE: &str = "usage: pngraw convert (image.raw) (width) (height)";
pub const PACK_USAGE: &str = "usage: pngraw pack (image.raw) (width) (height)";

/// Where the pipeline reads and writes its fixed-name files
///
/// The defaults chain together: `a.raw` is packed into `a.qoi`, which is
/// unpacked into `b.raw`, which is rebuilt into `b.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    raw_output: PathBuf,
    qoi_output: PathBuf,
    raw_input: PathBuf,
    png_output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig::in_dir("")
    }
}

impl PipelineConfig {
    pub fn new(
        raw_output: PathBuf,
        qoi_output: PathBuf,
        raw_input: PathBuf,
        png_output: PathBuf,
    ) -> Self {
        PipelineConfig {
            raw_output,
            qoi_output,
            raw_input,
            png_output,
        }
    }

    /// Default file names, resolved against `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        PipelineConfig {
            raw_output: dir.join(DEFAULT_RAW_OUTPUT),
            qoi_output: dir.join(DEFAULT_QOI_OUTPUT),
            raw_input: dir.join(DEFAULT_RAW_INPUT),
            png_output: dir.join(DEFAULT_PNG_OUTPUT),
        }
    }

    /// Raw dump written from a PNG
    pub fn raw_output(&self) -> &Path {
        &self.raw_output
    }

    /// qoir file written by `pack`
    pub fn qoi_output(&self) -> &Path {
        &self.qoi_output
    }

    /// Raw dump read when rebuilding a PNG, and written when unpacking a qoir file
    pub fn raw_input(&self) -> &Path {
        &self.raw_input
    }

    pub fn png_output(&self) -> &Path {
        &self.png_output
    }
}

/// What a pipeline run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An image was dumped to raw bytes
    Encoded {
        dimensions: Dimensions,
        output: PathBuf,
    },
    /// A raw dump was turned back into a PNG
    Decoded {
        dimensions: Dimensions,
        output: PathBuf,
    },
    /// A raw dump was compressed into a qoir file
    Packed {
        dimensions: Dimensions,
        output: PathBuf,
    },
    /// A qoir file was expanded into a raw dump
    Unpacked {
        dimensions: Dimensions,
        output: PathBuf,
    },
    /// The arguments did not select any work; usage was printed
    Usage,
}

/// Pipeline converting between PNG images, raw RGBA dumps and qoir files
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    progress: ProgressConfig,
    qoi: QoiCodec,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, progress: ProgressConfig, qoi: QoiCodec) -> Self {
        Pipeline {
            config,
            progress,
            qoi,
        }
    }

    pub fn set_config(self, config: PipelineConfig) -> Self {
        Self { config, ..self }
    }

    pub fn set_progress(self, progress: ProgressConfig) -> Self {
        Self { progress, ..self }
    }

    pub fn set_qoi(self, qoi: QoiCodec) -> Self {
        Self { qoi, ..self }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pick the conversion from the suffix of `path`.
    ///
    /// `args` are the positional arguments after `path`. Dimension reports
    /// and usage messages go to `out`.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        path: P,
        args: &[String],
        out: &mut W,
    ) -> Result<Outcome> {
        let path = path.as_ref();

        match FileKind::lookup(path) {
            Some(FileKind::Png) => self.encode_to_raw(path, out),
            Some(FileKind::Raw) => self.decode_from_raw(args, out),
            Some(FileKind::Qoi) => self.decode_from_qoi(path, out),
            None => {
                log::warn!("Unrecognized extension: {}", path.display());
                usage(out, USAGE)
            }
        }
    }

    /// Decode the image at `path` and dump its RGBA pixels to the raw output.
    pub fn encode_to_raw<P: AsRef<Path>, W: Write>(&self, path: P, out: &mut W) -> Result<Outcome> {
        let path = path.as_ref();
        log::info!("Encoding {} to raw", path.display());

        // an unreadable image is a decode failure like a corrupt one
        let bytes = std::fs::read(path)
            .map_err(|source| ConvertError::Decode(ImageError::IoError(source)))
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let image = PngCodec::new().decode(bytes)?;
        let dimensions = report(&image, out, |(width, height)| {
            format!("({}, {})", width, height)
        })?;

        let output = self.config.raw_output.clone();
        RawWriter::new(self.progress).write(&image, &output)?;

        Ok(Outcome::Encoded { dimensions, output })
    }

    /// Rebuild a PNG from the raw input using `args` as width and height.
    ///
    /// Any argument count other than two prints the usage message and
    /// touches no file.
    pub fn decode_from_raw<W: Write>(&self, args: &[String], out: &mut W) -> Result<Outcome> {
        let [width, height] = args else {
            log::warn!("Expected width and height, got {} arguments", args.len());
            return usage(out, RAW_USAGE);
        };

        let input = &self.config.raw_input;
        log::info!("Decoding {} from raw", input.display());

        let bytes = read_input(input)?;
        let dimensions = Dimensions::from_args(width, height)?;
        writeln!(out, "{} {}", dimensions.width(), dimensions.height())?;

        let image = RawCodec::new(dimensions).decode(bytes)?;

        let output = self.config.png_output.clone();
        PngWriter::new().write(&image, &output)?;

        Ok(Outcome::Decoded { dimensions, output })
    }

    /// Compress the raw dump at `path` into the qoir output.
    ///
    /// Takes the same `(width, height)` arguments as rebuilding a PNG.
    pub fn encode_to_qoi<P: AsRef<Path>, W: Write>(
        &self,
        path: P,
        args: &[String],
        out: &mut W,
    ) -> Result<Outcome> {
        let [width, height] = args else {
            log::warn!("Expected width and height, got {} arguments", args.len());
            return usage(out, PACK_USAGE);
        };

        let path = path.as_ref();
        log::info!("Packing {} to qoir", path.display());

        let bytes = read_input(path)?;
        let dimensions = Dimensions::from_args(width, height)?;
        writeln!(out, "{} {}", dimensions.width(), dimensions.height())?;

        let image = RawCodec::new(dimensions).decode(bytes)?;

        let output = self.config.qoi_output.clone();
        QoiWriter::new(self.qoi.clone()).write(&image, &output)?;

        Ok(Outcome::Packed { dimensions, output })
    }

    /// Expand the qoir file at `path` into the raw input, ready for rebuilding.
    pub fn decode_from_qoi<P: AsRef<Path>, W: Write>(
        &self,
        path: P,
        out: &mut W,
    ) -> Result<Outcome> {
        let path = path.as_ref();
        log::info!("Unpacking {} from qoir", path.display());

        let image = self.qoi.decode(read_input(path)?)?;
        let dimensions = report(&image, out, |(width, height)| format!("{} {}", width, height))?;

        let output = self.config.raw_input.clone();
        RawWriter::new(self.progress).write(&image, &output)?;

        Ok(Outcome::Unpacked { dimensions, output })
    }
}

fn usage<W: Write>(out: &mut W, message: &str) -> Result<Outcome> {
    writeln!(out, "{}", message)?;
    Ok(Outcome::Usage)
}

fn report<W: Write>(
    image: &RgbaImage,
    out: &mut W,
    format: impl Fn((u32, u32)) -> String,
) -> Result<Dimensions> {
    let dimensions = Dimensions::of(image).context("Decoded image is empty")?;
    writeln!(out, "{}", format(dimensions.as_tuple()))?;

    Ok(dimensions)
}
