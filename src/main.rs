use std::path::PathBuf;

use anyhow::Result;
use pngraw::codec::qoi::{Channels, ColorSpace, QoiCodec};
use pngraw::pipeline::{
    Pipeline, PipelineConfig, DEFAULT_PNG_OUTPUT, DEFAULT_QOI_OUTPUT, DEFAULT_RAW_INPUT,
    DEFAULT_RAW_OUTPUT,
};
use pngraw::progress::ProgressConfig;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Convert between PNG images, raw RGBA dumps and qoir files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show a progress bar while serializing pixels
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Dump a PNG to raw RGBA bytes, unpack a qoir file, or rebuild a PNG from a raw dump
    Convert {
        /// Input file: `.png`, `.qoi` or `.raw`
        path: PathBuf,

        /// Width and height of the raw dump
        #[arg(allow_negative_numbers = true)]
        dimensions: Vec<String>,

        #[command(flatten)]
        files: Files,
    },
    /// Compress a raw RGBA dump into a qoir file
    Pack {
        /// Raw dump to compress
        path: PathBuf,

        /// Width and height of the raw dump
        #[arg(allow_negative_numbers = true)]
        dimensions: Vec<String>,

        /// Channels stored in the qoir file
        #[arg(long, default_value = "rgba")]
        channels: ChannelsArg,

        /// Colorspace tag stored in the qoir header
        #[arg(long, default_value = "srgb")]
        colorspace: ColorSpaceArg,

        #[command(flatten)]
        files: Files,
    },
}

#[derive(Debug, Clone, Args)]
struct Files {
    /// Raw dump written from a PNG
    #[arg(long, default_value = DEFAULT_RAW_OUTPUT)]
    raw_output: PathBuf,

    /// qoir file written by `pack`
    #[arg(long, default_value = DEFAULT_QOI_OUTPUT)]
    qoi_output: PathBuf,

    /// Raw dump read when rebuilding a PNG, written when unpacking a qoir file
    #[arg(long, default_value = DEFAULT_RAW_INPUT)]
    raw_input: PathBuf,

    /// PNG written from a raw dump
    #[arg(long, default_value = DEFAULT_PNG_OUTPUT)]
    png_output: PathBuf,
}

impl From<Files> for PipelineConfig {
    fn from(files: Files) -> Self {
        PipelineConfig::new(
            files.raw_output,
            files.qoi_output,
            files.raw_input,
            files.png_output,
        )
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum ChannelsArg {
    Rgb,
    Rgba,
}

#[derive(Debug, Clone, ValueEnum)]
enum ColorSpaceArg {
    Srgb,
    Linear,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    log::debug!("{:?}", cli);

    let progress = if cli.progress {
        ProgressConfig::enabled()
    } else {
        ProgressConfig::disabled()
    };
    let mut stdout = std::io::stdout().lock();

    let outcome = match cli.command {
        Command::Convert {
            path,
            dimensions,
            files,
        } => {
            let pipeline = Pipeline::default()
                .set_config(files.into())
                .set_progress(progress);
            log::debug!("{:?}", pipeline.config());

            pipeline.run(&path, &dimensions, &mut stdout)?
        }
        Command::Pack {
            path,
            dimensions,
            channels,
            colorspace,
            files,
        } => {
            let channels = match channels {
                ChannelsArg::Rgb => Channels::Rgb,
                ChannelsArg::Rgba => Channels::Rgba,
            };
            let colorspace = match colorspace {
                ColorSpaceArg::Srgb => ColorSpace::Srgb,
                ColorSpaceArg::Linear => ColorSpace::Linear,
            };
            let pipeline = Pipeline::new(
                files.into(),
                progress,
                QoiCodec::new(channels, colorspace),
            );
            log::debug!("{:?}", pipeline.config());

            pipeline.encode_to_qoi(&path, &dimensions, &mut stdout)?
        }
    };
    log::debug!("{:?}", outcome);

    Ok(())
}
