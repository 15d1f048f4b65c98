use std::path::Path;

use anyhow::Result;
use image::RgbaImage;

use crate::error::ConvertError;

pub mod png;
pub mod qoi;
pub mod raw;

/// A trait for saving converted images to disk.
pub trait ImageWriter {
    /// Save the image
    fn write<P: AsRef<Path>>(&self, image: &RgbaImage, path: P) -> Result<()>;
}

/// Read the whole input file into memory.
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());

    Ok(bytes)
}

/// Write encoded bytes, opening the file only once encoding has succeeded.
pub(crate) fn write_output<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    let write_error = |source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(write_error)?;
    let mut writer = std::io::BufWriter::new(file);
    writer.write_all(bytes).map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());

    Ok(())
}
