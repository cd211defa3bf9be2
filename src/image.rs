// Image encoding module.
//
// Unified save() entry point dispatches by file extension:
// - `.bmp`: `bmp` submodule, uncompressed 24-bit, bottom-up rows
// - `.jpg` / `.jpeg`: `jpeg` submodule, quality 0-100
// Both go through the `image` crate and take a canonical BGR24 image.

pub mod bmp;
pub mod jpeg;

use std::path::Path;

use crate::output::OutputFormat;
use crate::pipeline::CanonicalImage;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 85;

/// Encoder failures.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("invalid image data")]
    InvalidImage,
    #[error(
        "unsupported extension {}; supported: .jpg .jpeg .bmp",
        describe_extension(.0)
    )]
    UnsupportedExtension(String),
    #[error("file write error")]
    File(#[from] std::io::Error),
    #[error("image encoding failed")]
    Encode(#[from] image::ImageError),
}

fn describe_extension(ext: &str) -> String {
    if ext.is_empty() {
        "(none)".to_owned()
    } else {
        format!("'.{ext}'")
    }
}

/// Save an image to `path`. Format is determined by extension.
///
/// `quality` only applies to JPEG output.
pub fn save(path: &Path, image: &CanonicalImage, quality: u8) -> Result<(), EncodeError> {
    let format = OutputFormat::from_path(path).ok_or_else(|| {
        EncodeError::UnsupportedExtension(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_owned(),
        )
    })?;
    save_as(path, image, format, quality)
}

/// Save an image to `path` in an explicit format, whatever the extension.
pub fn save_as(
    path: &Path,
    image: &CanonicalImage,
    format: OutputFormat,
    quality: u8,
) -> Result<(), EncodeError> {
    match format {
        OutputFormat::Jpeg => jpeg::save_jpeg(path, image, quality),
        OutputFormat::Bmp => bmp::save_bmp(path, image),
    }
}

/// Canonical BGR rows → RGB bytes for the `image` crate, optionally in
/// reverse row order.
fn to_rgb(image: &CanonicalImage, flip_rows: bool) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.data().len());
    let rows = image.data().chunks_exact(image.stride());
    let mut push_row = |row: &[u8]| {
        for px in row.chunks_exact(3) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    };
    if flip_rows {
        rows.rev().for_each(&mut push_row);
    } else {
        rows.for_each(&mut push_row);
    }
    rgb
}
