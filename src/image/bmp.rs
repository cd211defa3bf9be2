// BMP encoding: uncompressed 24-bit, 54-byte header, bottom-up rows padded to 4 bytes

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{to_rgb, EncodeError};
use crate::pipeline::CanonicalImage;

/// File header (14) + BITMAPINFOHEADER (40).
pub const HEADER_SIZE: usize = 54;

/// Size of the file [`save_bmp`] writes for the given geometry, or `None`
/// when it would not fit the format's 32-bit size field.
pub fn file_size(width: u32, height: u32) -> Option<u32> {
    let padded_row = (width as u64 * 3 + 3) & !3;
    let size = padded_row.checked_mul(height as u64)? + HEADER_SIZE as u64;
    u32::try_from(size).ok()
}

/// Write `image` as a 24-bit BMP.
///
/// The first canonical row becomes the first row stored in the file, which
/// BMP readers display at the bottom.
pub fn save_bmp(path: &Path, image: &CanonicalImage) -> Result<(), EncodeError> {
    if file_size(image.width(), image.height()).is_none() || image.height() > i32::MAX as u32 {
        return Err(EncodeError::InvalidImage);
    }

    // The encoder stores rows in reverse, so feed it the reversed image
    let rgb = to_rgb(image, true);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    BmpEncoder::new(&mut writer).write_image(
        &rgb,
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;

    tracing::debug!(
        "wrote {}x{} BMP to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
