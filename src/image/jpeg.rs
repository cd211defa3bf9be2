// JPEG encoding with a caller-selected quality

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{to_rgb, EncodeError};
use crate::pipeline::CanonicalImage;

/// Largest width or height a baseline JPEG can describe.
const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Clamp a requested quality into the encoder's 1..=100 range.
///
/// Values above 100 become 100; 0 is treated as the lowest quality, 1.
pub fn effective_quality(quality: u8) -> u8 {
    quality.clamp(1, 100)
}

/// Write `image` as a JPEG.
///
/// Rows are emitted in reverse order, so the last canonical row is the top
/// of the decoded picture.
pub fn save_jpeg(path: &Path, image: &CanonicalImage, quality: u8) -> Result<(), EncodeError> {
    if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        return Err(EncodeError::InvalidImage);
    }

    let rgb = to_rgb(image, true);
    let quality = effective_quality(quality);

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality).write_image(
        &rgb,
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;

    tracing::debug!(
        "wrote {}x{} JPEG (quality {quality}) to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
