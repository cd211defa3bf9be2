// Pixel normalization into the canonical tightly packed BGR24 layout

use crate::capture::PixelLayout;

use super::error::CaptureError;
use super::types::{CanonicalImage, NegotiatedFormat, CANONICAL_BYTES_PER_PIXEL};

/// Copy a locked frame into a freshly allocated canonical image.
///
/// `Bgr24` rows are copied as-is; `Bgrx32` pixels keep their first three
/// bytes and drop the fourth. Source rows are walked by `source_stride`, so
/// any device row padding is discarded.
pub fn normalize(src: &[u8], format: &NegotiatedFormat) -> Result<CanonicalImage, CaptureError> {
    let required = format.min_source_len();
    if src.len() < required {
        return Err(CaptureError::CaptureFailed(format!(
            "frame buffer holds {} bytes, {}x{} {:?} needs {}",
            src.len(),
            format.width,
            format.height,
            format.layout,
            required
        )));
    }

    let width = format.width as usize;
    let height = format.height as usize;
    let dst_stride = width * CANONICAL_BYTES_PER_PIXEL;
    let len = dst_stride
        .checked_mul(height)
        .ok_or_else(|| CaptureError::CaptureFailed("frame too large".to_owned()))?;

    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|err| {
        CaptureError::CaptureFailed(format!("cannot allocate {len} byte image: {err}"))
    })?;

    let row_bytes = format.row_bytes();
    // Last row may not carry trailing padding, so rows are sliced by row_bytes
    let rows = (0..height).map(|y| &src[y * format.source_stride..][..row_bytes]);

    match format.layout {
        PixelLayout::Bgr24 if format.source_stride == row_bytes => {
            data.extend_from_slice(&src[..len]);
        }
        PixelLayout::Bgr24 => {
            for row in rows {
                data.extend_from_slice(row);
            }
        }
        PixelLayout::Bgrx32 => {
            for row in rows {
                for px in row.chunks_exact(4) {
                    data.extend_from_slice(&px[..CANONICAL_BYTES_PER_PIXEL]);
                }
            }
        }
    }

    CanonicalImage::new(format.width, format.height, data).ok_or_else(|| {
        CaptureError::CaptureFailed("normalized buffer does not match geometry".to_owned())
    })
}
