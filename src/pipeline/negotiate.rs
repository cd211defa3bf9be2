// Format negotiation: request a candidate layout, fall back to the device's
// native format, then re-query what is actually in effect.
//
// The request result is never trusted; only the post-request query decides
// the layout that the converter will see.

use crate::capture::{PixelLayout, SampleReader, StreamFormat};

use super::error::CaptureError;
use super::types::{FormatOrigin, NegotiatedFormat};

/// Ask for each candidate layout in turn; the first accepted one wins.
/// Refusal of every candidate is not an error.
fn request_candidates<R: SampleReader>(reader: &mut R) -> FormatOrigin {
    for layout in PixelLayout::CANDIDATES {
        match reader.request_layout(layout) {
            Ok(()) => return FormatOrigin::Requested(layout),
            Err(err) => tracing::debug!("device refused {layout:?}: {err}"),
        }
    }
    tracing::info!("device refused all candidate layouts, using its native format");
    FormatOrigin::Native
}

/// Resolve the stream's actual format into a [`NegotiatedFormat`].
fn resolve(actual: StreamFormat, origin: FormatOrigin) -> Result<NegotiatedFormat, CaptureError> {
    if actual.width == 0 || actual.height == 0 {
        return Err(CaptureError::UnsupportedFormat(format!(
            "invalid frame size {}x{}",
            actual.width, actual.height
        )));
    }

    let layout = actual.subtype.layout().ok_or_else(|| {
        CaptureError::UnsupportedFormat(format!("subtype {:?} is not RGB24/RGB32", actual.subtype))
    })?;

    let row_bytes = (actual.width as usize)
        .checked_mul(layout.bytes_per_pixel())
        .ok_or_else(|| CaptureError::UnsupportedFormat("frame too wide".to_owned()))?;

    // Bottom-up surfaces report a negative stride; only its magnitude matters here
    let source_stride = actual
        .default_stride
        .map(|stride| stride.unsigned_abs() as usize)
        .filter(|&stride| stride >= row_bytes)
        .unwrap_or(row_bytes);

    Ok(NegotiatedFormat {
        layout,
        origin,
        width: actual.width,
        height: actual.height,
        source_stride,
    })
}

/// Negotiate an output format on a freshly created reader.
///
/// Fails with [`CaptureError::UnsupportedFormat`] if the actual format cannot
/// be queried, has a non-positive dimension, or is neither 3 nor 4 bytes per
/// pixel BGR.
pub fn negotiate<R: SampleReader>(reader: &mut R) -> Result<NegotiatedFormat, CaptureError> {
    let origin = request_candidates(reader);
    let actual = reader.current_format().map_err(CaptureError::format)?;
    let format = resolve(actual, origin)?;

    tracing::info!(
        "negotiated {}x{} {:?} ({:?}, stride {})",
        format.width,
        format.height,
        format.layout,
        format.origin,
        format.source_stride
    );
    Ok(format)
}
