use std::fmt;

use crate::capture::PixelLayout;

/// Bytes per pixel of the canonical image (B, G, R).
pub const CANONICAL_BYTES_PER_PIXEL: usize = 3;

/// Single captured still, normalized to a fixed layout.
///
/// Rows are tightly packed (`stride == width * 3`), 3 bytes per pixel in
/// B, G, R order, `stride * height` bytes in total. An instance is only ever
/// built fully formed, so these invariants hold for every value of the type.
///
/// Row order is the device buffer's order. Media Foundation delivers RGB
/// frames bottom-up, so row 0 is normally the bottom of the picture; the BMP
/// writer stores it first and the JPEG writer flips rows, which keeps both
/// outputs upright.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CanonicalImage {
    /// Wrap a BGR24 buffer. Returns `None` unless both dimensions are positive
    /// and `data` holds exactly `width * 3 * height` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as usize)
            .checked_mul(CANONICAL_BYTES_PER_PIXEL)?
            .checked_mul(height as usize)?;
        (data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between rows; always `width * 3`.
    pub fn stride(&self) -> usize {
        self.width as usize * CANONICAL_BYTES_PER_PIXEL
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Row `y`, `stride()` bytes long.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let stride = self.stride();
        let start = (y as usize).checked_mul(stride)?;
        self.data.get(start..start + stride)
    }

    /// B, G, R bytes of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width {
            return None;
        }
        let offset = x as usize * CANONICAL_BYTES_PER_PIXEL;
        let px = self.row(y)?.get(offset..offset + CANONICAL_BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2]])
    }

    /// Release the pixel buffer. Equivalent to dropping the image.
    pub fn release(self) {}
}

impl fmt::Debug for CanonicalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride())
            .field("len", &self.data.len())
            .finish()
    }
}

/// How the stream's pixel layout came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOrigin {
    /// The device accepted this requested layout
    Requested(PixelLayout),
    /// Both requests were refused; the device's own format is in effect
    Native,
}

/// Pixel layout and geometry actually in effect on the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Layout of the delivered bytes, resolved from the post-request query
    pub layout: PixelLayout,
    pub origin: FormatOrigin,
    pub width: u32,
    pub height: u32,
    /// Byte distance between source rows (>= `width * bytes_per_pixel`)
    pub source_stride: usize,
}

impl NegotiatedFormat {
    /// Meaningful bytes per source row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// Minimum source buffer length that covers every row.
    pub fn min_source_len(&self) -> usize {
        match self.height {
            0 => 0,
            h => self.source_stride * (h as usize - 1) + self.row_bytes(),
        }
    }
}
