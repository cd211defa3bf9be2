// Capture module public types

/// Output pixel layouts the pipeline can consume.
///
/// Both layouts keep blue in the first byte. `Bgrx32` carries a fourth
/// byte (alpha or padding) that is dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 3 bytes per pixel: B, G, R
    Bgr24,
    /// 4 bytes per pixel: B, G, R, X
    Bgrx32,
}

impl PixelLayout {
    /// Layouts requested from the device, in order of preference.
    pub const CANDIDATES: [PixelLayout; 2] = [PixelLayout::Bgr24, PixelLayout::Bgrx32];

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgr24 => 3,
            Self::Bgrx32 => 4,
        }
    }
}

/// Video subtype reported by a stream's current media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSubtype {
    Rgb24,
    Rgb32,
    Argb32,
    /// Any other subtype (YUY2, NV12, MJPG, ...), kept for diagnostics
    Other(String),
}

impl VideoSubtype {
    /// Pixel layout this subtype decodes to, if it is one the pipeline handles.
    pub fn layout(&self) -> Option<PixelLayout> {
        match self {
            Self::Rgb24 => Some(PixelLayout::Bgr24),
            Self::Rgb32 | Self::Argb32 => Some(PixelLayout::Bgrx32),
            Self::Other(_) => None,
        }
    }
}

/// Format currently in effect on a reader's video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub subtype: VideoSubtype,
    /// Frame width (pixels)
    pub width: u32,
    /// Frame height (pixels)
    pub height: u32,
    /// Default stride in bytes when the device reports one.
    /// Negative values denote bottom-up surfaces.
    pub default_stride: Option<i32>,
}

/// Options applied when a reader is created from a device source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Let the runtime insert its own colorspace conversion
    pub video_processing: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            video_processing: true,
        }
    }
}
