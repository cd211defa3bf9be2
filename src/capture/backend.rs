// Backend traits: the seam between the capture pipeline and a native media runtime.
//
// Every handle type releases its native resource on drop, so scoped ownership
// in the pipeline gives one release per acquisition on every exit path.

use std::ops::Deref;

use super::types::{PixelLayout, ReaderOptions, StreamFormat};

/// Failure reported by a native backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct BackendError {
    /// Native call or step that failed
    pub operation: &'static str,
    pub message: String,
}

impl BackendError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[cfg(windows)]
impl From<(&'static str, windows::core::Error)> for BackendError {
    fn from((operation, err): (&'static str, windows::core::Error)) -> Self {
        Self::new(
            operation,
            format!("0x{:08X} {}", err.code().0, err.message()),
        )
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Entry point of a media runtime: lists video-capture devices.
pub trait CaptureBackend {
    type Device: VideoDevice;

    /// Enumerate video-capture devices in system order.
    fn enumerate_devices(&mut self) -> BackendResult<Vec<Self::Device>>;
}

/// An enumerated, not yet activated, device descriptor.
pub trait VideoDevice {
    type Source: MediaSource;

    fn friendly_name(&self) -> Option<String>;

    /// Instantiate the device as a media source.
    fn activate(&self) -> BackendResult<Self::Source>;
}

/// An activated device.
pub trait MediaSource {
    type Reader: SampleReader;

    /// Create a sample reader over the source's streams.
    ///
    /// Consumes the source: the reader keeps whatever it needs, and the
    /// device handle is released whether or not this succeeds.
    fn into_reader(self, options: ReaderOptions) -> BackendResult<Self::Reader>;
}

/// A reader bound to the first video stream of a source.
pub trait SampleReader {
    type Sample: MediaSample;

    /// Ask the stream to deliver `layout`. The device may refuse.
    fn request_layout(&mut self, layout: PixelLayout) -> BackendResult<()>;

    /// Query the format actually in effect.
    fn current_format(&mut self) -> BackendResult<StreamFormat>;

    /// Blocking read of the next sample. `Ok(None)` when the stream produced
    /// no sample this time (stream tick, device not ready).
    fn read_sample(&mut self) -> BackendResult<Option<Self::Sample>>;
}

/// A delivered video sample, possibly split across several buffers.
pub trait MediaSample {
    type Buffer: MediaBuffer;

    /// Flatten the sample into one contiguous buffer.
    fn to_contiguous(&self) -> BackendResult<Self::Buffer>;
}

/// A contiguous media buffer whose bytes are accessible while locked.
pub trait MediaBuffer {
    /// Lock guard; unlocks on drop.
    type Guard<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    fn lock(&mut self) -> BackendResult<Self::Guard<'_>>;
}
