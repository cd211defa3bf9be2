// Non-Windows stand-ins for the Media Foundation backend.
//
// Keeps the crate and its mock-driven tests building on every host; any real
// capture attempt fails cleanly.

use super::backend::{
    BackendError, BackendResult, CaptureBackend, MediaBuffer, MediaSample, MediaSource,
    SampleReader, VideoDevice,
};
use super::subsystem::Runtime;
use super::types::{PixelLayout, ReaderOptions, StreamFormat};

const UNSUPPORTED: &str = "Media Foundation is only available on Windows";

/// Runtime whose startup always fails.
#[derive(Debug, Default)]
pub struct UnsupportedRuntime;

impl Runtime for UnsupportedRuntime {
    fn startup(&mut self) -> Result<(), BackendError> {
        Err(BackendError::new("MFStartup", UNSUPPORTED))
    }

    fn shutdown(&mut self) {}
}

/// Backend whose enumeration always fails.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

/// Uninhabited: the stub never yields a device, so nothing below is reachable.
pub enum Never {}

impl CaptureBackend for UnsupportedBackend {
    type Device = Never;

    fn enumerate_devices(&mut self) -> BackendResult<Vec<Never>> {
        tracing::warn!("{UNSUPPORTED}");
        Err(BackendError::new("MFEnumDeviceSources", UNSUPPORTED))
    }
}

impl VideoDevice for Never {
    type Source = Never;

    fn friendly_name(&self) -> Option<String> {
        match *self {}
    }

    fn activate(&self) -> BackendResult<Never> {
        match *self {}
    }
}

impl MediaSource for Never {
    type Reader = Never;

    fn into_reader(self, _options: ReaderOptions) -> BackendResult<Never> {
        match self {}
    }
}

impl SampleReader for Never {
    type Sample = Never;

    fn request_layout(&mut self, _layout: PixelLayout) -> BackendResult<()> {
        match *self {}
    }

    fn current_format(&mut self) -> BackendResult<StreamFormat> {
        match *self {}
    }

    fn read_sample(&mut self) -> BackendResult<Option<Never>> {
        match *self {}
    }
}

impl MediaSample for Never {
    type Buffer = Never;

    fn to_contiguous(&self) -> BackendResult<Never> {
        match *self {}
    }
}

impl MediaBuffer for Never {
    type Guard<'a> = &'a [u8];

    fn lock(&mut self) -> BackendResult<&[u8]> {
        match *self {}
    }
}
