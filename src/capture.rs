// Capture engine module: backend traits, subsystem lifecycle and the
// platform backend (Media Foundation on Windows, a failing stub elsewhere).

pub mod backend;
pub mod subsystem;
pub mod types;

#[cfg(windows)]
pub mod mf;
#[cfg(not(windows))]
pub mod stub;

#[cfg(test)]
pub mod mock;

// Re-export commonly used types and functions
pub use backend::{
    BackendError, CaptureBackend, MediaBuffer, MediaSample, MediaSource, SampleReader,
    VideoDevice,
};
pub use subsystem::{initialize, initialize_with, is_initialized, teardown, Runtime, SubsystemError};
pub use types::{PixelLayout, ReaderOptions, StreamFormat, VideoSubtype};

/// Backend used by [`crate::pipeline::capture`] on this platform.
#[cfg(windows)]
pub type PlatformBackend = mf::MediaFoundationBackend;
/// Runtime installed by [`initialize`] on this platform.
#[cfg(windows)]
pub type PlatformRuntime = mf::MediaFoundationRuntime;

#[cfg(not(windows))]
pub type PlatformBackend = stub::UnsupportedBackend;
#[cfg(not(windows))]
pub type PlatformRuntime = stub::UnsupportedRuntime;
