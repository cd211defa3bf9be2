use crate::capture::BackendError;

/// Reasons a capture attempt ends without an image.
///
/// Every variant is terminal for the attempt; the only retry in the pipeline
/// is the bounded warm-up loop inside frame acquisition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// `capture` was called before `initialize` (or after `teardown`).
    #[error("capture subsystem is not initialized")]
    NotInitialized,
    #[error("no camera device found")]
    NoDeviceFound,
    /// Device enumeration itself failed.
    #[error("failed to enumerate camera devices: {0}")]
    DeviceInitError(String),
    #[error("failed to activate camera: {0}")]
    ActivationFailed(String),
    #[error("unsupported video format: {0}")]
    UnsupportedFormat(String),
    /// Warm-up exhaustion, reader/buffer/lock failure, or allocation failure.
    #[error("failed to capture image: {0}")]
    CaptureFailed(String),
}

impl CaptureError {
    pub(crate) fn device_init(err: BackendError) -> Self {
        Self::DeviceInitError(err.to_string())
    }

    pub(crate) fn activation(err: BackendError) -> Self {
        Self::ActivationFailed(err.to_string())
    }

    pub(crate) fn format(err: BackendError) -> Self {
        Self::UnsupportedFormat(err.to_string())
    }

    pub(crate) fn capture(err: BackendError) -> Self {
        Self::CaptureFailed(err.to_string())
    }
}
