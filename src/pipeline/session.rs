// Device session: enumerate → activate → reader → negotiate → acquire → normalize
//
// Each native handle lives in the narrowest scope that needs it. Dropping a
// handle releases it, so every exit path (including `?` early returns)
// releases exactly what was acquired up to that point:
// - device descriptors: dropped right after the first one is activated
// - device source: consumed by reader creation
// - reader: lives until the frame buffer is obtained
// - frame buffer and its lock: dropped once the pixels are copied out

use crate::capture::{CaptureBackend, MediaBuffer, MediaSource, ReaderOptions, VideoDevice};

use super::acquire::FrameAcquirer;
use super::convert::normalize;
use super::error::CaptureError;
use super::negotiate::negotiate;
use super::types::CanonicalImage;

/// Session progress. Transitions only move forward; `Failed` is reachable
/// from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Enumerated,
    Activated,
    ReaderReady,
    FormatNegotiated,
    FrameAcquired,
    Normalized,
    Failed,
}

/// One capture run against a backend.
///
/// Built only by [`super::capture_with`], after the subsystem check.
pub(crate) struct DeviceSession<'a, B: CaptureBackend> {
    backend: &'a mut B,
    acquirer: FrameAcquirer,
    state: SessionState,
}

impl<'a, B: CaptureBackend> DeviceSession<'a, B> {
    pub(crate) fn new(backend: &'a mut B) -> Self {
        Self::with_acquirer(backend, FrameAcquirer::default())
    }

    pub(crate) fn with_acquirer(backend: &'a mut B, acquirer: FrameAcquirer) -> Self {
        Self {
            backend,
            acquirer,
            state: SessionState::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    fn advance(&mut self, next: SessionState) {
        tracing::debug!("session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run the session to completion.
    ///
    /// A session runs once; calling `run` again after it finished yields
    /// `CaptureFailed` without touching the backend.
    pub(crate) fn run(&mut self) -> Result<CanonicalImage, CaptureError> {
        if self.state != SessionState::Idle {
            return Err(CaptureError::CaptureFailed(format!(
                "session already finished in state {:?}",
                self.state
            )));
        }

        let result = self.drive();
        match &result {
            Ok(image) => tracing::info!(
                "captured {}x{} frame ({} bytes)",
                image.width(),
                image.height(),
                image.data().len()
            ),
            Err(err) => {
                tracing::warn!("capture failed in state {:?}: {err}", self.state);
                self.advance(SessionState::Failed);
            }
        }
        result
    }

    fn drive(&mut self) -> Result<CanonicalImage, CaptureError> {
        let source = {
            let devices = self
                .backend
                .enumerate_devices()
                .map_err(CaptureError::device_init)?;
            self.advance(SessionState::Enumerated);

            let first = devices.first().ok_or(CaptureError::NoDeviceFound)?;
            if let Some(name) = first.friendly_name() {
                tracing::info!("using camera '{name}' (1 of {})", devices.len());
            }
            // `devices` drops at the end of this block whatever the outcome
            first.activate().map_err(CaptureError::activation)?
        };
        self.advance(SessionState::Activated);

        let (mut frame, format) = {
            let mut reader = source
                .into_reader(ReaderOptions::default())
                .map_err(CaptureError::capture)?;
            self.advance(SessionState::ReaderReady);

            let format = negotiate(&mut reader)?;
            self.advance(SessionState::FormatNegotiated);

            (self.acquirer.acquire(&mut reader)?, format)
        };
        self.advance(SessionState::FrameAcquired);

        let image = {
            let locked = frame.lock().map_err(CaptureError::capture)?;
            normalize(&locked, &format)?
        };
        self.advance(SessionState::Normalized);
        Ok(image)
    }
}
