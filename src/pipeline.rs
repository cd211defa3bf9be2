// Capture pipeline: device session → format negotiation → warm-up acquisition → pixel normalization
//
// `capture()` is the one-shot entry point. It requires the process-wide
// subsystem to be initialized (see `crate::capture::initialize`) and runs a
// single blocking device session against the platform backend.

mod acquire;
mod convert;
mod error;
mod negotiate;
mod session;
mod types;

pub use acquire::FrameAcquirer;
pub use convert::normalize;
pub use error::CaptureError;
pub use negotiate::negotiate;
pub use session::SessionState;

use session::DeviceSession;
pub use types::{CanonicalImage, FormatOrigin, NegotiatedFormat, CANONICAL_BYTES_PER_PIXEL};

use crate::capture::{subsystem, CaptureBackend, PlatformBackend};

/// Capture one still from the first camera.
///
/// # Examples
/// ```no_run
/// camsnap::capture::initialize().unwrap();
/// let image = camsnap::pipeline::capture().unwrap();
/// println!("{}x{}, {} bytes", image.width(), image.height(), image.data().len());
/// camsnap::capture::teardown();
/// ```
pub fn capture() -> Result<CanonicalImage, CaptureError> {
    capture_with(&mut PlatformBackend::default())
}

/// Capture one still through a specific backend.
///
/// Fails with [`CaptureError::NotInitialized`] before touching the backend
/// when the subsystem is not running. Device sessions cannot be built any
/// other way:
///
/// ```compile_fail
/// let _ = camsnap::pipeline::DeviceSession::new;
/// ```
pub fn capture_with<B: CaptureBackend>(backend: &mut B) -> Result<CanonicalImage, CaptureError> {
    if !subsystem::is_initialized() {
        return Err(CaptureError::NotInitialized);
    }
    DeviceSession::new(backend).run()
}

/// Release an image returned by [`capture`].
///
/// Dropping the image has the same effect; ownership guarantees the buffer
/// is freed exactly once either way.
pub fn release_image(image: CanonicalImage) {
    image.release();
}
