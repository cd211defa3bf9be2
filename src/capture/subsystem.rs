// Process-wide capture subsystem lifecycle
//
// The native media runtime must be started once before any device session and
// shut down once after the last one. The installed runtime doubles as the
// "initialized" flag; only `initialize_with` and `teardown` touch it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::backend::BackendError;

/// Subsystem lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubsystemError {
    /// `initialize` was called while a runtime is already installed.
    #[error("capture subsystem is already initialized")]
    AlreadyInitialized,
    /// The native runtime failed to start.
    #[error("failed to initialize capture runtime")]
    Runtime(#[from] BackendError),
}

/// A process-wide native media runtime.
pub trait Runtime: Send {
    fn startup(&mut self) -> Result<(), BackendError>;

    /// Undo a successful `startup`.
    fn shutdown(&mut self);
}

static SUBSYSTEM: Mutex<Option<Box<dyn Runtime>>> = Mutex::new(None);

fn state() -> MutexGuard<'static, Option<Box<dyn Runtime>>> {
    SUBSYSTEM.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Start the platform's default media runtime.
///
/// Not idempotent: a second call before `teardown` returns
/// [`SubsystemError::AlreadyInitialized`] and leaves the running runtime alone.
pub fn initialize() -> Result<(), SubsystemError> {
    initialize_with(super::PlatformRuntime::default())
}

/// Start and install a specific runtime.
///
/// On failure nothing is installed and the subsystem stays uninitialized.
pub fn initialize_with(runtime: impl Runtime + 'static) -> Result<(), SubsystemError> {
    let mut state = state();
    if state.is_some() {
        return Err(SubsystemError::AlreadyInitialized);
    }

    let mut runtime = Box::new(runtime);
    runtime.startup().map_err(|err| {
        tracing::debug!("capture runtime startup failed: {err}");
        SubsystemError::Runtime(err)
    })?;

    tracing::debug!("capture subsystem initialized");
    *state = Some(runtime);
    Ok(())
}

/// Shut the installed runtime down. No-op if never initialized.
pub fn teardown() {
    if let Some(mut runtime) = state().take() {
        runtime.shutdown();
        tracing::debug!("capture subsystem torn down");
    }
}

pub fn is_initialized() -> bool {
    state().is_some()
}
