//! Native gamepad backends
//!
//! A backend owns the device handles and answers one question per call: what
//! is the state of slot `n` right now. Slot bookkeeping, device enumeration and
//! driver quirks stay behind this trait.

pub mod gilrs_backend;
pub mod mock;

pub use gilrs_backend::GilrsBackend;
pub use mock::MockBackend;

use super::state::GamePadState;

/// Number of simultaneous controllers an XInput-style API supports
pub const DEFAULT_MAX_SLOTS: usize = 4;
/// Upper bound on configured slots, the slot table is allocated up front
pub const MAX_SLOTS_LIMIT: usize = 16;

// Backend errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to open gamepad backend: {0}")]
    OpenError(String),

    #[error("Backend is not open")]
    NotOpen,

    #[error("Failed to read slot {slot}: {reason}")]
    ReadError { slot: usize, reason: String },

    #[error("Failed to release gamepad backend: {0}")]
    ReleaseError(String),
}

pub trait GamepadBackend: Send {
    /// Upper bound on slot indices, exclusive
    fn max_slots(&self) -> usize;

    /// Acquire device handles. Called before the first read and again after
    /// every release.
    fn open(&mut self) -> Result<(), BackendError>;

    /// Read one slot. `Ok(None)` means the slot is valid but empty.
    fn read(&mut self, slot: usize) -> Result<Option<GamePadState>, BackendError>;

    /// Drop device handles and caches.
    fn release(&mut self) -> Result<(), BackendError>;
}

impl<B: GamepadBackend + ?Sized> GamepadBackend for Box<B> {
    fn max_slots(&self) -> usize {
        (**self).max_slots()
    }

    fn open(&mut self) -> Result<(), BackendError> {
        (**self).open()
    }

    fn read(&mut self, slot: usize) -> Result<Option<GamePadState>, BackendError> {
        (**self).read(slot)
    }

    fn release(&mut self) -> Result<(), BackendError> {
        (**self).release()
    }
}
