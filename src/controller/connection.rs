//! Gamepad state query interface
//!
//! [`GamePadConnection`] is the boundary the rest of the engine talks to. It
//! exposes the two native calls (read a slot, release everything) and owns
//! the error policy:
//!
//! - an empty but valid slot is not an error, it reads as disconnected
//! - a slot outside `0..max_slots` fails with [`ConnectionError::InvalidSlot`]
//! - a backend failure during a read is logged and reads as disconnected
//! - release never fails and may be called any number of times
//!
//! After a release the next query re-opens the backend.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use super::backend::{BackendError, GamepadBackend};
use super::schema::LENGTH;
use super::state::GamePadState;

// Connection errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid controller slot {slot}, backend supports 0..{max_slots}")]
    InvalidSlot { slot: i64, max_slots: usize },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

struct Inner<B> {
    backend: B,
    open: bool,
}

impl<B: GamepadBackend> Inner<B> {
    fn ensure_open(&mut self) -> Result<(), BackendError> {
        if !self.open {
            debug!("Opening gamepad backend");
            self.backend.open()?;
            self.open = true;
        }
        Ok(())
    }
}

/// Query interface over one backend instance
///
/// Backend access is serialized, so a [`release`](Self::release) never runs
/// while a query holds the backend. Share it across threads through an `Arc`.
pub struct GamePadConnection<B: GamepadBackend> {
    inner: Mutex<Inner<B>>,
    max_slots: usize,
}

impl<B: GamepadBackend> GamePadConnection<B> {
    /// Wrap a backend. Nothing is opened until the first query.
    pub fn new(backend: B) -> Self {
        let max_slots = backend.max_slots();
        info!("Creating gamepad connection with {} slots", max_slots);
        Self {
            inner: Mutex::new(Inner {
                backend,
                open: false,
            }),
            max_slots,
        }
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> MutexGuard<'_, Inner<B>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Gamepad backend lock was poisoned, continuing with inner state");
                poisoned.into_inner()
            }
        }
    }

    fn check_slot(&self, slot: i64) -> Result<usize, ConnectionError> {
        match usize::try_from(slot) {
            Ok(idx) if idx < self.max_slots => Ok(idx),
            _ => Err(ConnectionError::InvalidSlot {
                slot,
                max_slots: self.max_slots,
            }),
        }
    }

    /// Read a slot and encode it as the flat boundary vector
    pub fn query_state(&self, slot: i32) -> Result<[f32; LENGTH], ConnectionError> {
        Ok(self.query(slot)?.to_vector())
    }

    /// Read a slot, tolerating backend failures
    pub fn query(&self, slot: i32) -> Result<GamePadState, ConnectionError> {
        match self.try_query(slot) {
            Err(ConnectionError::Backend(e)) => {
                warn!(
                    "Reading slot {} failed, reporting disconnected: {}",
                    slot, e
                );
                Ok(GamePadState::disconnected())
            }
            other => other,
        }
    }

    /// Read a slot, propagating backend failures
    pub fn try_query(&self, slot: i32) -> Result<GamePadState, ConnectionError> {
        let idx = self.check_slot(slot as i64)?;

        let mut inner = self.lock();
        inner.ensure_open()?;
        let state = inner
            .backend
            .read(idx)?
            .map(|state| GamePadState {
                connected: true,
                ..state
            })
            .unwrap_or_else(GamePadState::disconnected);
        Ok(state)
    }

    /// Release backend resources. Never fails; a second call is a no-op.
    pub fn release(&self) {
        let mut inner = self.lock();
        if !inner.open {
            debug!("Release requested but backend is not open");
            return;
        }

        info!("Releasing gamepad backend");
        if let Err(e) = inner.backend.release() {
            error!("Backend did not release cleanly: {}", e);
        }
        inner.open = false;
    }
}
