//! Controller Handle - Unified API for polling gamepads
//!
//! Owns the shared [`GamePadConnection`] and one poller task per configured
//! slot. Shutdown stops every poller before the backend is released, so a
//! release never races an in-flight query.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::backend::GamepadBackend;
use super::connection::GamePadConnection;
use super::state_poller::{PadSnapshot, PollerError, PollerHandle, PollerSettings};
use crate::config::BridgeConfig;

/// Configuration settings for the complete controller subsystem
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Slots to poll in the background
    pub slots: Vec<i32>,

    /// Poll period in milliseconds, shared by every slot
    pub poll_interval_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            slots: vec![0],
            poll_interval_ms: 16, // one frame at 60 Hz
        }
    }
}

impl From<&BridgeConfig> for ControllerSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            slots: config.poll_slots.clone(),
            poll_interval_ms: config.poll_interval_ms,
        }
    }
}

/// Errors that can occur while starting or stopping the controller subsystem
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A poller could not be started or did not shut down cleanly
    #[error("Poller error: {0}")]
    PollerError(#[from] PollerError),

    /// The same slot was requested twice
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

/// Handle for the polling subsystem lifecycle
pub struct ControllerHandle<B: GamepadBackend + 'static> {
    connection: Arc<GamePadConnection<B>>,
    pollers: HashMap<i32, PollerHandle>,
}

impl<B: GamepadBackend + 'static> ControllerHandle<B> {
    /// Wraps `backend` in a connection and spawns a poller per slot
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        settings: Option<ControllerSettings>,
        backend: B,
    ) -> Result<Self, ControllerError> {
        info!(
            "Initializing Controller system with settings: {:?}",
            settings
        );
        let settings = settings.unwrap_or_default();
        let connection = Arc::new(GamePadConnection::new(backend));

        let mut pollers = HashMap::new();
        for slot in settings.slots.iter().copied() {
            if pollers.contains_key(&slot) {
                return Err(ControllerError::InitializationError(format!(
                    "slot {} listed twice",
                    slot
                )));
            }
            let poller_settings = PollerSettings {
                slot,
                poll_interval_ms: settings.poll_interval_ms,
            };
            debug!("Spawning poller: {:?}", poller_settings);
            let handle = PollerHandle::spawn(connection.clone(), Some(poller_settings))?;
            pollers.insert(slot, handle);
        }

        info!(
            "Controller system initialized with {} pollers",
            pollers.len()
        );
        Ok(Self {
            connection,
            pollers,
        })
    }

    /// Connection for direct queries alongside the pollers
    pub fn connection(&self) -> Arc<GamePadConnection<B>> {
        self.connection.clone()
    }

    /// Receiver for a polled slot, `None` if the slot is not polled
    pub fn subscribe(&self, slot: i32) -> Option<watch::Receiver<PadSnapshot>> {
        self.pollers.get(&slot).map(PollerHandle::subscribe)
    }

    pub fn polled_slots(&self) -> Vec<i32> {
        let mut slots: Vec<i32> = self.pollers.keys().copied().collect();
        slots.sort_unstable();
        slots
    }

    /// Stop every poller, then release the backend
    pub async fn shutdown(self) -> Result<(), ControllerError> {
        info!("Shutting down controller system");
        let mut first_error = None;
        for (slot, poller) in self.pollers {
            if let Err(e) = poller.stop().await {
                error!("Poller for slot {} did not stop cleanly: {}", slot, e);
                first_error.get_or_insert(e);
            }
        }

        self.connection.release();

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::backend::MockBackend;
    use crate::controller::state::GamePadState;

    #[tokio::test]
    async fn duplicate_slots_are_rejected() {
        let settings = ControllerSettings {
            slots: vec![0, 0],
            poll_interval_ms: 5,
        };
        assert!(matches!(
            ControllerHandle::spawn(Some(settings), MockBackend::new(4)),
            Err(ControllerError::InitializationError(_))
        ));
    }

    #[tokio::test]
    async fn invalid_slot_fails_spawn() {
        let settings = ControllerSettings {
            slots: vec![7],
            poll_interval_ms: 5,
        };
        assert!(matches!(
            ControllerHandle::spawn(Some(settings), MockBackend::new(4)),
            Err(ControllerError::PollerError(PollerError::SlotError(_)))
        ));
    }

    #[tokio::test]
    async fn shutdown_releases_after_pollers_stop() {
        let backend = MockBackend::new(4);
        let control = backend.control();
        control.connect(2, GamePadState::idle());
        let settings = ControllerSettings {
            slots: vec![2, 0],
            poll_interval_ms: 2,
        };
        let handle = ControllerHandle::spawn(Some(settings), backend).unwrap();
        assert_eq!(handle.polled_slots(), vec![0, 2]);
        assert!(handle.subscribe(1).is_none());

        let mut rx = handle.subscribe(2).unwrap();
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            rx.wait_for(|snap| snap.state.connected),
        )
        .await
        .expect("slot 2 never reported connected")
        .unwrap();

        let connection = handle.connection();
        handle.shutdown().await.unwrap();
        assert!(!connection.is_open());
        assert_eq!(control.releases(), 1);
    }
}
