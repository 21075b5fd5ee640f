use std::sync::Arc;

use chrono::{DateTime, Local};
use statum::{machine, state};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::backend::GamepadBackend;
use super::connection::{ConnectionError, GamePadConnection};
use super::state::GamePadState;

/// Anything the poller can read slots from
pub trait StateSource: Send + Sync {
    fn max_slots(&self) -> usize;
    fn query(&self, slot: i32) -> Result<GamePadState, ConnectionError>;
}

impl<B: GamepadBackend> StateSource for GamePadConnection<B> {
    fn max_slots(&self) -> usize {
        GamePadConnection::max_slots(self)
    }

    fn query(&self, slot: i32) -> Result<GamePadState, ConnectionError> {
        GamePadConnection::query(self, slot)
    }
}

// One published reading
#[derive(Debug, Clone, PartialEq)]
pub struct PadSnapshot {
    pub slot: i32,
    pub state: GamePadState,
    pub captured_at: DateTime<Local>,
}

impl PadSnapshot {
    fn empty(slot: i32) -> Self {
        Self {
            slot,
            state: GamePadState::disconnected(),
            captured_at: Local::now(),
        }
    }
}

// Poller settings
#[derive(Clone, Debug)]
pub struct PollerSettings {
    pub slot: i32,
    pub poll_interval_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            slot: 0,
            poll_interval_ms: 16,
        }
    }
}

// Poller errors
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Failed to initialize poller: {0}")]
    InitializationError(String),

    #[error("Invalid poll slot: {0}")]
    SlotError(#[from] ConnectionError),

    #[error("Poller task failed: {0}")]
    TaskError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum PollingState {
    Initializing,
    Polling,
}

#[machine]
pub struct StatePoller<S: PollingState> {
    // Connection shared with other pollers and the release path
    source: Arc<dyn StateSource>,

    settings: PollerSettings,

    // Latest snapshot for subscribers
    state_sender: watch::Sender<PadSnapshot>,

    // Connection flag of the previous poll, for change logging
    last_connected: bool,
}

impl<S: PollingState> StatePoller<S> {
    pub fn subscribe(&self) -> watch::Receiver<PadSnapshot> {
        self.state_sender.subscribe()
    }

    pub fn settings(&self) -> &PollerSettings {
        &self.settings
    }
}

impl StatePoller<Initializing> {
    pub fn create(
        source: Arc<dyn StateSource>,
        settings: Option<PollerSettings>,
    ) -> Result<Self, PollerError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating state poller with settings: {:?}", settings);

        if settings.poll_interval_ms == 0 {
            return Err(PollerError::InitializationError(
                "poll interval must be at least 1 ms".to_string(),
            ));
        }
        if settings.slot < 0 || settings.slot as usize >= source.max_slots() {
            return Err(PollerError::SlotError(ConnectionError::InvalidSlot {
                slot: settings.slot as i64,
                max_slots: source.max_slots(),
            }));
        }

        let (state_sender, _) = watch::channel(PadSnapshot::empty(settings.slot));
        Ok(Self::new(source, settings, state_sender, false))
    }

    // First read, then start polling
    pub fn initialize(self) -> StatePoller<Polling> {
        info!(
            "Initializing state poller for slot {} every {} ms",
            self.settings.slot, self.settings.poll_interval_ms
        );
        let mut polling: StatePoller<Polling> = self.transition();
        let snapshot = polling.poll_once();
        if !snapshot.state.connected {
            warn!(
                "No gamepad on slot {}, polling until one appears",
                snapshot.slot
            );
        }
        polling
    }
}

impl StatePoller<Polling> {
    /// Read the slot once and publish the result
    pub fn poll_once(&mut self) -> PadSnapshot {
        let slot = self.settings.slot;
        let state = match self.source.query(slot) {
            Ok(state) => state,
            Err(e) => {
                error!("Polling slot {} failed: {}", slot, e);
                GamePadState::disconnected()
            }
        };

        if state.connected != self.last_connected {
            if state.connected {
                info!("Gamepad on slot {} connected", slot);
            } else {
                warn!("Gamepad on slot {} disconnected", slot);
            }
            self.last_connected = state.connected;
        }

        let snapshot = PadSnapshot {
            slot,
            state,
            captured_at: Local::now(),
        };
        // Timestamp moves every poll, subscribers are woken only on change
        self.state_sender.send_if_modified(|current| {
            current.captured_at = snapshot.captured_at;
            if current.state == snapshot.state {
                false
            } else {
                current.state = snapshot.state;
                true
            }
        });
        snapshot
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval_timer = tokio::time::interval(tokio::time::Duration::from_millis(
            self.settings.poll_interval_ms,
        ));
        interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut polls: u64 = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        info!("Entering poll loop for slot {}", self.settings.slot);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(
                        "Poll loop for slot {} cancelled after {} polls",
                        self.settings.slot, polls
                    );
                    break;
                }
                _ = interval_timer.tick() => {
                    self.poll_once();
                    polls += 1;
                }
            }

            let now = Local::now();
            if now - last_stats_time > stats_interval {
                debug!(
                    "Poller stats: slot {} polled {} times in {} seconds",
                    self.settings.slot,
                    polls,
                    (now - last_stats_time).num_seconds()
                );
                polls = 0;
                last_stats_time = now;
            }
        }
    }
}

/// Running poller task, cancelled when the handle is dropped
pub struct PollerHandle {
    state_receiver: watch::Receiver<PadSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _cancel_on_drop: DropGuard,
}

impl PollerHandle {
    /// Spawn a poller as a tokio task. Must be called inside a runtime.
    pub fn spawn(
        source: Arc<dyn StateSource>,
        settings: Option<PollerSettings>,
    ) -> Result<Self, PollerError> {
        info!("Spawning state poller with settings: {:?}", settings);

        let poller = StatePoller::create(source, settings)?;
        let state_receiver = poller.subscribe();
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            poller.initialize().run(task_cancel).await;
        });

        Ok(Self {
            state_receiver,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<PadSnapshot> {
        self.state_receiver.clone()
    }

    pub fn latest(&self) -> PadSnapshot {
        self.state_receiver.borrow().clone()
    }

    /// Cancel the task and wait until its last poll has returned
    pub async fn stop(self) -> Result<(), PollerError> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| PollerError::TaskError(e.to_string()))
    }
}
