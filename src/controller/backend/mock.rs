use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{BackendError, GamepadBackend};
use crate::controller::state::GamePadState;

#[derive(Debug, Default)]
struct MockSlots {
    pads: HashMap<usize, GamePadState>,
    failing: HashMap<usize, String>,
    fail_open: Option<String>,
    fail_release: Option<String>,
}

/// Counters and slot contents shared between a [`MockBackend`] and the code
/// driving it
#[derive(Debug, Clone, Default)]
pub struct MockControl {
    slots: Arc<Mutex<MockSlots>>,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl MockControl {
    fn with_slots<R>(&self, f: impl FnOnce(&mut MockSlots) -> R) -> R {
        let mut guard = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Plug a controller into `slot`, or replace what it reports
    pub fn connect(&self, slot: usize, state: GamePadState) {
        let state = GamePadState {
            connected: true,
            ..state
        };
        self.with_slots(|s| s.pads.insert(slot, state));
    }

    pub fn disconnect(&self, slot: usize) {
        self.with_slots(|s| s.pads.remove(&slot));
    }

    /// Make every read of `slot` fail until [`MockControl::heal`]
    pub fn fail_reads(&self, slot: usize, reason: &str) {
        self.with_slots(|s| s.failing.insert(slot, reason.to_string()));
    }

    pub fn heal(&self, slot: usize) {
        self.with_slots(|s| s.failing.remove(&slot));
    }

    pub fn fail_open(&self, reason: Option<&str>) {
        self.with_slots(|s| s.fail_open = reason.map(str::to_string));
    }

    pub fn fail_release(&self, reason: Option<&str>) {
        self.with_slots(|s| s.fail_release = reason.map(str::to_string));
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

/// In-memory backend for tests and headless runs
#[derive(Debug)]
pub struct MockBackend {
    max_slots: usize,
    open: bool,
    control: MockControl,
}

impl MockBackend {
    pub fn new(max_slots: usize) -> Self {
        Self {
            max_slots,
            open: false,
            control: MockControl::default(),
        }
    }

    /// Handle for plugging controllers in and out after the backend has been
    /// moved into a connection
    pub fn control(&self) -> MockControl {
        self.control.clone()
    }
}

impl GamepadBackend for MockBackend {
    fn max_slots(&self) -> usize {
        self.max_slots
    }

    fn open(&mut self) -> Result<(), BackendError> {
        if let Some(reason) = self.control.with_slots(|s| s.fail_open.clone()) {
            return Err(BackendError::OpenError(reason));
        }
        self.control.opens.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        debug!("Mock backend opened with {} slots", self.max_slots);
        Ok(())
    }

    fn read(&mut self, slot: usize) -> Result<Option<GamePadState>, BackendError> {
        if !self.open {
            return Err(BackendError::NotOpen);
        }
        self.control.reads.fetch_add(1, Ordering::SeqCst);
        self.control.with_slots(|s| {
            if let Some(reason) = s.failing.get(&slot) {
                return Err(BackendError::ReadError {
                    slot,
                    reason: reason.clone(),
                });
            }
            Ok(s.pads.get(&slot).copied())
        })
    }

    fn release(&mut self) -> Result<(), BackendError> {
        self.control.releases.fetch_add(1, Ordering::SeqCst);
        self.open = false;
        match self.control.with_slots(|s| s.fail_release.clone()) {
            Some(reason) => Err(BackendError::ReleaseError(reason)),
            None => Ok(()),
        }
    }
}
