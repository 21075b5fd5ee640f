//! C ABI for engines that poll through a native library
//!
//! ```c
//! int32_t padbridge_get_native_state(int32_t slot, float *out, size_t len);
//! void    padbridge_free(void);
//! size_t  padbridge_state_length(void);
//! ```
//!
//! All calls share one process-wide connection over [`GilrsBackend`], created
//! on first use with the default configuration. Call them from one thread, or
//! at least never call `padbridge_free` while a query is running elsewhere.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use tracing::error;

use crate::config::BridgeConfig;
use crate::controller::backend::{GamepadBackend, GilrsBackend};
use crate::controller::connection::{ConnectionError, GamePadConnection};
use crate::controller::schema::LENGTH;

pub const STATUS_OK: i32 = 0;
pub const STATUS_INVALID_SLOT: i32 = -1;
pub const STATUS_BAD_BUFFER: i32 = -2;
pub const STATUS_PANIC: i32 = -3;

static CONNECTION: OnceLock<GamePadConnection<GilrsBackend>> = OnceLock::new();

fn connection() -> &'static GamePadConnection<GilrsBackend> {
    CONNECTION.get_or_init(|| {
        let config = BridgeConfig::default();
        GamePadConnection::new(GilrsBackend::new(Some(config.gilrs_settings())))
    })
}

/// Query `slot` into `out`, returning one of the `STATUS_*` codes
pub fn write_native_state<B: GamepadBackend>(
    connection: &GamePadConnection<B>,
    slot: i32,
    out: &mut [f32],
) -> i32 {
    if out.len() < LENGTH {
        return STATUS_BAD_BUFFER;
    }
    match connection.query_state(slot) {
        Ok(vector) => {
            out[..LENGTH].copy_from_slice(&vector);
            STATUS_OK
        }
        Err(ConnectionError::InvalidSlot { .. }) => STATUS_INVALID_SLOT,
        // query_state already folds backend failures into a disconnected read
        Err(ConnectionError::Backend(e)) => {
            error!("Unexpected backend error at the native boundary: {}", e);
            out[..LENGTH].fill(0.0);
            STATUS_OK
        }
    }
}

/// [`write_native_state`] with panics turned into [`STATUS_PANIC`]
pub fn guarded_native_state<B: GamepadBackend>(
    connection: &GamePadConnection<B>,
    slot: i32,
    out: &mut [f32],
) -> i32 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        write_native_state(connection, slot, out)
    }));
    result.unwrap_or_else(|_| {
        error!("Panic while reading slot {}", slot);
        STATUS_PANIC
    })
}

/// Fill `out[..21]` with the state of `slot`.
///
/// # Safety
///
/// `out` must be null or point to `len` writable `f32`s.
#[no_mangle]
pub unsafe extern "C" fn padbridge_get_native_state(
    slot: i32,
    out: *mut f32,
    len: usize,
) -> i32 {
    if out.is_null() || len < LENGTH {
        return STATUS_BAD_BUFFER;
    }
    // SAFETY: non-null and the caller guarantees `len` writable elements
    let out = unsafe { std::slice::from_raw_parts_mut(out, len) };
    guarded_native_state(connection(), slot, out)
}

/// Release the process-wide backend. Safe to call any number of times.
#[no_mangle]
pub extern "C" fn padbridge_free() {
    if let Some(connection) = CONNECTION.get() {
        if catch_unwind(AssertUnwindSafe(|| connection.release())).is_err() {
            error!("Panic while releasing gamepad backend");
        }
    }
}

#[no_mangle]
pub extern "C" fn padbridge_state_length() -> usize {
    LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::backend::{BackendError, MockBackend};
    use crate::controller::state::GamePadState;

    struct PanickingBackend;

    impl GamepadBackend for PanickingBackend {
        fn max_slots(&self) -> usize {
            4
        }

        fn open(&mut self) -> Result<(), BackendError> {
            Ok(())
        }

        fn read(&mut self, slot: usize) -> Result<Option<GamePadState>, BackendError> {
            panic!("driver fault on slot {}", slot);
        }

        fn release(&mut self) -> Result<(), BackendError> {
            Ok(())
        }
    }

    #[test]
    fn writes_connected_vector() {
        let backend = MockBackend::new(4);
        let control = backend.control();
        let mut pressed = GamePadState::idle();
        pressed.buttons.y = true;
        control.connect(0, pressed);
        let conn = GamePadConnection::new(backend);

        let mut out = [9.0f32; LENGTH];
        assert_eq!(write_native_state(&conn, 0, &mut out), STATUS_OK);
        assert_eq!(out[3], 1.0);
        assert_eq!(out[20], 1.0);
    }

    #[test]
    fn reports_invalid_slot_and_short_buffer() {
        let conn = GamePadConnection::new(MockBackend::new(4));
        let mut out = [0.0f32; LENGTH];
        assert_eq!(write_native_state(&conn, 4, &mut out), STATUS_INVALID_SLOT);
        assert_eq!(write_native_state(&conn, -3, &mut out), STATUS_INVALID_SLOT);

        let mut short = [0.0f32; LENGTH - 1];
        assert_eq!(write_native_state(&conn, 0, &mut short), STATUS_BAD_BUFFER);
    }

    #[test]
    fn backend_panic_becomes_status_code() {
        let conn = GamePadConnection::new(PanickingBackend);
        let mut out = [0.0f32; LENGTH];
        assert_eq!(guarded_native_state(&conn, 1, &mut out), STATUS_PANIC);
        // the poisoned lock is recovered on the next call
        assert_eq!(guarded_native_state(&conn, 1, &mut out), STATUS_PANIC);
        conn.release();
        assert!(!conn.is_open());
    }

    #[test]
    fn null_buffer_is_rejected_without_touching_backend() {
        let status = unsafe { padbridge_get_native_state(0, std::ptr::null_mut(), LENGTH) };
        assert_eq!(status, STATUS_BAD_BUFFER);
        assert_eq!(padbridge_state_length(), 21);
    }

    #[test]
    fn free_without_queries_is_noop() {
        padbridge_free();
        padbridge_free();
    }
}
