use std::sync::Arc;
use std::thread;

use padbridge::controller::backend::MockBackend;
use padbridge::controller::schema::{
    Field, FieldKind, LENGTH, NATIVE_FALSE, THUMBSTICK_MAX, THUMBSTICK_MIN, TRIGGER_MAX,
    TRIGGER_MIN,
};
use padbridge::controller::state::{StickAxes, Triggers};
use padbridge::controller::{ConnectionError, GamePadConnection, GamePadState};
use padbridge::input::{FourDirection, GamePadButton, InputState, InputType, StickSide};

fn assert_within_layout(vector: &[f32]) {
    assert_eq!(vector.len(), LENGTH);
    for field in Field::ALL {
        let value = vector[field.offset()];
        match field.kind() {
            FieldKind::Button => assert!(value == 0.0 || value == 1.0, "{:?} = {}", field, value),
            FieldKind::Trigger => {
                assert!(value >= TRIGGER_MIN as f32 && value <= TRIGGER_MAX as f32)
            }
            FieldKind::Thumbstick => {
                assert!(value >= THUMBSTICK_MIN as f32 && value <= THUMBSTICK_MAX as f32)
            }
            FieldKind::Connection => {}
        }
    }
}

#[test]
fn resting_controller_on_slot_zero() {
    let backend = MockBackend::new(4);
    backend.control().connect(0, GamePadState::idle());
    let conn = GamePadConnection::new(backend);

    let vector = conn.query_state(0).unwrap();
    assert_within_layout(&vector);
    assert!(vector[..14].iter().all(|b| *b == 0.0));
    assert_eq!(&vector[14..20], &[0.0; 6]);
    assert_ne!(vector[Field::Connection.offset()], NATIVE_FALSE);
}

#[test]
fn slot_without_hardware_reads_disconnected() {
    let conn = GamePadConnection::new(MockBackend::new(4));
    for slot in 0..4 {
        let vector = conn.query_state(slot).unwrap();
        assert_eq!(vector[Field::Connection.offset()], NATIVE_FALSE);
        assert_within_layout(&vector);
    }
}

#[test]
fn extremes_stay_inside_documented_ranges() {
    let backend = MockBackend::new(4);
    let mut state = GamePadState::idle();
    for button in GamePadButton::ALL {
        state.buttons.set(button, true);
    }
    state.triggers = Triggers {
        left: u8::MAX,
        right: u8::MAX,
    };
    state.sticks.left = StickAxes {
        x: i16::MIN,
        y: i16::MAX,
    };
    state.sticks.right = StickAxes {
        x: i16::MAX,
        y: i16::MIN,
    };
    backend.control().connect(2, state);
    let conn = GamePadConnection::new(backend);

    let vector = conn.query_state(2).unwrap();
    assert_within_layout(&vector);
    assert!(vector[..14].iter().all(|b| *b == 1.0));
}

#[test]
fn connection_flag_tracks_plugging() {
    let backend = MockBackend::new(4);
    let control = backend.control();
    let conn = GamePadConnection::new(backend);

    assert_eq!(conn.query_state(1).unwrap()[20], NATIVE_FALSE);
    control.connect(1, GamePadState::idle());
    assert_ne!(conn.query_state(1).unwrap()[20], NATIVE_FALSE);
    control.disconnect(1);
    assert_eq!(conn.query_state(1).unwrap()[20], NATIVE_FALSE);
}

#[test]
fn repeated_queries_are_identical() {
    let backend = MockBackend::new(4);
    let mut state = GamePadState::idle();
    state.buttons.start = true;
    state.sticks.left = StickAxes { x: 1200, y: -900 };
    backend.control().connect(0, state);
    let conn = GamePadConnection::new(backend);

    assert_eq!(conn.query_state(0).unwrap(), conn.query_state(0).unwrap());
}

#[test]
fn out_of_range_slot_is_an_error() {
    let conn = GamePadConnection::new(MockBackend::new(4));
    assert_eq!(
        conn.query_state(4),
        Err(ConnectionError::InvalidSlot {
            slot: 4,
            max_slots: 4
        })
    );
    assert!(conn.query_state(i32::MIN).is_err());
}

#[test]
fn release_then_query_reinitializes() {
    let backend = MockBackend::new(4);
    let control = backend.control();
    control.connect(0, GamePadState::idle());
    let conn = GamePadConnection::new(backend);

    let before = conn.query_state(0).unwrap();
    conn.release();
    let after = conn.query_state(0).unwrap();
    assert_eq!(before, after);
    assert_eq!(control.opens(), 2);
    assert_eq!(control.releases(), 1);
}

#[test]
fn release_waits_for_concurrent_queries() {
    let backend = MockBackend::new(4);
    let control = backend.control();
    control.connect(0, GamePadState::idle());
    let conn = Arc::new(GamePadConnection::new(backend));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let conn = conn.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let vector = conn.query_state(0).unwrap();
                    assert_within_layout(&vector);
                }
            })
        })
        .collect();
    for _ in 0..50 {
        conn.release();
    }
    for reader in readers {
        reader.join().unwrap();
    }
    conn.release();
    assert!(!conn.is_open());
    assert!(control.releases() >= 1);
}

#[test]
fn game_loop_sees_single_presses_and_stick_direction() {
    let backend = MockBackend::new(4);
    let control = backend.control();
    let conn = GamePadConnection::new(backend);
    let mut input = InputState::new(0.5);

    let mut state = GamePadState::idle();
    state.buttons.dpad_down = true;
    state.sticks.left = StickAxes { x: 30000, y: 0 };
    control.connect(0, state);

    input.update(conn.query(0).unwrap());
    assert!(input.is_pressed(GamePadButton::PovDown, InputType::Single));
    assert!(input.stick(StickSide::Left).is(FourDirection::East));
    assert!(input.stick(StickSide::Right).is_centered());

    input.update(conn.query(0).unwrap());
    assert!(!input.is_pressed(GamePadButton::PovDown, InputType::Single));
    assert!(input.is_pressed(GamePadButton::PovDown, InputType::Continue));
}
