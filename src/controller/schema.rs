//! Layout of the flat gamepad state vector
//!
//! Every consumer on the other side of the native boundary indexes the vector
//! by offset, so the offsets and bounds below are the wire contract. Inside the
//! crate, code goes through [`Field`] instead of raw offsets.

use serde::{Deserialize, Serialize};

/// Number of elements in a state vector.
pub const LENGTH: usize = 21;

/// Value written at [`Field::Connection`] when no device is present.
pub const NATIVE_FALSE: f32 = 0.0;
/// Value written at [`Field::Connection`] when a device is present.
pub const NATIVE_TRUE: f32 = 1.0;

pub const TRIGGER_MIN: i32 = 0;
pub const TRIGGER_MAX: i32 = 255;

pub const THUMBSTICK_MIN: i32 = -32768;
pub const THUMBSTICK_CENTER: i32 = 0;
pub const THUMBSTICK_MAX: i32 = 32767;
/// Largest distance between two thumbstick readings on one axis.
pub const THUMBSTICK_ABS_MAX: i32 = 65534;

/// What a field in the vector encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Button,
    Trigger,
    Thumbstick,
    Connection,
}

impl FieldKind {
    /// Inclusive range of values a field of this kind may hold.
    ///
    /// Connection only documents the `0 = absent` sentinel; any other value
    /// means present, so its range is open above.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            FieldKind::Button => (0.0, 1.0),
            FieldKind::Trigger => (TRIGGER_MIN as f32, TRIGGER_MAX as f32),
            FieldKind::Thumbstick => (THUMBSTICK_MIN as f32, THUMBSTICK_MAX as f32),
            FieldKind::Connection => (f32::MIN, f32::MAX),
        }
    }
}

/// One named slot of the state vector, declared in offset order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    ButtonA,
    ButtonB,
    ButtonX,
    ButtonY,
    ButtonLb,
    ButtonRb,
    ButtonLeftStick,
    ButtonRightStick,
    ButtonPovUp,
    ButtonPovDown,
    ButtonPovLeft,
    ButtonPovRight,
    ButtonStart,
    ButtonBack,
    TriggerLeft,
    TriggerRight,
    ThumbStickLeftX,
    ThumbStickLeftY,
    ThumbStickRightX,
    ThumbStickRightY,
    Connection,
}

impl Field {
    pub const ALL: [Field; LENGTH] = [
        Field::ButtonA,
        Field::ButtonB,
        Field::ButtonX,
        Field::ButtonY,
        Field::ButtonLb,
        Field::ButtonRb,
        Field::ButtonLeftStick,
        Field::ButtonRightStick,
        Field::ButtonPovUp,
        Field::ButtonPovDown,
        Field::ButtonPovLeft,
        Field::ButtonPovRight,
        Field::ButtonStart,
        Field::ButtonBack,
        Field::TriggerLeft,
        Field::TriggerRight,
        Field::ThumbStickLeftX,
        Field::ThumbStickLeftY,
        Field::ThumbStickRightX,
        Field::ThumbStickRightY,
        Field::Connection,
    ];

    /// Index of this field in the state vector
    pub fn offset(self) -> usize {
        self as usize
    }

    pub fn from_offset(offset: usize) -> Option<Field> {
        Field::ALL.get(offset).copied()
    }

    pub fn kind(self) -> FieldKind {
        match self.offset() {
            0..=13 => FieldKind::Button,
            14 | 15 => FieldKind::Trigger,
            16..=19 => FieldKind::Thumbstick,
            _ => FieldKind::Connection,
        }
    }

    /// Whether `value` is legal for this field.
    pub fn accepts(self, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.kind() {
            FieldKind::Button => value == 0.0 || value == 1.0,
            FieldKind::Connection => true,
            kind => {
                let (min, max) = kind.bounds();
                value >= min && value <= max && value.fract() == 0.0
            }
        }
    }
}
