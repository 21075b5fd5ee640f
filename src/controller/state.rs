//! Tagged gamepad state and its flat vector encoding

use serde::{Deserialize, Serialize};

use super::schema::{Field, FieldKind, LENGTH, NATIVE_FALSE, NATIVE_TRUE};
use crate::input::GamePadButton;

// Errors when decoding a flat vector
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("State vector has {0} elements, expected {LENGTH}")]
    WrongLength(usize),

    #[error("Value {value} at offset {offset} ({field:?}) is out of range")]
    OutOfRange {
        field: Field,
        offset: usize,
        value: f32,
    },
}

// Digital buttons, one per button offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buttons {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub left_stick: bool,
    pub right_stick: bool,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub start: bool,
    pub back: bool,
}

impl Buttons {
    pub fn get(&self, button: GamePadButton) -> bool {
        match button {
            GamePadButton::A => self.a,
            GamePadButton::B => self.b,
            GamePadButton::X => self.x,
            GamePadButton::Y => self.y,
            GamePadButton::Lb => self.left_bumper,
            GamePadButton::Rb => self.right_bumper,
            GamePadButton::LeftStick => self.left_stick,
            GamePadButton::RightStick => self.right_stick,
            GamePadButton::PovUp => self.dpad_up,
            GamePadButton::PovDown => self.dpad_down,
            GamePadButton::PovLeft => self.dpad_left,
            GamePadButton::PovRight => self.dpad_right,
            GamePadButton::Start => self.start,
            GamePadButton::Back => self.back,
        }
    }

    pub fn set(&mut self, button: GamePadButton, pressed: bool) {
        let slot = match button {
            GamePadButton::A => &mut self.a,
            GamePadButton::B => &mut self.b,
            GamePadButton::X => &mut self.x,
            GamePadButton::Y => &mut self.y,
            GamePadButton::Lb => &mut self.left_bumper,
            GamePadButton::Rb => &mut self.right_bumper,
            GamePadButton::LeftStick => &mut self.left_stick,
            GamePadButton::RightStick => &mut self.right_stick,
            GamePadButton::PovUp => &mut self.dpad_up,
            GamePadButton::PovDown => &mut self.dpad_down,
            GamePadButton::PovLeft => &mut self.dpad_left,
            GamePadButton::PovRight => &mut self.dpad_right,
            GamePadButton::Start => &mut self.start,
            GamePadButton::Back => &mut self.back,
        };
        *slot = pressed;
    }

    pub fn any_pressed(&self) -> bool {
        GamePadButton::ALL.iter().any(|b| self.get(*b))
    }
}

// Analog triggers in native units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triggers {
    pub left: u8,
    pub right: u8,
}

// One thumbstick in native units, Y up positive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickAxes {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticks {
    pub left: StickAxes,
    pub right: StickAxes,
}

/// State of one controller slot at the time of a query
///
/// The default value is the disconnected state: everything zeroed and the
/// connection flag cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePadState {
    pub buttons: Buttons,
    pub triggers: Triggers,
    pub sticks: Sticks,
    pub connected: bool,
}

impl GamePadState {
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connected controller at rest
    pub fn idle() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn button(&self, button: GamePadButton) -> bool {
        self.buttons.get(button)
    }

    /// Encode into the flat boundary vector
    pub fn to_vector(&self) -> [f32; LENGTH] {
        let mut vector = [0.0f32; LENGTH];
        for field in Field::ALL {
            vector[field.offset()] = self.value(field);
        }
        vector
    }

    /// Decode a flat boundary vector, rejecting anything outside the layout
    pub fn from_vector(vector: &[f32]) -> Result<Self, StateError> {
        if vector.len() != LENGTH {
            return Err(StateError::WrongLength(vector.len()));
        }

        for field in Field::ALL {
            let value = vector[field.offset()];
            if !field.accepts(value) {
                return Err(StateError::OutOfRange {
                    field,
                    offset: field.offset(),
                    value,
                });
            }
        }

        let mut state = GamePadState::default();
        for button in GamePadButton::ALL {
            state
                .buttons
                .set(button, vector[button.field().offset()] == 1.0);
        }
        state.triggers.left = vector[Field::TriggerLeft.offset()] as u8;
        state.triggers.right = vector[Field::TriggerRight.offset()] as u8;
        state.sticks.left.x = vector[Field::ThumbStickLeftX.offset()] as i16;
        state.sticks.left.y = vector[Field::ThumbStickLeftY.offset()] as i16;
        state.sticks.right.x = vector[Field::ThumbStickRightX.offset()] as i16;
        state.sticks.right.y = vector[Field::ThumbStickRightY.offset()] as i16;
        state.connected = vector[Field::Connection.offset()] != NATIVE_FALSE;
        Ok(state)
    }

    /// Value of a single field as it appears in the vector
    pub fn value(&self, field: Field) -> f32 {
        if field.kind() == FieldKind::Button {
            let pressed = GamePadButton::from_field(field)
                .map(|b| self.button(b))
                .unwrap_or(false);
            return if pressed { 1.0 } else { 0.0 };
        }
        match field {
            Field::TriggerLeft => self.triggers.left as f32,
            Field::TriggerRight => self.triggers.right as f32,
            Field::ThumbStickLeftX => self.sticks.left.x as f32,
            Field::ThumbStickLeftY => self.sticks.left.y as f32,
            Field::ThumbStickRightX => self.sticks.right.x as f32,
            Field::ThumbStickRightY => self.sticks.right.y as f32,
            Field::Connection => {
                if self.connected {
                    NATIVE_TRUE
                } else {
                    NATIVE_FALSE
                }
            }
            _ => 0.0,
        }
    }
}
