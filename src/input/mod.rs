//! Game-loop view of a gamepad
//!
//! [`InputState`] is fed one [`GamePadState`] per frame and answers the two
//! questions a game loop asks: did this button go down this frame, and where
//! is the stick pointing.

pub mod stick;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::schema::Field;
use crate::controller::state::GamePadState;

pub use stick::{FourDirection, StickPosition, StickSide};

// Named digital buttons in vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePadButton {
    A,
    B,
    X,
    Y,
    Lb,
    Rb,
    LeftStick,
    RightStick,
    PovUp,
    PovDown,
    PovLeft,
    PovRight,
    Start,
    Back,
}

impl GamePadButton {
    pub const ALL: [GamePadButton; 14] = [
        GamePadButton::A,
        GamePadButton::B,
        GamePadButton::X,
        GamePadButton::Y,
        GamePadButton::Lb,
        GamePadButton::Rb,
        GamePadButton::LeftStick,
        GamePadButton::RightStick,
        GamePadButton::PovUp,
        GamePadButton::PovDown,
        GamePadButton::PovLeft,
        GamePadButton::PovRight,
        GamePadButton::Start,
        GamePadButton::Back,
    ];

    /// Vector field carrying this button
    pub fn field(self) -> Field {
        Field::ALL[self as usize]
    }

    pub fn from_field(field: Field) -> Option<GamePadButton> {
        GamePadButton::ALL.get(field.offset()).copied()
    }
}

/// How a press is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    /// Only on the frame the button went down
    Single,
    /// Every frame the button is held
    Continue,
}

/// Per-frame input tracker for one controller
#[derive(Debug, Clone)]
pub struct InputState {
    previous: GamePadState,
    current: GamePadState,
    direction_threshold: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl InputState {
    pub fn new(direction_threshold: f32) -> Self {
        Self {
            previous: GamePadState::disconnected(),
            current: GamePadState::disconnected(),
            direction_threshold,
        }
    }

    /// Advance one frame
    pub fn update(&mut self, state: GamePadState) {
        if state.connected != self.current.connected {
            debug!(
                "Gamepad connection changed: {} -> {}",
                self.current.connected, state.connected
            );
        }
        self.previous = self.current;
        self.current = state;
    }

    pub fn current(&self) -> &GamePadState {
        &self.current
    }

    pub fn is_connected(&self) -> bool {
        self.current.connected
    }

    pub fn is_pressed(&self, button: GamePadButton, input_type: InputType) -> bool {
        let down = self.current.button(button);
        match input_type {
            InputType::Continue => down,
            InputType::Single => down && !self.previous.button(button),
        }
    }

    /// Button went up this frame
    pub fn is_released(&self, button: GamePadButton) -> bool {
        !self.current.button(button) && self.previous.button(button)
    }

    pub fn any_pressed(&self, input_type: InputType) -> bool {
        GamePadButton::ALL
            .iter()
            .any(|b| self.is_pressed(*b, input_type))
    }

    pub fn stick(&self, side: StickSide) -> StickPosition {
        StickPosition::from_state(&self.current, side, self.direction_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressing(buttons: &[GamePadButton]) -> GamePadState {
        let mut state = GamePadState::idle();
        for b in buttons {
            state.buttons.set(*b, true);
        }
        state
    }

    #[test]
    fn buttons_map_to_button_fields() {
        for (idx, button) in GamePadButton::ALL.iter().enumerate() {
            assert_eq!(button.field().offset(), idx);
            assert_eq!(GamePadButton::from_field(button.field()), Some(*button));
        }
        assert_eq!(GamePadButton::from_field(Field::TriggerLeft), None);
    }

    #[test]
    fn single_fires_only_on_press_frame() {
        let mut input = InputState::default();
        input.update(pressing(&[GamePadButton::A]));
        assert!(input.is_pressed(GamePadButton::A, InputType::Single));

        input.update(pressing(&[GamePadButton::A]));
        assert!(!input.is_pressed(GamePadButton::A, InputType::Single));
        assert!(input.is_pressed(GamePadButton::A, InputType::Continue));

        input.update(GamePadState::idle());
        assert!(input.is_released(GamePadButton::A));
        assert!(!input.is_pressed(GamePadButton::A, InputType::Continue));
    }

    #[test]
    fn any_pressed_sees_pov() {
        let mut input = InputState::default();
        assert!(!input.any_pressed(InputType::Continue));
        input.update(pressing(&[GamePadButton::PovDown]));
        assert!(input.any_pressed(InputType::Single));
    }

    #[test]
    fn disconnect_reads_as_released() {
        let mut input = InputState::default();
        input.update(pressing(&[GamePadButton::Rb]));
        input.update(GamePadState::disconnected());
        assert!(!input.is_connected());
        assert!(input.is_released(GamePadButton::Rb));
    }
}
