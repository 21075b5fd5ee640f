use serde::{Deserialize, Serialize};

use crate::controller::schema::THUMBSTICK_MAX;
use crate::controller::state::{GamePadState, StickAxes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FourDirection {
    North,
    South,
    East,
    West,
}

/// Thumbstick normalized to `[-1, 1]` on both axes, Y up positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickPosition {
    pub x: f32,
    pub y: f32,
    threshold: f32,
}

impl StickPosition {
    /// Centered stick
    pub const NOTHING: (f32, f32) = (0.0, 0.0);

    pub fn new(axes: StickAxes, threshold: f32) -> Self {
        Self {
            x: normalize(axes.x),
            y: normalize(axes.y),
            threshold,
        }
    }

    pub fn from_state(state: &GamePadState, side: StickSide, threshold: f32) -> Self {
        let axes = match side {
            StickSide::Left => state.sticks.left,
            StickSide::Right => state.sticks.right,
        };
        Self::new(axes, threshold)
    }

    pub fn location(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Location scaled to a movement speed
    pub fn location_scaled(&self, speed: f32) -> (f32, f32) {
        (self.x * speed, self.y * speed)
    }

    pub fn is_centered(&self) -> bool {
        self.location() == Self::NOTHING
    }

    /// Dominant direction, if the stick is pushed past the threshold
    pub fn direction(&self) -> Option<FourDirection> {
        let (ax, ay) = (self.x.abs(), self.y.abs());
        if self.is_centered() || ax.max(ay) < self.threshold {
            return None;
        }
        if ax >= ay {
            Some(if self.x > 0.0 {
                FourDirection::East
            } else {
                FourDirection::West
            })
        } else {
            Some(if self.y > 0.0 {
                FourDirection::North
            } else {
                FourDirection::South
            })
        }
    }

    pub fn is(&self, direction: FourDirection) -> bool {
        self.direction() == Some(direction)
    }
}

// -32768 would land just past -1.0, clamp it
fn normalize(value: i16) -> f32 {
    (value as f32 / THUMBSTICK_MAX as f32).clamp(-1.0, 1.0)
}
