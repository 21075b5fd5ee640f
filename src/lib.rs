//! Gamepad polling bridge
//!
//! Reads XInput-style controllers through a backend and hands their state
//! across a native boundary as a flat 21-element `f32` vector. See
//! [`controller::schema`] for the layout.

pub mod config;
pub mod controller;
pub mod ffi;
pub mod input;

pub use config::{BridgeConfig, ConfigError};
pub use controller::{ConnectionError, GamePadConnection, GamePadState};
