//! Controller subsystem for gamepad state queries
//!
//! 1. [`schema`] - Layout of the flat 21-element state vector
//! 2. [`state`] - Tagged state and its vector encoding
//! 3. [`backend`] - Native gamepad backends (gilrs, mock)
//! 4. [`connection`] - Query/release interface with the error policy
//! 5. [`state_poller`] - Background polling task publishing snapshots
//! 6. [`controller_handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Backend ──► GamePadConnection ──► [f32; 21]
//!                               │
//!                               └──► StatePoller ──► watch::Receiver<PadSnapshot>
//! ```

pub mod backend;
pub mod connection;
pub mod controller_handle;
pub mod schema;
pub mod state;
pub mod state_poller;

pub use backend::{BackendError, GamepadBackend, GilrsBackend, MockBackend};
pub use connection::{ConnectionError, GamePadConnection};
pub use controller_handle::{ControllerError, ControllerHandle, ControllerSettings};
pub use schema::{Field, FieldKind, LENGTH};
pub use state::{Buttons, GamePadState, StateError, StickAxes, Sticks, Triggers};
pub use state_poller::{PadSnapshot, PollerError, PollerHandle, PollerSettings, StateSource};
