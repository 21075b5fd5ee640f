use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use super::{BackendError, GamepadBackend};
use crate::controller::schema::{THUMBSTICK_MAX, THUMBSTICK_MIN, TRIGGER_MAX};
use crate::controller::state::{Buttons, GamePadState, StickAxes, Sticks, Triggers};

// Gilrs backend settings
#[derive(Clone, Debug)]
pub struct GilrsSettings {
    pub max_slots: usize,
    pub stick_deadzone: f32,
}

impl Default for GilrsSettings {
    fn default() -> Self {
        Self {
            max_slots: super::DEFAULT_MAX_SLOTS,
            stick_deadzone: 0.05,
        }
    }
}

/// Fixed-size slot assignment, XInput style
///
/// A device keeps its slot until it disconnects; a new device takes the lowest
/// free slot.
#[derive(Debug, Clone)]
pub struct SlotTable<K> {
    slots: Vec<Option<K>>,
}

impl<K: Copy + Eq> SlotTable<K> {
    pub fn new(max_slots: usize) -> Self {
        Self {
            slots: vec![None; max_slots],
        }
    }

    /// Assign `id` to the lowest free slot. Returns the slot, or `None` when
    /// every slot is taken. An id that is already seated keeps its slot.
    pub fn attach(&mut self, id: K) -> Option<usize> {
        if let Some(slot) = self.slot_of(id) {
            return Some(slot);
        }
        let free = self.slots.iter().position(Option::is_none)?;
        self.slots[free] = Some(id);
        Some(free)
    }

    pub fn detach(&mut self, id: K) -> Option<usize> {
        let slot = self.slot_of(id)?;
        self.slots[slot] = None;
        Some(slot)
    }

    pub fn slot_of(&self, id: K) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(id))
    }

    pub fn get(&self, slot: usize) -> Option<K> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Backend reading real controllers through gilrs
pub struct GilrsBackend {
    gilrs: Option<Gilrs>,
    slots: SlotTable<GamepadId>,
    settings: GilrsSettings,
}

impl GilrsBackend {
    pub fn new(settings: Option<GilrsSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating gilrs backend with settings: {:?}", settings);
        Self {
            gilrs: None,
            slots: SlotTable::new(settings.max_slots),
            settings,
        }
    }

    // Drain pending gilrs events so cached state and slot assignment stay current
    fn pump_events(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };

        while let Some(Event { id, event, .. }) = gilrs.next_event() {
            match event {
                EventType::Connected => match self.slots.attach(id) {
                    Some(slot) => info!("Gamepad {} connected on slot {}", id, slot),
                    None => warn!("Gamepad {} connected but every slot is taken", id),
                },
                EventType::Disconnected => {
                    if let Some(slot) = self.slots.detach(id) {
                        warn!("Gamepad {} disconnected from slot {}", id, slot);
                    }
                }
                _ => {}
            }
        }
    }

    fn snapshot(&self, gamepad: &Gamepad<'_>) -> GamePadState {
        let deadzone = self.settings.stick_deadzone;
        let axis = |axis: Axis| stick_to_native(apply_deadzone(gamepad.value(axis), deadzone));
        let trigger = |button: Button, fallback: Axis| {
            let value = gamepad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or_else(|| gamepad.value(fallback));
            trigger_to_native(value)
        };
        let btn = |button: Button| gamepad.is_pressed(button);

        GamePadState {
            buttons: Buttons {
                a: btn(Button::South),
                b: btn(Button::East),
                x: btn(Button::West),
                y: btn(Button::North),
                left_bumper: btn(Button::LeftTrigger),
                right_bumper: btn(Button::RightTrigger),
                left_stick: btn(Button::LeftThumb),
                right_stick: btn(Button::RightThumb),
                dpad_up: btn(Button::DPadUp),
                dpad_down: btn(Button::DPadDown),
                dpad_left: btn(Button::DPadLeft),
                dpad_right: btn(Button::DPadRight),
                start: btn(Button::Start),
                back: btn(Button::Select),
            },
            triggers: Triggers {
                left: trigger(Button::LeftTrigger2, Axis::LeftZ),
                right: trigger(Button::RightTrigger2, Axis::RightZ),
            },
            sticks: Sticks {
                left: StickAxes {
                    x: axis(Axis::LeftStickX),
                    y: axis(Axis::LeftStickY),
                },
                right: StickAxes {
                    x: axis(Axis::RightStickX),
                    y: axis(Axis::RightStickY),
                },
            },
            connected: true,
        }
    }
}

impl GamepadBackend for GilrsBackend {
    fn max_slots(&self) -> usize {
        self.settings.max_slots
    }

    fn open(&mut self) -> Result<(), BackendError> {
        if self.gilrs.is_some() {
            return Ok(());
        }

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(BackendError::OpenError(e.to_string()));
            }
        };

        self.slots.clear();
        {
            let gamepads: Vec<(GamepadId, Gamepad<'_>)> = gilrs.gamepads().collect();
            if gamepads.is_empty() {
                warn!("No gamepad connected, slots stay empty until one appears");
            } else {
                info!("Found {} gamepads:", gamepads.len());
                for (id, gamepad) in gamepads.iter() {
                    match self.slots.attach(*id) {
                        Some(slot) => info!(
                            "  [{}] ID: {}, Name: {}, UUID: {:?}",
                            slot,
                            id,
                            gamepad.name(),
                            gamepad.uuid()
                        ),
                        None => warn!("  No free slot for {} ({})", gamepad.name(), id),
                    }
                }
            }
        }

        self.gilrs = Some(gilrs);
        Ok(())
    }

    fn read(&mut self, slot: usize) -> Result<Option<GamePadState>, BackendError> {
        self.pump_events();

        let gilrs = self.gilrs.as_ref().ok_or(BackendError::NotOpen)?;
        let Some(id) = self.slots.get(slot) else {
            return Ok(None);
        };

        match gilrs.connected_gamepad(id) {
            Some(gamepad) => Ok(Some(self.snapshot(&gamepad))),
            None => {
                // Disconnect event not seen yet
                debug!("Gamepad {} on slot {} is gone", id, slot);
                Err(BackendError::ReadError {
                    slot,
                    reason: format!("gamepad {} no longer connected", id),
                })
            }
        }
    }

    fn release(&mut self) -> Result<(), BackendError> {
        if self.gilrs.take().is_some() {
            info!(
                "Releasing gilrs backend ({} slots occupied)",
                self.slots.occupied()
            );
        }
        self.slots.clear();
        Ok(())
    }
}

/// Rescale an analog value so the deadzone maps to zero and the rest of the
/// travel keeps its full range
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

/// `[-1, 1]` to native thumbstick units
pub fn stick_to_native(value: f32) -> i16 {
    let value = if value.is_finite() { value } else { 0.0 };
    let scaled = if value < 0.0 {
        value * -(THUMBSTICK_MIN as f32)
    } else {
        value * THUMBSTICK_MAX as f32
    };
    scaled
        .round()
        .clamp(THUMBSTICK_MIN as f32, THUMBSTICK_MAX as f32) as i16
}

/// `[0, 1]` to native trigger units
pub fn trigger_to_native(value: f32) -> u8 {
    let value = if value.is_finite() { value } else { 0.0 };
    (value.clamp(0.0, 1.0) * TRIGGER_MAX as f32).round() as u8
}
