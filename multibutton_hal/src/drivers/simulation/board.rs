//! Simulated GPIO controller.
//!
//! `SimulatedBoard` is a cheap-to-clone handle onto shared pin state. The
//! simulation manager opens lines through it; tests and the interactive
//! CLI hold another clone to press buttons, inject faults and inspect the
//! write log.

use multibutton_common::board::role::{KeyCode, LogicState};
use multibutton_common::gpio::driver::{IoError, KeyEvent, KeyEventSink};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// One recorded `set_value` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinWrite {
    pub pin: String,
    pub value: bool,
}

/// Button input line state.
#[derive(Debug)]
struct SimInput {
    logic: LogicState,
    code: KeyCode,
    level: bool,
    sink: Option<KeyEventSink>,
}

/// Pins on which the next matching operation fails.
#[derive(Debug, Default)]
struct Faults {
    open: HashSet<String>,
    direction: HashSet<String>,
    write: HashSet<String>,
    close: HashSet<String>,
    button: HashSet<String>,
    register: HashSet<String>,
}

#[derive(Debug, Default)]
struct SimState {
    /// Pins currently held by a line or a button driver.
    open: HashSet<String>,
    /// Output levels.
    levels: HashMap<String, bool>,
    writes: Vec<PinWrite>,
    closes: Vec<String>,
    inputs: HashMap<String, SimInput>,
    faults: Faults,
}

/// Shared handle onto the simulated controller.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Fault injection ────────────────────────────────────────────

    /// Opening `pin` as an output fails.
    pub fn fail_open(&self, pin: &str) {
        self.lock().faults.open.insert(pin.to_string());
    }

    /// Configuring `pin` as an output fails after it opened.
    pub fn fail_direction(&self, pin: &str) {
        self.lock().faults.direction.insert(pin.to_string());
    }

    /// Writes to `pin` fail until [`Self::clear_faults`].
    pub fn fail_write(&self, pin: &str) {
        self.lock().faults.write.insert(pin.to_string());
    }

    /// Closing `pin` (output or button) fails.
    pub fn fail_close(&self, pin: &str) {
        self.lock().faults.close.insert(pin.to_string());
    }

    /// Creating a button driver on `pin` fails.
    pub fn fail_button(&self, pin: &str) {
        self.lock().faults.button.insert(pin.to_string());
    }

    /// Registering the button driver on `pin` fails after it was created.
    pub fn fail_register(&self, pin: &str) {
        self.lock().faults.register.insert(pin.to_string());
    }

    pub fn clear_faults(&self) {
        self.lock().faults = Faults::default();
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Every `set_value` call that reached the line, in order.
    pub fn writes(&self) -> Vec<PinWrite> {
        self.lock().writes.clone()
    }

    /// Values written to `pin`, in order.
    pub fn writes_to(&self, pin: &str) -> Vec<bool> {
        self.lock()
            .writes
            .iter()
            .filter(|w| w.pin == pin)
            .map(|w| w.value)
            .collect()
    }

    /// Every close attempt (outputs and buttons), in order.
    pub fn closes(&self) -> Vec<String> {
        self.lock().closes.clone()
    }

    /// Current output level of `pin`, if it was ever configured.
    pub fn level(&self, pin: &str) -> Option<bool> {
        self.lock().levels.get(pin).copied()
    }

    pub fn is_open(&self, pin: &str) -> bool {
        self.lock().open.contains(pin)
    }

    /// True while a button driver on `pin` delivers events.
    pub fn is_registered(&self, pin: &str) -> bool {
        self.lock()
            .inputs
            .get(pin)
            .is_some_and(|input| input.sink.is_some())
    }

    // ─── Stimulus ───────────────────────────────────────────────────

    /// Physically press the button on `pin`. Returns true if an event was
    /// delivered.
    pub fn press(&self, pin: &str) -> bool {
        self.set_pressed(pin, true)
    }

    /// Physically release the button on `pin`.
    pub fn release(&self, pin: &str) -> bool {
        self.set_pressed(pin, false)
    }

    fn set_pressed(&self, pin: &str, pressed: bool) -> bool {
        let level = match self.lock().inputs.get(pin) {
            Some(input) => input.logic.level_for(pressed),
            None => return false,
        };
        self.set_input_level(pin, level)
    }

    /// Drive the raw level of an input line. Emits a key event only when
    /// the pressed state changes and the driver is registered.
    pub fn set_input_level(&self, pin: &str, level: bool) -> bool {
        let mut state = self.lock();
        let Some(input) = state.inputs.get_mut(pin) else {
            debug!("No button on simulated pin {pin}");
            return false;
        };

        let was_pressed = input.logic.is_pressed(input.level);
        input.level = level;
        let pressed = input.logic.is_pressed(level);
        if pressed == was_pressed {
            return false;
        }

        let Some(sink) = input.sink.as_ref() else {
            trace!("Pin {pin} changed while unregistered");
            return false;
        };
        let event = if pressed {
            KeyEvent::down(input.code)
        } else {
            KeyEvent::up(input.code)
        };
        match sink.send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!("Event sink for pin {pin} is gone");
                false
            }
        }
    }

    // ─── Driver side ────────────────────────────────────────────────

    pub(super) fn open_output(&self, pin: &str) -> Result<(), IoError> {
        let mut state = self.lock();
        claim(&mut state, pin, |faults| &faults.open).map_err(|reason| IoError::Open {
            pin: pin.to_string(),
            reason,
        })
    }

    pub(super) fn configure(&self, pin: &str, level: bool) -> Result<(), IoError> {
        let mut state = self.lock();
        if !state.open.contains(pin) {
            return Err(IoError::Closed(pin.to_string()));
        }
        if state.faults.direction.contains(pin) {
            return Err(IoError::Direction {
                pin: pin.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        state.levels.insert(pin.to_string(), level);
        Ok(())
    }

    pub(super) fn write(&self, pin: &str, value: bool) -> Result<(), IoError> {
        let mut state = self.lock();
        if !state.open.contains(pin) {
            return Err(IoError::Closed(pin.to_string()));
        }
        if state.faults.write.contains(pin) {
            return Err(IoError::Write {
                pin: pin.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        state.levels.insert(pin.to_string(), value);
        state.writes.push(PinWrite {
            pin: pin.to_string(),
            value,
        });
        Ok(())
    }

    pub(super) fn close(&self, pin: &str) -> Result<(), IoError> {
        let mut state = self.lock();
        state.closes.push(pin.to_string());
        if state.faults.close.contains(pin) {
            return Err(IoError::Close {
                pin: pin.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        state.open.remove(pin);
        state.inputs.remove(pin);
        Ok(())
    }

    pub(super) fn create_input(
        &self,
        pin: &str,
        logic: LogicState,
        code: KeyCode,
    ) -> Result<(), IoError> {
        let mut state = self.lock();
        claim(&mut state, pin, |faults| &faults.button).map_err(|reason| IoError::Button {
            pin: pin.to_string(),
            reason,
        })?;
        state.inputs.insert(
            pin.to_string(),
            SimInput {
                logic,
                code,
                level: logic.level_for(false),
                sink: None,
            },
        );
        Ok(())
    }

    pub(super) fn set_sink(&self, pin: &str, sink: Option<KeyEventSink>) -> Result<(), IoError> {
        let mut state = self.lock();
        if sink.is_some() && state.faults.register.contains(pin) {
            return Err(IoError::Button {
                pin: pin.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        let input = state
            .inputs
            .get_mut(pin)
            .ok_or_else(|| IoError::Closed(pin.to_string()))?;
        input.sink = sink;
        Ok(())
    }
}

/// Mark `pin` as held unless it is busy or carries an injected fault.
fn claim(
    state: &mut SimState,
    pin: &str,
    fault: impl Fn(&Faults) -> &HashSet<String>,
) -> Result<(), String> {
    if fault(&state.faults).contains(pin) {
        return Err("injected fault".to_string());
    }
    if !state.open.insert(pin.to_string()) {
        return Err("pin busy".to_string());
    }
    Ok(())
}
