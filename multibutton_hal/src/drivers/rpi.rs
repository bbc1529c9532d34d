//! Raspberry Pi backend over `rppal`.
//!
//! Pin names use the Broadcom numbering of the builtin `rpi3` table
//! (`BCM<n>`). Buttons are pulled inputs with an async interrupt on both
//! edges; rppal applies the debounce and calls back on its own thread.

use multibutton_common::board::role::{KeyCode, LogicState};
use multibutton_common::gpio::driver::{
    ButtonInputDriver, Direction, DriverOptions, GpioLine, IoError, KeyEvent, KeyEventSink,
    PeripheralManager,
};
use rppal::gpio::{Event, Gpio, InputPin, Level, OutputPin, Trigger};
use std::time::Duration;
use tracing::{debug, trace};

/// Factory function for the rppal backend.
pub fn create_driver(_options: &DriverOptions) -> Result<Box<dyn PeripheralManager>, IoError> {
    let gpio = Gpio::new().map_err(|e| IoError::Driver(e.to_string()))?;
    Ok(Box::new(RpiManager { gpio }))
}

/// Parse `BCM<n>` (or a bare number) into a Broadcom GPIO number.
pub fn parse_bcm(pin: &str) -> Option<u8> {
    let digits = pin
        .strip_prefix("BCM")
        .or_else(|| pin.strip_prefix("bcm"))
        .unwrap_or(pin);
    digits.parse().ok()
}

fn level(value: bool) -> Level {
    if value { Level::High } else { Level::Low }
}

/// Owns the `/dev/gpiomem` mapping.
pub struct RpiManager {
    gpio: Gpio,
}

impl RpiManager {
    fn bcm(&self, pin: &str) -> Result<u8, IoError> {
        parse_bcm(pin).ok_or_else(|| IoError::Open {
            pin: pin.to_string(),
            reason: "expected BCM<n>".to_string(),
        })
    }
}

impl PeripheralManager for RpiManager {
    fn name(&self) -> &'static str {
        "rppal"
    }

    fn open_gpio(&mut self, pin: &str) -> Result<Box<dyn GpioLine>, IoError> {
        let bcm = self.bcm(pin)?;
        let handle = self.gpio.get(bcm).map_err(|e| IoError::Open {
            pin: pin.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(RpiLine {
            pin: pin.to_string(),
            handle: Some(handle.into_output_low()),
        }))
    }

    fn create_button_driver(
        &mut self,
        pin: &str,
        logic: LogicState,
        code: KeyCode,
        debounce: Duration,
    ) -> Result<Box<dyn ButtonInputDriver>, IoError> {
        let bcm = self.bcm(pin)?;
        let handle = self.gpio.get(bcm).map_err(|e| IoError::Button {
            pin: pin.to_string(),
            reason: e.to_string(),
        })?;
        let input = match logic {
            LogicState::ActiveLow => handle.into_input_pullup(),
            LogicState::ActiveHigh => handle.into_input_pulldown(),
        };
        debug!("{pin}: input {logic:?}, debounce {debounce:?}");
        Ok(Box::new(RpiButton {
            pin: pin.to_string(),
            code,
            logic,
            debounce,
            input: Some(input),
        }))
    }
}

struct RpiLine {
    pin: String,
    handle: Option<OutputPin>,
}

impl RpiLine {
    fn handle(&mut self) -> Result<&mut OutputPin, IoError> {
        self.handle
            .as_mut()
            .ok_or_else(|| IoError::Closed(self.pin.clone()))
    }
}

impl GpioLine for RpiLine {
    fn pin(&self) -> &str {
        &self.pin
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
        let initial = level(direction.initial_level());
        self.handle()?.write(initial);
        Ok(())
    }

    fn set_value(&mut self, value: bool) -> Result<(), IoError> {
        trace!("{} <- {value}", self.pin);
        self.handle()?.write(level(value));
        Ok(())
    }

    fn close(&mut self) -> Result<(), IoError> {
        // Dropping the pin restores its previous mode.
        self.handle
            .take()
            .map(drop)
            .ok_or_else(|| IoError::Closed(self.pin.clone()))
    }
}

struct RpiButton {
    pin: String,
    code: KeyCode,
    logic: LogicState,
    debounce: Duration,
    input: Option<InputPin>,
}

impl ButtonInputDriver for RpiButton {
    fn pin(&self) -> &str {
        &self.pin
    }

    fn key_code(&self) -> KeyCode {
        self.code
    }

    fn register(&mut self, sink: KeyEventSink) -> Result<(), IoError> {
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| IoError::Closed(self.pin.clone()))?;
        let (code, logic) = (self.code, self.logic);

        input
            .set_async_interrupt(Trigger::Both, Some(self.debounce), move |event: Event| {
                let high = match event.trigger {
                    Trigger::RisingEdge => true,
                    Trigger::FallingEdge => false,
                    _ => return,
                };
                let key = if logic.is_pressed(high) {
                    KeyEvent::down(code)
                } else {
                    KeyEvent::up(code)
                };
                // Host loop gone; nothing left to deliver to.
                let _ = sink.send(key);
            })
            .map_err(|e| IoError::Button {
                pin: self.pin.clone(),
                reason: e.to_string(),
            })
    }

    fn unregister(&mut self) {
        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input.clear_async_interrupt() {
                debug!("{}: {e}", self.pin);
            }
        }
    }

    fn close(&mut self) -> Result<(), IoError> {
        self.input
            .take()
            .map(drop)
            .ok_or_else(|| IoError::Closed(self.pin.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcm_names() {
        assert_eq!(parse_bcm("BCM6"), Some(6));
        assert_eq!(parse_bcm("bcm21"), Some(21));
        assert_eq!(parse_bcm("16"), Some(16));
        assert_eq!(parse_bcm("GPIO2_IO03"), None);
        assert_eq!(parse_bcm("BCM"), None);
    }
}
