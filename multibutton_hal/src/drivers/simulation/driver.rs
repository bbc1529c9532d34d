//! Simulation peripheral manager.
//!
//! `SimulationManager` implements `PeripheralManager` on top of a
//! [`SimulatedBoard`], so the binder can run end to end without hardware.

use super::board::SimulatedBoard;
use multibutton_common::board::role::{KeyCode, LogicState};
use multibutton_common::gpio::driver::{
    ButtonInputDriver, Direction, GpioLine, IoError, KeyEventSink, PeripheralManager,
};
use std::time::Duration;
use tracing::{debug, trace};

/// Simulation backend implementing the PeripheralManager trait.
pub struct SimulationManager {
    board: SimulatedBoard,
}

impl SimulationManager {
    /// Create a manager driving `board`. Keep a clone of the board to
    /// stimulate inputs and inspect outputs.
    pub fn new(board: SimulatedBoard) -> Self {
        Self { board }
    }

    /// Handle onto the simulated controller.
    pub fn board(&self) -> &SimulatedBoard {
        &self.board
    }
}

impl Default for SimulationManager {
    fn default() -> Self {
        Self::new(SimulatedBoard::new())
    }
}

impl PeripheralManager for SimulationManager {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn open_gpio(&mut self, pin: &str) -> Result<Box<dyn GpioLine>, IoError> {
        self.board.open_output(pin)?;
        debug!("Simulated output {pin} opened");
        Ok(Box::new(SimLine {
            pin: pin.to_string(),
            board: self.board.clone(),
            closed: false,
        }))
    }

    fn create_button_driver(
        &mut self,
        pin: &str,
        logic: LogicState,
        code: KeyCode,
        debounce: Duration,
    ) -> Result<Box<dyn ButtonInputDriver>, IoError> {
        self.board.create_input(pin, logic, code)?;
        // Simulated presses are clean edges, debounce has nothing to filter.
        debug!("Simulated button {pin} created ({logic:?}, {code}, {debounce:?})");
        Ok(Box::new(SimButton {
            pin: pin.to_string(),
            code,
            board: self.board.clone(),
            registered: false,
            closed: false,
        }))
    }
}

/// Simulated output line.
struct SimLine {
    pin: String,
    board: SimulatedBoard,
    closed: bool,
}

impl SimLine {
    fn check_open(&self) -> Result<(), IoError> {
        if self.closed {
            return Err(IoError::Closed(self.pin.clone()));
        }
        Ok(())
    }
}

impl GpioLine for SimLine {
    fn pin(&self) -> &str {
        &self.pin
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
        self.check_open()?;
        self.board.configure(&self.pin, direction.initial_level())
    }

    fn set_value(&mut self, value: bool) -> Result<(), IoError> {
        self.check_open()?;
        trace!("{} <- {value}", self.pin);
        self.board.write(&self.pin, value)
    }

    fn close(&mut self) -> Result<(), IoError> {
        self.check_open()?;
        self.closed = true;
        self.board.close(&self.pin)
    }
}

/// Simulated button driver.
struct SimButton {
    pin: String,
    code: KeyCode,
    board: SimulatedBoard,
    registered: bool,
    closed: bool,
}

impl ButtonInputDriver for SimButton {
    fn pin(&self) -> &str {
        &self.pin
    }

    fn key_code(&self) -> KeyCode {
        self.code
    }

    fn register(&mut self, sink: KeyEventSink) -> Result<(), IoError> {
        if self.closed {
            return Err(IoError::Closed(self.pin.clone()));
        }
        self.board.set_sink(&self.pin, Some(sink))?;
        self.registered = true;
        Ok(())
    }

    fn unregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        if let Err(e) = self.board.set_sink(&self.pin, None) {
            debug!("Unregister {}: {e}", self.pin);
        }
    }

    fn close(&mut self) -> Result<(), IoError> {
        if self.closed {
            return Err(IoError::Closed(self.pin.clone()));
        }
        self.unregister();
        self.closed = true;
        self.board.close(&self.pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multibutton_common::gpio::driver::KeyEvent;
    use std::sync::mpsc;

    #[test]
    fn line_rejects_use_after_close() {
        let mut manager = SimulationManager::default();
        let mut line = manager.open_gpio("BCM6").unwrap();
        line.set_direction(Direction::OutInitiallyLow).unwrap();
        line.set_value(true).unwrap();
        line.close().unwrap();

        assert!(matches!(line.set_value(false), Err(IoError::Closed(_))));
        assert!(matches!(line.close(), Err(IoError::Closed(_))));
        assert_eq!(manager.board().closes(), vec!["BCM6".to_string()]);
    }

    #[test]
    fn direction_is_not_a_write() {
        let mut manager = SimulationManager::default();
        let mut line = manager.open_gpio("BCM6").unwrap();
        line.set_direction(Direction::OutInitiallyHigh).unwrap();
        assert_eq!(manager.board().level("BCM6"), Some(true));
        assert!(manager.board().writes().is_empty());
    }

    #[test]
    fn button_register_unregister() {
        let mut manager = SimulationManager::default();
        let board = manager.board().clone();
        let (tx, rx) = mpsc::channel();

        let mut button = manager
            .create_button_driver(
                "BCM21",
                LogicState::ActiveLow,
                KeyCode::A,
                Duration::from_millis(100),
            )
            .unwrap();
        assert_eq!(button.key_code(), KeyCode::A);

        button.register(tx).unwrap();
        assert!(board.press("BCM21"));
        assert_eq!(rx.try_recv().unwrap(), KeyEvent::down(KeyCode::A));

        button.unregister();
        assert!(!board.release("BCM21"));
        assert!(rx.try_recv().is_err());

        button.close().unwrap();
        assert!(!board.is_open("BCM21"));
    }

    #[test]
    fn busy_pin_cannot_be_reopened() {
        let mut manager = SimulationManager::default();
        let _line = manager.open_gpio("P").unwrap();
        assert!(matches!(manager.open_gpio("P"), Err(IoError::Open { .. })));
        assert!(
            manager
                .create_button_driver("P", LogicState::ActiveLow, KeyCode::A, Duration::ZERO)
                .is_err()
        );
    }
}
