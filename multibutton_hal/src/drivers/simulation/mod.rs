//! Simulation driver module.
//!
//! Software GPIO controller for development and testing without a board.
//! Fault injection hooks let tests exercise every partial-failure path of
//! the binder.

mod board;
mod driver;

pub use board::{PinWrite, SimulatedBoard};
pub use driver::SimulationManager;

use multibutton_common::gpio::driver::{DriverOptions, IoError, PeripheralManager};

/// Factory function to create a simulation manager on a fresh board.
pub fn create_driver(_options: &DriverOptions) -> Result<Box<dyn PeripheralManager>, IoError> {
    Ok(Box::new(SimulationManager::default()))
}
