//! Peripheral backend implementations.
//!
//! - [`simulation`] - Software GPIO controller for development and testing
//! - `rpi` - Raspberry Pi GPIO through `rppal` (feature `rppal`)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `PeripheralManager` from `multibutton_common::gpio::driver`
//! 3. Register its factory in [`register_all_drivers`]

#[cfg(feature = "rppal")]
pub mod rpi;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register every built-in backend.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);

    #[cfg(feature = "rppal")]
    registry.register("rppal", rpi::create_driver);
}
