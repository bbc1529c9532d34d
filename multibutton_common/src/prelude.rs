//! Prelude module for common re-exports.
//!
//! ```rust
//! use multibutton_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{AppConfig, ConfigError, ConfigLoader, RouteConfig, SharedConfig};

// ─── Board Registry ─────────────────────────────────────────────────
pub use crate::board::registry::{BoardProfile, PinBinding, PinTable, RegistryError, pin_for};
pub use crate::board::role::{KeyCode, LogicState, PinRole};

// ─── Peripherals ────────────────────────────────────────────────────
pub use crate::gpio::driver::{
    ButtonInputDriver, Direction, DriverFactory, DriverOptions, GpioLine, IoError, KeyAction,
    KeyEvent, KeyEventSink, PeripheralManager,
};
