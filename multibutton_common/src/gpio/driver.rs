//! Peripheral driver traits and error types.
//!
//! This module defines:
//! - `PeripheralManager` trait - Opens GPIO lines and creates button drivers
//! - `GpioLine` trait - An exclusively owned, open output pin
//! - `ButtonInputDriver` trait - Interrupt-to-key-event translation for one button
//! - `IoError` enum - Error types for peripheral operations
//! - `DriverFactory` type alias - Factory function type

use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;

use crate::board::role::{KeyCode, LogicState};
use crate::consts::DEFAULT_DEBOUNCE_MS;

/// Error types for peripheral operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// The pin could not be opened (unknown, busy, permission).
    #[error("Failed to open pin {pin}: {reason}")]
    Open { pin: String, reason: String },

    /// The pin direction could not be configured.
    #[error("Failed to configure pin {pin}: {reason}")]
    Direction { pin: String, reason: String },

    /// Writing the output level failed.
    #[error("Failed to write pin {pin}: {reason}")]
    Write { pin: String, reason: String },

    /// Releasing the pin failed.
    #[error("Failed to close pin {pin}: {reason}")]
    Close { pin: String, reason: String },

    /// Button driver setup or registration failed.
    #[error("Button driver error on pin {pin}: {reason}")]
    Button { pin: String, reason: String },

    /// The handle was already closed.
    #[error("Pin {0} is closed")]
    Closed(String),

    /// Driver not found in the registry.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Backend-level failure (e.g. GPIO chip unavailable).
    #[error("Driver error: {0}")]
    Driver(String),
}

/// Output line direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Output, driven low on configuration.
    OutInitiallyLow,
    /// Output, driven high on configuration.
    OutInitiallyHigh,
}

impl Direction {
    /// Level applied when the direction is set.
    pub fn initial_level(&self) -> bool {
        matches!(self, Self::OutInitiallyHigh)
    }
}

// ─── Key Events ─────────────────────────────────────────────────────

/// Press (`Down`) or release (`Up`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Down,
    Up,
}

/// Discrete key event emitted by a button driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Down,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
        }
    }
}

/// Host-owned queue that button drivers deliver key events into.
pub type KeyEventSink = Sender<KeyEvent>;

// ─── Traits ─────────────────────────────────────────────────────────

/// An open output pin, exclusively owned by whoever opened it.
///
/// `close()` must be called exactly once; every other call after it
/// returns `IoError::Closed`.
pub trait GpioLine: Send {
    /// Physical pin identifier.
    fn pin(&self) -> &str;

    /// Configure the line as an output.
    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError>;

    /// Drive the line high (`true`) or low (`false`).
    fn set_value(&mut self, value: bool) -> Result<(), IoError>;

    /// Release the line.
    fn close(&mut self) -> Result<(), IoError>;
}

/// Debounced button input that emits key events on press / release.
///
/// # Lifecycle
///
/// 1. `register()` - start delivering events into the sink
/// 2. `unregister()` - stop delivering events
/// 3. `close()` - release the input line
pub trait ButtonInputDriver: Send {
    /// Physical pin identifier.
    fn pin(&self) -> &str;

    /// Code carried by every event this driver emits.
    fn key_code(&self) -> KeyCode;

    /// Start delivering press/release transitions into `sink`.
    fn register(&mut self, sink: KeyEventSink) -> Result<(), IoError>;

    /// Stop delivering events. No-op when not registered.
    fn unregister(&mut self);

    /// Release the input line.
    fn close(&mut self) -> Result<(), IoError>;
}

/// Backend that owns the board's GPIO controller.
pub trait PeripheralManager: Send {
    /// Backend identifier (e.g., "simulation", "rppal").
    fn name(&self) -> &'static str;

    /// Open `pin` for output.
    fn open_gpio(&mut self, pin: &str) -> Result<Box<dyn GpioLine>, IoError>;

    /// Create a button driver on `pin`.
    fn create_button_driver(
        &mut self,
        pin: &str,
        logic: LogicState,
        code: KeyCode,
        debounce: Duration,
    ) -> Result<Box<dyn ButtonInputDriver>, IoError>;
}

/// Options passed to driver factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Default debounce for button drivers.
    pub debounce: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Factory function type for creating peripheral managers.
pub type DriverFactory = fn(&DriverOptions) -> Result<Box<dyn PeripheralManager>, IoError>;
