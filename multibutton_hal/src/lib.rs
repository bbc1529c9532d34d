//! # Multibutton HAL Library
//!
//! Binds three buttons to three LEDs on a known board and keeps them in
//! step: pressing a button lights its LED, releasing it turns the LED off.
//!
//! # Module Structure
//!
//! - [`binder`] - `PeripheralBinder`: acquisition, event routing, teardown
//! - [`routing`] - Button → LED route table
//! - [`host`] - Event loop draining the key event queue
//! - [`driver_registry`] - Backend factory registration
//! - [`drivers`] - Backend implementations (simulation, rppal)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     multibutton_hal                             │
//! │  ┌─────────────┐   KeyEvent   ┌──────────────┐                  │
//! │  │ Button      │─────────────►│  EventLoop   │                  │
//! │  │ drivers     │   (mpsc)     └──────┬───────┘                  │
//! │  └─────▲───────┘                     │ dispatch                 │
//! │        │                             ▼                          │
//! │        │ register        ┌─────────────────────┐   PinTable     │
//! │        └─────────────────│  PeripheralBinder   │◄── (common)    │
//! │                          └──────────┬──────────┘                │
//! │                                     │ open / write / close      │
//! │                          ┌──────────▼──────────┐                │
//! │                          │ PeripheralManager   │ (trait object) │
//! │                          └─────────────────────┘                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod binder;
pub mod driver_registry;
pub mod drivers;
pub mod host;
pub mod routing;

// Re-export key types for convenience
pub use crate::binder::{BinderError, BinderPhase, LedState, PeripheralBinder, StartReport};
pub use crate::driver_registry::DriverRegistry;
pub use crate::host::{EventLoop, LoopStats};
pub use crate::routing::RouteTable;
