//! Peripheral collaborator interfaces.
//!
//! GPIO backends (simulation, Raspberry Pi, ...) implement these traits;
//! the binder only talks to them through trait objects.

pub mod driver;
