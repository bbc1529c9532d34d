//! Board pin registry and role-based pin lookup.
//!
//! Logical device roles ([`role::PinRole`]) are resolved against a board
//! identifier into physical pin names. The builtin reference table can be
//! overlaid at startup with a TOML table ([`config::PinTableConfig`]).

pub mod config;
pub mod registry;
pub mod role;
