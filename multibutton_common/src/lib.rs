//! Multibutton Common Library
//!
//! Shared types for the multibutton workspace: the board pin registry,
//! the peripheral collaborator traits implemented by GPIO backends, and
//! the TOML configuration loader.
//!
//! # Module Structure
//!
//! - [`board`] - Logical pin roles and the board → pin registry
//! - [`gpio`] - Peripheral I/O and button driver traits
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use multibutton_common::board::registry::pin_for;
//! use multibutton_common::board::role::PinRole;
//!
//! assert_eq!(pin_for("rpi3", PinRole::Led1).unwrap(), "BCM6");
//! ```

pub mod board;
pub mod config;
pub mod consts;
pub mod gpio;
pub mod prelude;
