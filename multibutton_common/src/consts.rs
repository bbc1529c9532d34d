//! Workspace-wide defaults.
//!
//! Single source of truth for default paths, names and timings.

/// Canonical service name (used for logging).
pub const SERVICE_NAME: &str = "multibutton";

/// Default application configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/multibutton/multibutton.toml";

/// Environment variable holding the board identifier.
pub const BOARD_ENV_VAR: &str = "MULTIBUTTON_BOARD";

/// Default button debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Poll interval of the host event loop in milliseconds.
pub const EVENT_POLL_MS: u64 = 50;
