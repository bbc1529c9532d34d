//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML application
//! configuration.
//!
//! # Usage
//!
//! ```rust,no_run
//! use multibutton_common::config::{AppConfig, ConfigError, ConfigLoader};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = AppConfig::load(Path::new("multibutton.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::board::role::{KeyCode, LogicState, PinRole};
use crate::consts::{DEFAULT_DEBOUNCE_MS, SERVICE_NAME};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "multibutton-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    SERVICE_NAME.to_string()
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[board]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    /// Board identifier; overridden by CLI / environment.
    #[serde(default)]
    pub id: Option<String>,

    /// Optional pin table merged over the builtin table. Relative paths
    /// resolve against the config file's directory.
    #[serde(default)]
    pub pin_table: Option<PathBuf>,
}

/// `[buttons]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonConfig {
    #[serde(default)]
    pub logic: LogicState,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            logic: LogicState::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// One `[[routes]]` entry: which button drives which LED, and the key
/// code the button emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub button: PinRole,
    pub led: PinRole,
    pub key: KeyCode,
}

/// Button1→Led1 (A), Button2→Led2 (B), Button3→Led3 (C).
pub fn default_routes() -> Vec<RouteConfig> {
    [KeyCode::A, KeyCode::B, KeyCode::C]
        .into_iter()
        .zip(PinRole::BUTTONS.into_iter().zip(PinRole::LEDS))
        .map(|(key, (button, led))| RouteConfig { button, led, key })
        .collect()
}

/// Check a route list: non-empty, `button` is a button role and `led` an
/// LED role, and every key, button and LED appears in at most one route.
pub fn validate_routes(routes: &[RouteConfig]) -> Result<(), ConfigError> {
    if routes.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one route is required".to_string(),
        ));
    }

    let mut keys = HashSet::new();
    let mut buttons = HashSet::new();
    let mut leds = HashSet::new();

    for route in routes {
        if !route.button.is_button() {
            return Err(ConfigError::ValidationError(format!(
                "route button '{}' is not a button role",
                route.button
            )));
        }
        if !route.led.is_led() {
            return Err(ConfigError::ValidationError(format!(
                "route led '{}' is not an LED role",
                route.led
            )));
        }
        if !keys.insert(route.key) {
            return Err(ConfigError::ValidationError(format!(
                "key {} is used by more than one route",
                route.key
            )));
        }
        if !buttons.insert(route.button) {
            return Err(ConfigError::ValidationError(format!(
                "button {} is used by more than one route",
                route.button
            )));
        }
        if !leds.insert(route.led) {
            return Err(ConfigError::ValidationError(format!(
                "led {} is used by more than one route",
                route.led
            )));
        }
    }

    Ok(())
}

/// Complete application configuration (`multibutton.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    #[serde(default)]
    pub board: BoardConfig,

    #[serde(default)]
    pub buttons: ButtonConfig,

    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            board: BoardConfig::default(),
            buttons: ButtonConfig::default(),
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `shared` is invalid
    /// - `routes` is empty
    /// - a route's `button` is not a button role or its `led` is not an LED role
    /// - a key, button or LED appears in more than one route
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        validate_routes(&self.routes)
    }

    /// Pin table path resolved against `config_dir`.
    pub fn pin_table_path(&self, config_dir: &Path) -> Option<PathBuf> {
        self.board.pin_table.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                config_dir.join(path)
            }
        })
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for any `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
