//! Pin table configuration (`boards.toml`).
//!
//! Role names stay plain strings here; [`super::registry::PinTable`]
//! parses and validates them.
//!
//! ```toml
//! [boards.rpi3]
//! Led1 = "BCM6"
//! Led2 = "BCM19"
//! Led3 = "BCM26"
//! Button1 = "BCM21"
//! Button2 = "BCM20"
//! Button3 = "BCM16"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::registry::RegistryError;

/// Raw board → role name → pin name table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinTableConfig {
    #[serde(default)]
    pub boards: BTreeMap<String, BTreeMap<String, String>>,
}

impl PinTableConfig {
    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        toml::from_str(content).map_err(|e| RegistryError::Parse(e.to_string()))
    }
}
