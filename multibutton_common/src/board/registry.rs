//! Board pin registry: board × role → physical pin name.
//!
//! The reference mapping is a static table; [`pin_for`] is a pure lookup
//! over it. [`PinTable`] is the owned, data-driven form used at startup so
//! that a TOML override table can be layered on top of the builtin one.
//! Immutable after construction.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use super::config::PinTableConfig;
use super::role::PinRole;

// ─── Reference Table ────────────────────────────────────────────────

/// Raspberry Pi 3.
pub const BOARD_RPI3: &str = "rpi3";
/// NXP i.MX6UL PICO.
pub const BOARD_IMX6UL_PICO: &str = "imx6ul_pico";
/// NXP i.MX7D PICO.
pub const BOARD_IMX7D_PICO: &str = "imx7d_pico";

/// Pins in [`PinRole::ALL`] order: Led1, Led2, Led3, Button1, Button2, Button3.
type RolePins = [&'static str; 6];

static REFERENCE_TABLE: [(&str, RolePins); 3] = [
    (
        BOARD_RPI3,
        ["BCM6", "BCM19", "BCM26", "BCM21", "BCM20", "BCM16"],
    ),
    (
        BOARD_IMX6UL_PICO,
        [
            "GPIO4_IO22",
            "GPIO4_IO22",
            "GPIO4_IO22",
            "GPIO2_IO03",
            "GPIO2_IO03",
            "GPIO2_IO03",
        ],
    ),
    (
        BOARD_IMX7D_PICO,
        [
            "GPIO2_IO02",
            "GPIO2_IO00",
            "GPIO2_IO05",
            "GPIO6_IO14",
            "GPIO6_IO15",
            "GPIO6_IO07",
        ],
    ),
];

fn role_index(role: PinRole) -> usize {
    match role {
        PinRole::Led1 => 0,
        PinRole::Led2 => 1,
        PinRole::Led3 => 2,
        PinRole::Button1 => 3,
        PinRole::Button2 => 4,
        PinRole::Button3 => 5,
    }
}

/// Identifiers of the boards in the reference table.
pub fn supported_boards() -> impl Iterator<Item = &'static str> {
    REFERENCE_TABLE.iter().map(|(board, _)| *board)
}

/// Pure lookup of `role` on `board` in the reference table.
///
/// # Errors
/// `RegistryError::UnsupportedBoard` if `board` is not a reference board.
pub fn pin_for(board: &str, role: PinRole) -> Result<&'static str, RegistryError> {
    REFERENCE_TABLE
        .iter()
        .find(|(id, _)| *id == board)
        .map(|(_, pins)| pins[role_index(role)])
        .ok_or_else(|| RegistryError::UnsupportedBoard {
            board: board.to_string(),
        })
}

// ─── Error Types ────────────────────────────────────────────────────

/// Pin registry error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The board has no pin mapping. Never defaulted: a wrong pin risks
    /// driving an unintended line.
    #[error("unsupported board '{board}'")]
    UnsupportedBoard { board: String },

    /// A board in a pin table does not name every role.
    #[error("board '{board}' is missing a pin for role {role}")]
    MissingRole { board: String, role: PinRole },

    /// A role is mapped to an empty pin name.
    #[error("board '{board}' maps role {role} to an empty pin name")]
    EmptyPin { board: String, role: PinRole },

    /// A board section names the same role twice (e.g. `Led1` and `led1`).
    #[error("board '{board}' maps role {role} more than once")]
    DuplicateRole { board: String, role: PinRole },

    /// A pin table names a role that does not exist.
    #[error("board '{board}': {error}")]
    UnknownRole { board: String, error: String },

    /// The pin table could not be read or parsed.
    #[error("pin table parse error: {0}")]
    Parse(String),
}

// ─── BoardProfile / PinBinding ──────────────────────────────────────

/// Hardware variant identifier. Only used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardProfile(String);

impl BoardProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoardProfile {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Resolved (role, pin) pair. Produced once per role at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PinBinding {
    role: PinRole,
    pin: String,
}

impl PinBinding {
    pub fn role(&self) -> PinRole {
        self.role
    }

    /// Physical pin identifier (never empty).
    pub fn pin(&self) -> &str {
        &self.pin
    }
}

impl fmt::Display for PinBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.role, self.pin)
    }
}

// ─── PinTable ───────────────────────────────────────────────────────

/// Owned board → role → pin table.
///
/// Every board entry names all six roles with non-empty pins; this is
/// checked on construction so `resolve()` can only fail for unknown boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTable {
    boards: BTreeMap<String, BTreeMap<PinRole, String>>,
}

impl PinTable {
    /// Table equal to the static reference table.
    pub fn builtin() -> Self {
        let boards = REFERENCE_TABLE
            .iter()
            .map(|(board, pins)| {
                let roles = PinRole::ALL
                    .iter()
                    .map(|role| (*role, pins[role_index(*role)].to_string()))
                    .collect();
                (board.to_string(), roles)
            })
            .collect();
        Self { boards }
    }

    /// Build a table from a parsed TOML pin table, validating every board.
    pub fn from_config(config: &PinTableConfig) -> Result<Self, RegistryError> {
        let mut boards = BTreeMap::new();

        for (board, entries) in &config.boards {
            let mut roles = BTreeMap::new();
            for (role_str, pin) in entries {
                let role: PinRole = role_str.parse().map_err(|error| RegistryError::UnknownRole {
                    board: board.clone(),
                    error,
                })?;
                let pin = pin.trim();
                if pin.is_empty() {
                    return Err(RegistryError::EmptyPin {
                        board: board.clone(),
                        role,
                    });
                }
                if roles.insert(role, pin.to_string()).is_some() {
                    return Err(RegistryError::DuplicateRole {
                        board: board.clone(),
                        role,
                    });
                }
            }

            if let Some(role) = PinRole::ALL.iter().find(|r| !roles.contains_key(r)) {
                return Err(RegistryError::MissingRole {
                    board: board.clone(),
                    role: *role,
                });
            }

            warn_shared_pins(board, &roles);
            boards.insert(board.clone(), roles);
        }

        Ok(Self { boards })
    }

    /// Parse a pin table from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, RegistryError> {
        let config = PinTableConfig::from_toml(content)?;
        Self::from_config(&config)
    }

    /// Load a pin table file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Parse(format!("failed to read {path:?}: {e}")))?;
        Self::from_toml(&content)
    }

    /// Overlay `other` onto this table. Boards present in both take
    /// `other`'s mapping.
    pub fn merge(mut self, other: PinTable) -> Self {
        for (board, roles) in other.boards {
            if self.boards.insert(board.clone(), roles).is_some() {
                debug!("Pin table overrides board '{board}'");
            }
        }
        self
    }

    /// Known board identifiers, sorted.
    pub fn boards(&self) -> impl Iterator<Item = &str> {
        self.boards.keys().map(String::as_str)
    }

    pub fn supports(&self, board: &BoardProfile) -> bool {
        self.boards.contains_key(board.id())
    }

    /// Resolve one role on `board`.
    ///
    /// # Errors
    /// `RegistryError::UnsupportedBoard` if the board is not in the table.
    pub fn resolve(&self, board: &BoardProfile, role: PinRole) -> Result<PinBinding, RegistryError> {
        let roles = self
            .boards
            .get(board.id())
            .ok_or_else(|| RegistryError::UnsupportedBoard {
                board: board.id().to_string(),
            })?;
        let pin = roles.get(&role).ok_or_else(|| RegistryError::MissingRole {
            board: board.id().to_string(),
            role,
        })?;
        Ok(PinBinding {
            role,
            pin: pin.clone(),
        })
    }

    /// Resolve every role on `board`, in [`PinRole::ALL`] order.
    pub fn resolve_all(&self, board: &BoardProfile) -> Result<Vec<PinBinding>, RegistryError> {
        PinRole::ALL
            .iter()
            .map(|role| self.resolve(board, *role))
            .collect()
    }
}

impl Default for PinTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn warn_shared_pins(board: &str, roles: &BTreeMap<PinRole, String>) {
    let mut seen: BTreeMap<&str, PinRole> = BTreeMap::new();
    for (role, pin) in roles {
        if let Some(first) = seen.insert(pin.as_str(), *role) {
            warn!("Board '{board}': pin {pin} shared by {first} and {role}");
        }
    }
}
