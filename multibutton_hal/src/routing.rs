//! Button → LED route table.
//!
//! Built once from the configured routes. Lookups are by key code (event
//! routing) or by role (startup wiring).

use multibutton_common::board::role::{KeyCode, PinRole};
use multibutton_common::config::{ConfigError, RouteConfig, default_routes, validate_routes};

/// Immutable route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    /// Routes are kept in the given order; it is also the acquisition order.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if the list is empty, a route has its
    /// roles swapped, or a key, button or LED is used by two routes.
    pub fn new(routes: Vec<RouteConfig>) -> Result<Self, ConfigError> {
        validate_routes(&routes)?;
        Ok(Self { routes })
    }

    /// Route for the key code a button emits.
    pub fn by_key(&self, code: KeyCode) -> Option<&RouteConfig> {
        self.routes.iter().find(|route| route.key == code)
    }

    /// Route driven by `button`.
    pub fn by_button(&self, button: PinRole) -> Option<&RouteConfig> {
        self.routes.iter().find(|route| route.button == button)
    }

    /// LED roles in route order.
    pub fn leds(&self) -> impl Iterator<Item = PinRole> + '_ {
        self.routes.iter().map(|route| route.led)
    }

    /// Button roles in route order.
    pub fn buttons(&self) -> impl Iterator<Item = PinRole> + '_ {
        self.routes.iter().map(|route| route.button)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteConfig> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: default_routes(),
        }
    }
}
