//! Peripheral binder and key event router.
//!
//! `PeripheralBinder` resolves every routed role against the pin table,
//! acquires the LED outputs and button drivers through a
//! [`PeripheralManager`], and turns key events into LED writes.
//!
//! # Failure policy
//!
//! - An unknown board fails `start()` before anything is acquired.
//! - Per-role I/O failures are logged; the role stays unbound and the
//!   remaining roles are still attempted.
//! - LED write failures are logged and dropped.
//! - Release failures are logged and teardown continues.

use multibutton_common::board::registry::{BoardProfile, PinBinding, PinTable, RegistryError};
use multibutton_common::board::role::{KeyCode, LogicState, PinRole};
use multibutton_common::consts::DEFAULT_DEBOUNCE_MS;
use multibutton_common::gpio::driver::{
    ButtonInputDriver, Direction, GpioLine, KeyAction, KeyEvent, KeyEventSink, PeripheralManager,
};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::routing::RouteTable;

/// Binder lifecycle errors.
#[derive(Debug, Error)]
pub enum BinderError {
    /// Pin resolution failed; nothing was acquired.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Binder already started")]
    AlreadyStarted,

    #[error("Binder stopped")]
    Stopped,
}

/// Binder lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderPhase {
    Idle,
    Running,
    Stopped,
}

/// Per-LED state: `Uninitialized → Off → On ⇄ Off → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    /// Not acquired (before start, or acquisition failed).
    Uninitialized,
    Off,
    On,
    /// Released by shutdown. Terminal.
    Closed,
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Off => "off",
            Self::On => "on",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Roles that ended up bound after `start()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartReport {
    pub leds: Vec<PinRole>,
    pub buttons: Vec<PinRole>,
}

impl StartReport {
    /// Number of routes with both ends bound.
    pub fn complete_routes(&self, routes: &RouteTable) -> usize {
        routes
            .iter()
            .filter(|r| self.leds.contains(&r.led) && self.buttons.contains(&r.button))
            .count()
    }
}

struct LedChannel {
    role: PinRole,
    pin: Option<String>,
    line: Option<Box<dyn GpioLine>>,
    state: LedState,
}

struct ButtonChannel {
    role: PinRole,
    pin: Option<String>,
    driver: Option<Box<dyn ButtonInputDriver>>,
}

/// Owns every acquired peripheral and routes key events to LEDs.
pub struct PeripheralBinder {
    manager: Box<dyn PeripheralManager>,
    board: BoardProfile,
    table: PinTable,
    routes: RouteTable,
    logic: LogicState,
    debounce: Duration,
    sink: KeyEventSink,
    /// Route order, which is also acquisition order.
    leds: Vec<LedChannel>,
    buttons: Vec<ButtonChannel>,
    phase: BinderPhase,
}

impl PeripheralBinder {
    /// Create an idle binder with the builtin pin table, default routes,
    /// active-low buttons and the default debounce.
    pub fn new(
        manager: Box<dyn PeripheralManager>,
        board: BoardProfile,
        sink: KeyEventSink,
    ) -> Self {
        let routes = RouteTable::default();
        let (leds, buttons) = channels(&routes);
        Self {
            manager,
            board,
            table: PinTable::builtin(),
            routes,
            logic: LogicState::ActiveLow,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            sink,
            leds,
            buttons,
            phase: BinderPhase::Idle,
        }
    }

    pub fn with_table(mut self, table: PinTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        let (leds, buttons) = channels(&routes);
        self.routes = routes;
        self.leds = leds;
        self.buttons = buttons;
        self
    }

    pub fn with_button_logic(mut self, logic: LogicState) -> Self {
        self.logic = logic;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn phase(&self) -> BinderPhase {
        self.phase
    }

    pub fn board(&self) -> &BoardProfile {
        &self.board
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// State of a routed LED; `None` for roles no route drives.
    pub fn led_state(&self, role: PinRole) -> Option<LedState> {
        self.leds.iter().find(|c| c.role == role).map(|c| c.state)
    }

    /// Whether `role` currently holds an acquired peripheral.
    pub fn is_bound(&self, role: PinRole) -> bool {
        self.leds
            .iter()
            .any(|c| c.role == role && c.line.is_some())
            || self
                .buttons
                .iter()
                .any(|c| c.role == role && c.driver.is_some())
    }

    /// Pin acquired for `role`, if bound.
    pub fn pin(&self, role: PinRole) -> Option<&str> {
        let led = self.leds.iter().find(|c| c.role == role && c.line.is_some());
        let button = self
            .buttons
            .iter()
            .find(|c| c.role == role && c.driver.is_some());
        led.and_then(|c| c.pin.as_deref())
            .or_else(|| button.and_then(|c| c.pin.as_deref()))
    }

    // ─── Startup ────────────────────────────────────────────────────

    /// Resolve, acquire and register every routed role.
    ///
    /// # Errors
    /// - `BinderError::Registry` if a role cannot be resolved for the
    ///   board. Nothing is acquired in that case.
    /// - `AlreadyStarted` / `Stopped` outside the `Idle` phase.
    pub fn start(&mut self) -> Result<StartReport, BinderError> {
        match self.phase {
            BinderPhase::Idle => {}
            BinderPhase::Running => return Err(BinderError::AlreadyStarted),
            BinderPhase::Stopped => return Err(BinderError::Stopped),
        }

        info!(
            "Binding {} routes on board '{}' via {} driver",
            self.routes.len(),
            self.board,
            self.manager.name()
        );

        // Resolve everything up front; an unknown board acquires nothing.
        let led_bindings = self
            .routes
            .leds()
            .map(|role| self.table.resolve(&self.board, role))
            .collect::<Result<Vec<_>, _>>()?;
        let button_bindings = self
            .routes
            .iter()
            .map(|route| {
                self.table
                    .resolve(&self.board, route.button)
                    .map(|binding| (binding, route.key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut claimed = HashSet::new();

        for (channel, binding) in self.leds.iter_mut().zip(&led_bindings) {
            if !claimed.insert(binding.pin().to_string()) {
                warn!("{binding}: pin already owned, {} left unbound", binding.role());
                continue;
            }
            match acquire_led(self.manager.as_mut(), binding) {
                Some(line) => {
                    channel.pin = Some(binding.pin().to_string());
                    channel.line = Some(line);
                    channel.state = LedState::Off;
                    debug!("{binding} bound");
                }
                None => {
                    claimed.remove(binding.pin());
                }
            }
        }

        for (channel, (binding, key)) in self.buttons.iter_mut().zip(&button_bindings) {
            if !claimed.insert(binding.pin().to_string()) {
                warn!("{binding}: pin already owned, {} left unbound", binding.role());
                continue;
            }
            let driver = acquire_button(
                self.manager.as_mut(),
                binding,
                self.logic,
                *key,
                self.debounce,
                &self.sink,
            );
            match driver {
                Some(driver) => {
                    channel.pin = Some(binding.pin().to_string());
                    channel.driver = Some(driver);
                    debug!("{binding} registered as key {key}");
                }
                None => {
                    claimed.remove(binding.pin());
                }
            }
        }

        self.phase = BinderPhase::Running;

        let report = StartReport {
            leds: bound_roles(self.leds.iter().map(|c| (c.role, c.line.is_some()))),
            buttons: bound_roles(self.buttons.iter().map(|c| (c.role, c.driver.is_some()))),
        };
        let complete = report.complete_routes(&self.routes);
        if complete < self.routes.len() {
            warn!(
                "Started degraded: {complete}/{} routes fully bound",
                self.routes.len()
            );
        } else {
            info!("Started: {complete} routes bound");
        }
        Ok(report)
    }

    // ─── Event routing ──────────────────────────────────────────────

    /// Press of the button emitting `code`. Returns true if handled.
    pub fn on_key_down(&mut self, code: KeyCode) -> bool {
        self.drive(code, true)
    }

    /// Release of the button emitting `code`. Returns true if handled.
    pub fn on_key_up(&mut self, code: KeyCode) -> bool {
        self.drive(code, false)
    }

    pub fn dispatch(&mut self, event: KeyEvent) -> bool {
        match event.action {
            KeyAction::Down => self.on_key_down(event.code),
            KeyAction::Up => self.on_key_up(event.code),
        }
    }

    fn drive(&mut self, code: KeyCode, on: bool) -> bool {
        if self.phase != BinderPhase::Running {
            debug!("Key {code} ignored, binder {:?}", self.phase);
            return false;
        }
        let Some(route) = self.routes.by_key(code) else {
            debug!("No route for key {code}");
            return false;
        };
        let Some(channel) = self.leds.iter_mut().find(|c| c.role == route.led) else {
            return false;
        };
        let Some(line) = channel.line.as_mut() else {
            debug!("Key {code}: {} unbound, event dropped", channel.role);
            return true;
        };

        match line.set_value(on) {
            Ok(()) => {
                channel.state = if on { LedState::On } else { LedState::Off };
                debug!("{} {}", channel.role, channel.state);
            }
            Err(e) => error!("{} write failed: {e}", channel.role),
        }
        true
    }

    // ─── Shutdown ───────────────────────────────────────────────────

    /// Release buttons, then LEDs, each in reverse acquisition order.
    /// Idempotent: a second call does nothing.
    pub fn stop(&mut self) {
        if self.phase == BinderPhase::Stopped {
            return;
        }
        let was_running = self.phase == BinderPhase::Running;
        self.phase = BinderPhase::Stopped;

        for channel in self.buttons.iter_mut().rev() {
            let Some(mut driver) = channel.driver.take() else {
                continue;
            };
            driver.unregister();
            if let Err(e) = driver.close() {
                error!("{} close failed: {e}", channel.role);
            }
        }

        for channel in self.leds.iter_mut().rev() {
            if let Some(mut line) = channel.line.take() {
                if let Err(e) = line.close() {
                    error!("{} close failed: {e}", channel.role);
                }
            }
            channel.state = LedState::Closed;
        }

        if was_running {
            info!("Binder stopped, peripherals released");
        }
    }
}

impl Drop for PeripheralBinder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn channels(routes: &RouteTable) -> (Vec<LedChannel>, Vec<ButtonChannel>) {
    let leds = routes
        .leds()
        .map(|role| LedChannel {
            role,
            pin: None,
            line: None,
            state: LedState::Uninitialized,
        })
        .collect();
    let buttons = routes
        .buttons()
        .map(|role| ButtonChannel {
            role,
            pin: None,
            driver: None,
        })
        .collect();
    (leds, buttons)
}

fn bound_roles(channels: impl Iterator<Item = (PinRole, bool)>) -> Vec<PinRole> {
    channels
        .filter(|(_, bound)| *bound)
        .map(|(role, _)| role)
        .collect()
}

/// Open `binding` as an output driven low. A line that opened but could
/// not be configured is closed again.
fn acquire_led(manager: &mut dyn PeripheralManager, binding: &PinBinding) -> Option<Box<dyn GpioLine>> {
    let mut line = match manager.open_gpio(binding.pin()) {
        Ok(line) => line,
        Err(e) => {
            error!("{binding}: {e}");
            return None;
        }
    };
    if let Err(e) = line.set_direction(Direction::OutInitiallyLow) {
        error!("{binding}: {e}");
        if let Err(e) = line.close() {
            error!("{binding}: {e}");
        }
        return None;
    }
    Some(line)
}

/// Create and register a button driver. A driver that was created but
/// could not be registered is closed again.
fn acquire_button(
    manager: &mut dyn PeripheralManager,
    binding: &PinBinding,
    logic: LogicState,
    key: KeyCode,
    debounce: Duration,
    sink: &KeyEventSink,
) -> Option<Box<dyn ButtonInputDriver>> {
    let mut driver = match manager.create_button_driver(binding.pin(), logic, key, debounce) {
        Ok(driver) => driver,
        Err(e) => {
            error!("{binding}: {e}");
            return None;
        }
    };
    if let Err(e) = driver.register(sink.clone()) {
        error!("{binding}: {e}");
        if let Err(e) = driver.close() {
            error!("{binding}: {e}");
        }
        return None;
    }
    Some(driver)
}
