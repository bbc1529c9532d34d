//! Peripheral binder tests against the simulated board.
//!
//! Covers press/release routing, partial acquisition, dropped writes and
//! teardown ordering.

use multibutton_common::board::registry::{
    BOARD_IMX6UL_PICO, BOARD_RPI3, BoardProfile, PinTable, RegistryError,
};
use multibutton_common::board::role::{KeyCode, LogicState, PinRole};
use multibutton_common::config::RouteConfig;
use multibutton_common::gpio::driver::KeyEvent;
use multibutton_hal::binder::{BinderError, BinderPhase, LedState, PeripheralBinder};
use multibutton_hal::drivers::simulation::{PinWrite, SimulatedBoard, SimulationManager};
use multibutton_hal::host::EventLoop;
use multibutton_hal::routing::RouteTable;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

struct Harness {
    sim: SimulatedBoard,
    binder: PeripheralBinder,
    events: EventLoop,
}

impl Harness {
    fn new(board: &str) -> Self {
        Self::with(board, |binder| binder)
    }

    fn with(board: &str, configure: impl FnOnce(PeripheralBinder) -> PeripheralBinder) -> Self {
        let sim = SimulatedBoard::new();
        let (tx, rx) = mpsc::channel();
        let binder = configure(PeripheralBinder::new(
            Box::new(SimulationManager::new(sim.clone())),
            BoardProfile::new(board),
            tx,
        ));
        let events = EventLoop::new(rx, Arc::new(AtomicBool::new(true)));
        Self {
            sim,
            binder,
            events,
        }
    }

    fn press(&mut self, pin: &str) {
        self.sim.press(pin);
        self.events.pump(&mut self.binder);
    }

    fn release(&mut self, pin: &str) {
        self.sim.release(pin);
        self.events.pump(&mut self.binder);
    }
}

fn write(pin: &str, value: bool) -> PinWrite {
    PinWrite {
        pin: pin.to_string(),
        value,
    }
}

#[test]
fn button1_press_and_release_drive_led1() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();

    h.press("BCM21");
    assert_eq!(h.sim.level("BCM6"), Some(true));
    assert_eq!(h.binder.led_state(PinRole::Led1), Some(LedState::On));

    h.release("BCM21");
    assert_eq!(h.sim.level("BCM6"), Some(false));
    assert_eq!(h.binder.led_state(PinRole::Led1), Some(LedState::Off));
}

#[test]
fn press_then_release_is_exactly_two_writes_per_role() {
    let pairs = [("BCM21", "BCM6"), ("BCM20", "BCM19"), ("BCM16", "BCM26")];
    for (button, led) in pairs {
        let mut h = Harness::new(BOARD_RPI3);
        h.binder.start().unwrap();

        h.press(button);
        h.release(button);

        assert_eq!(h.sim.writes(), vec![write(led, true), write(led, false)]);
    }
}

#[test]
fn led2_open_failure_leaves_other_routes_working() {
    let mut h = Harness::new(BOARD_RPI3);
    h.sim.fail_open("BCM19");

    let report = h.binder.start().unwrap();
    assert_eq!(report.leds, vec![PinRole::Led1, PinRole::Led3]);
    assert_eq!(report.buttons, PinRole::BUTTONS.to_vec());
    assert!(!h.binder.is_bound(PinRole::Led2));
    assert_eq!(h.binder.led_state(PinRole::Led2), Some(LedState::Uninitialized));

    h.press("BCM21");
    h.press("BCM20");
    h.press("BCM16");

    assert_eq!(h.sim.writes_to("BCM6"), vec![true]);
    assert_eq!(h.sim.writes_to("BCM26"), vec![true]);
    assert!(h.sim.writes_to("BCM19").is_empty());
    // Button2 events still count as handled.
    assert_eq!(h.events.stats().handled, 3);
}

#[test]
fn unsupported_board_acquires_nothing() {
    let mut h = Harness::new("beaglebone");

    let err = h.binder.start().unwrap_err();
    assert!(matches!(
        err,
        BinderError::Registry(RegistryError::UnsupportedBoard { ref board }) if board == "beaglebone"
    ));
    assert_eq!(h.binder.phase(), BinderPhase::Idle);
    for role in PinRole::ALL {
        assert!(!h.binder.is_bound(role));
    }

    h.binder.stop();
    assert!(h.sim.closes().is_empty());
    assert!(h.sim.writes().is_empty());
}

#[test]
fn failed_write_is_dropped_and_next_write_lands() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();
    h.sim.fail_write("BCM6");

    h.press("BCM21");
    assert!(h.sim.writes().is_empty());
    assert_eq!(h.binder.led_state(PinRole::Led1), Some(LedState::Off));
    assert_eq!(h.binder.phase(), BinderPhase::Running);

    h.sim.clear_faults();
    h.release("BCM21");
    h.press("BCM21");
    assert_eq!(h.sim.writes_to("BCM6"), vec![false, true]);
}

#[test]
fn stop_twice_releases_once() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();

    h.binder.stop();
    let after_first = h.sim.closes();
    assert_eq!(after_first.len(), 6);

    h.binder.stop();
    assert_eq!(h.sim.closes(), after_first);
}

#[test]
fn teardown_releases_buttons_then_leds_in_reverse() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();
    h.binder.stop();

    assert_eq!(
        h.sim.closes(),
        vec!["BCM16", "BCM20", "BCM21", "BCM26", "BCM19", "BCM6"]
    );
    for pin in ["BCM21", "BCM20", "BCM16"] {
        assert!(!h.sim.is_registered(pin));
    }
}

#[test]
fn close_failure_does_not_block_remaining_releases() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();
    h.sim.fail_close("BCM20");
    h.sim.fail_close("BCM19");

    h.binder.stop();
    assert_eq!(h.sim.closes().len(), 6);
    for role in PinRole::ALL {
        assert!(!h.binder.is_bound(role));
    }

    h.binder.stop();
    assert_eq!(h.sim.closes().len(), 6);
}

#[test]
fn stop_before_start() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.stop();

    assert_eq!(h.binder.phase(), BinderPhase::Stopped);
    assert!(h.sim.closes().is_empty());
    assert!(matches!(h.binder.start(), Err(BinderError::Stopped)));
}

#[test]
fn events_after_stop_are_ignored() {
    let mut h = Harness::new(BOARD_RPI3);
    h.binder.start().unwrap();
    h.binder.stop();

    assert!(!h.binder.dispatch(KeyEvent::down(KeyCode::A)));
    assert!(h.sim.writes().is_empty());
}

#[test]
fn imx6ul_shared_pins_bind_first_role_only() {
    let mut h = Harness::new(BOARD_IMX6UL_PICO);

    let report = h.binder.start().unwrap();
    assert_eq!(report.leds, vec![PinRole::Led1]);
    assert_eq!(report.buttons, vec![PinRole::Button1]);

    h.press("GPIO2_IO03");
    assert_eq!(h.sim.writes_to("GPIO4_IO22"), vec![true]);

    // Route known, LED unbound: handled, nothing written.
    assert!(h.binder.on_key_down(KeyCode::B));
    assert_eq!(h.sim.writes().len(), 1);

    h.binder.stop();
    assert_eq!(h.sim.closes(), vec!["GPIO2_IO03", "GPIO4_IO22"]);
}

#[test]
fn button_create_failure_is_per_role() {
    let mut h = Harness::new(BOARD_RPI3);
    h.sim.fail_button("BCM21");

    let report = h.binder.start().unwrap();
    assert_eq!(report.buttons, vec![PinRole::Button2, PinRole::Button3]);

    h.press("BCM20");
    assert_eq!(h.sim.writes_to("BCM19"), vec![true]);
}

#[test]
fn custom_table_and_routes() {
    let table = PinTable::from_toml(
        r#"
[boards.bench]
Led1 = "P1"
Led2 = "P2"
Led3 = "P3"
Button1 = "P4"
Button2 = "P5"
Button3 = "P6"
"#,
    )
    .unwrap();
    let routes = RouteTable::new(vec![RouteConfig {
        button: PinRole::Button1,
        led: PinRole::Led3,
        key: KeyCode(2),
    }])
    .unwrap();

    let mut h = Harness::with("bench", |binder| {
        binder
            .with_table(PinTable::builtin().merge(table))
            .with_routes(routes)
            .with_button_logic(LogicState::ActiveHigh)
    });

    let report = h.binder.start().unwrap();
    assert_eq!(report.leds, vec![PinRole::Led3]);
    assert_eq!(report.buttons, vec![PinRole::Button1]);
    assert_eq!(h.binder.led_state(PinRole::Led1), None);

    // Active-high: raw high level is a press.
    h.sim.set_input_level("P4", true);
    h.events.pump(&mut h.binder);
    assert_eq!(h.sim.writes(), vec![write("P3", true)]);
    assert!(!h.sim.is_open("P1"));
}

#[test]
fn led_direction_failure_closes_the_opened_line() {
    let mut h = Harness::new(BOARD_RPI3);
    h.sim.fail_direction("BCM19");

    let report = h.binder.start().unwrap();
    assert_eq!(report.leds, vec![PinRole::Led1, PinRole::Led3]);
    assert_eq!(h.sim.closes(), vec!["BCM19"]);
    assert!(!h.sim.is_open("BCM19"));
    assert!(!h.binder.is_bound(PinRole::Led2));
    assert_eq!(h.binder.led_state(PinRole::Led2), Some(LedState::Uninitialized));

    h.press("BCM21");
    h.press("BCM16");
    assert_eq!(h.sim.writes(), vec![write("BCM6", true), write("BCM26", true)]);
}

#[test]
fn button_register_failure_closes_the_created_driver() {
    let mut h = Harness::new(BOARD_RPI3);
    h.sim.fail_register("BCM20");

    let report = h.binder.start().unwrap();
    assert_eq!(report.buttons, vec![PinRole::Button1, PinRole::Button3]);
    assert_eq!(h.sim.closes(), vec!["BCM20"]);
    assert!(!h.sim.is_open("BCM20"));
    assert!(!h.binder.is_bound(PinRole::Button2));

    h.press("BCM21");
    h.press("BCM16");
    assert_eq!(h.sim.writes(), vec![write("BCM6", true), write("BCM26", true)]);

    h.binder.stop();
    assert_eq!(h.sim.closes().iter().filter(|pin| *pin == "BCM20").count(), 1);
}
