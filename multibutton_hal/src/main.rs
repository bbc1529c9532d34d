//! # Multibutton Binary
//!
//! Lights an LED while its button is held, on any board in the pin table.
//!
//! # Usage
//!
//! ```bash
//! # Simulated board, buttons driven from stdin ("press 1", "release 1", "quit")
//! multibutton --board rpi3 --simulate
//!
//! # Raspberry Pi hardware (built with --features rppal)
//! MULTIBUTTON_BOARD=rpi3 multibutton --driver rppal
//!
//! # Show the pin table
//! multibutton --list-boards --pin-table config/boards.toml
//! ```

use clap::Parser;
use multibutton_common::board::registry::{BoardProfile, PinTable};
use multibutton_common::board::role::PinRole;
use multibutton_common::config::{AppConfig, ConfigError, ConfigLoader, LogLevel};
use multibutton_common::consts::{BOARD_ENV_VAR, DEFAULT_CONFIG_PATH};
use multibutton_common::gpio::driver::{DriverOptions, PeripheralManager};
use multibutton_hal::binder::PeripheralBinder;
use multibutton_hal::driver_registry::DriverRegistry;
use multibutton_hal::drivers::simulation::{SimulatedBoard, SimulationManager};
use multibutton_hal::host::EventLoop;
use multibutton_hal::routing::RouteTable;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Multibutton - three buttons, three LEDs, any supported board
#[derive(Parser, Debug)]
#[command(name = "multibutton")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Board-aware button to LED binder")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file (multibutton.toml).
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Board identifier (rpi3, imx6ul_pico, imx7d_pico, or any pin table entry)
    #[arg(short, long, env = BOARD_ENV_VAR)]
    board: Option<String>,

    /// Peripheral driver to load
    #[arg(short, long)]
    driver: Option<String>,

    /// Force the simulation driver and read button presses from stdin
    #[arg(short = 's', long)]
    simulate: bool,

    /// Extra pin table merged over the builtin and configured tables
    #[arg(long, value_name = "FILE")]
    pin_table: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Print the known boards and their pins, then exit
    #[arg(long)]
    list_boards: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("multibutton failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Tracing first so config errors are logged.
    let loaded = load_app_config(&args.config);
    setup_tracing(&args, startup_log_level(&loaded));
    let (config, source) =
        loaded.map_err(|e| format!("{}: {e}", args.config.display()))?;

    match source {
        ConfigSource::File => info!("Loaded configuration from {:?}", args.config),
        ConfigSource::Defaults => warn!("No configuration at {:?}, using defaults", args.config),
    }

    let table = load_pin_table(&args, &config)?;

    if args.list_boards {
        print_boards(&table);
        return Ok(());
    }

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let board_id = args
        .board
        .clone()
        .or_else(|| config.board.id.clone())
        .ok_or_else(|| format!("no board selected (use --board or {BOARD_ENV_VAR})"))?;
    let board = BoardProfile::new(board_id);

    let driver_name = if args.simulate {
        info!("Simulation mode enabled");
        "simulation".to_string()
    } else {
        args.driver.clone().unwrap_or_else(|| "simulation".to_string())
    };

    let debounce = Duration::from_millis(config.buttons.debounce_ms);
    let routes = RouteTable::new(config.routes.clone())?;
    let running = Arc::new(AtomicBool::new(true));

    // The simulated board is kept so stdin can drive it.
    let (manager, sim): (Box<dyn PeripheralManager>, Option<SimulatedBoard>) =
        if driver_name == "simulation" {
            let sim = SimulatedBoard::new();
            let manager = Box::new(SimulationManager::new(sim.clone())) as Box<dyn PeripheralManager>;
            (manager, Some(sim))
        } else {
            let registry = DriverRegistry::with_builtin();
            info!("Available drivers: {:?}", registry.list_drivers());
            let manager = registry.create_driver(&driver_name, &DriverOptions { debounce })?;
            (manager, None)
        };
    info!("Using driver '{}'", manager.name());

    let (sink, events) = mpsc::channel();
    let mut binder = PeripheralBinder::new(manager, board.clone(), sink)
        .with_table(table.clone())
        .with_routes(routes.clone())
        .with_button_logic(config.buttons.logic)
        .with_debounce(debounce);

    let flag = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })?;

    binder.start()?;

    if let Some(sim) = sim {
        spawn_stdin_feeder(sim, button_pins(&table, &board, &routes), running.clone());
    }

    let mut event_loop = EventLoop::new(events, running);
    event_loop.run(&mut binder);

    binder.stop();
    info!("multibutton shutdown complete");
    Ok(())
}

/// Where the running configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigSource {
    File,
    Defaults,
}

/// Load and validate the config file. A missing file yields the defaults.
fn load_app_config(path: &Path) -> Result<(AppConfig, ConfigSource), ConfigError> {
    let (config, source) = match AppConfig::load(path) {
        Ok(config) => (config, ConfigSource::File),
        Err(ConfigError::FileNotFound) => (AppConfig::default(), ConfigSource::Defaults),
        Err(e) => return Err(e),
    };
    config.validate()?;
    Ok((config, source))
}

/// Configured log level, or the default when the config is unusable.
fn startup_log_level(loaded: &Result<(AppConfig, ConfigSource), ConfigError>) -> LogLevel {
    loaded
        .as_ref()
        .map(|(config, _)| config.shared.log_level)
        .unwrap_or_default()
}

/// Builtin table, then the configured pin table, then `--pin-table`.
fn load_pin_table(args: &Args, config: &AppConfig) -> Result<PinTable, Box<dyn std::error::Error>> {
    let config_dir = args.config.parent().unwrap_or(Path::new("."));
    let mut table = PinTable::builtin();

    for path in config
        .pin_table_path(config_dir)
        .into_iter()
        .chain(args.pin_table.clone())
    {
        info!("Merging pin table {:?}", path);
        table = table.merge(PinTable::load(&path)?);
    }
    Ok(table)
}

fn print_boards(table: &PinTable) {
    for id in table.boards() {
        println!("{id}");
        let board = BoardProfile::new(id);
        for role in PinRole::ALL {
            if let Ok(binding) = table.resolve(&board, role) {
                println!("  {binding}");
            }
        }
    }
}

/// Button channel number → pin, for the routed buttons on `board`.
fn button_pins(table: &PinTable, board: &BoardProfile, routes: &RouteTable) -> HashMap<u8, String> {
    routes
        .buttons()
        .filter_map(|role| {
            let binding = table.resolve(board, role).ok()?;
            Some((role.channel(), binding.pin().to_string()))
        })
        .collect()
}

/// Drive simulated buttons from stdin until `quit` or end of input.
fn spawn_stdin_feeder(sim: SimulatedBoard, pins: HashMap<u8, String>, running: Arc<AtomicBool>) {
    println!("Commands: press <n>, release <n>, quit");
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();
            let command = words.next();
            let pin = words
                .next()
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(|n| pins.get(&n));

            match (command, pin) {
                (Some("quit"), _) => break,
                (Some("press"), Some(pin)) => {
                    sim.press(pin);
                }
                (Some("release"), Some(pin)) => {
                    sim.release(pin);
                }
                (None, _) => {}
                _ => warn!("Unknown command: {line}"),
            }
        }
        running.store(false, Ordering::SeqCst);
    });
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
