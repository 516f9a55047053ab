//! SimpliKit bridge: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareBoard / SimBoard   ConsoleLink    JsonFileConfig      │
//! │  (PeripheralPort)           (CloudLink)    (ConfigPort)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  CommandDispatcher ──▶ FanSupervisor · BuzzerSupervisor │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ReconcileTask × 2 (one thread each, IntervalTicker-driven)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `simplikit [CONFIG_PATH]`.  Set `SIMPLIKIT_BOARD=sim` or
//! `SIMPLIKIT_BOARD=hardware` to override the peripheral backend.

#![deny(unused_must_use)]

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use simplikit::actuators::{Buzzer, BuzzerSupervisor, Fan, FanSupervisor, ReconcileTask};
use simplikit::adapters::config_file::{JsonFileConfig, DEVICE_CONFIG_PATH};
use simplikit::adapters::console::{self, ConsoleLink};
use simplikit::adapters::hardware::HardwareBoard;
use simplikit::adapters::sim::{SimBoard, SimSensors};
use simplikit::app::dispatcher::CommandDispatcher;
use simplikit::app::ports::{ConfigError, ConfigPort, PeripheralPort};
use simplikit::config::DeviceConfig;
use simplikit::error::Error;
use simplikit::scheduler::{IntervalTicker, Shutdown};

// ── Bootstrap helpers ─────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn init_logging() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()?;
    Ok(())
}

fn load_config() -> Result<DeviceConfig> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEVICE_CONFIG_PATH.to_string());
    match JsonFileConfig::new(&path).load() {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound) => {
            warn!("No config at {}, using defaults", path);
            Ok(DeviceConfig::default())
        }
        Err(e) => Err(Error::from(e)).with_context(|| format!("loading {}", path)),
    }
}

enum Board {
    Hardware,
    Sim(SimBoard),
}

fn select_board() -> Board {
    let default = if cfg!(target_os = "espidf") {
        "hardware"
    } else {
        "sim"
    };
    let choice = std::env::var("SIMPLIKIT_BOARD").unwrap_or_else(|_| default.to_string());
    match choice.as_str() {
        "hardware" => Board::Hardware,
        "sim" => Board::Sim(SimBoard::new()),
        other => {
            warn!("Unknown board '{}', using {}", other, default);
            if default == "sim" {
                Board::Sim(SimBoard::new())
            } else {
                Board::Hardware
            }
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging()?;
    info!("SimpliKit bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let reconcile = &config.reconcile;
    let budget = reconcile.hardware_call_budget();

    let board = select_board();
    let port: Arc<dyn PeripheralPort> = match &board {
        Board::Hardware => Arc::new(HardwareBoard::new()),
        Board::Sim(sim) => Arc::new(sim.clone()),
    };

    // ── Supervisors ───────────────────────────────────────────
    let fan = Arc::new(FanSupervisor::new(
        Fan::new(&config.hardware),
        port.clone(),
        budget,
    ));
    let buzzer = Arc::new(BuzzerSupervisor::new(
        Buzzer::new(config.hardware.buzzer_gpio),
        port,
        budget,
    ));

    // ── Cloud link + reconciliation loops ─────────────────────
    let link = Arc::new(ConsoleLink::new(io::stdout()));
    let shutdown = Arc::new(Shutdown::new());
    let ticker = || IntervalTicker::new(reconcile.wake_interval(), shutdown.clone());

    let workers = [
        ReconcileTask::new(fan.clone(), link.clone(), reconcile)
            .spawn(ticker())
            .context("spawning fan reconcile loop")?,
        ReconcileTask::new(buzzer.clone(), link.clone(), reconcile)
            .spawn(ticker())
            .context("spawning buzzer reconcile loop")?,
    ];

    // ── Dispatcher ────────────────────────────────────────────
    let mut dispatcher = CommandDispatcher::new(link.clone())
        .with_fan(fan)
        .with_buzzer(buzzer);
    if let Board::Sim(_) = board {
        dispatcher = dispatcher.with_sensors(Arc::new(SimSensors::new()));
    }

    info!("System ready. Reading platform messages from stdin.");
    let served = console::serve(io::stdin().lock(), &dispatcher, &*link);

    shutdown.trigger();
    for worker in workers {
        if worker.join().is_err() {
            warn!("Reconcile thread exited with a panic");
        }
    }
    served.context("console input")?;
    info!("Shut down cleanly");
    Ok(())
}
