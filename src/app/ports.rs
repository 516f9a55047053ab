//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisors / Dispatcher (domain)
//! ```
//!
//! Driven adapters (peripherals, sensors, the cloud link, config storage)
//! implement these traits.  The actuator supervisors and the command
//! dispatcher receive them by explicit injection, so the domain core never
//! touches vendor APIs directly.
//!
//! Every port that is shared between the dispatch path and the
//! reconciliation threads is `Send + Sync`.

use crate::config::DeviceConfig;
use crate::error::{AcquireError, ActuatorError, SensorError};
use crate::thing_model::Report;

// ───────────────────────────────────────────────────────────────
// Peripheral port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A single digital output line.
pub trait DigitalOutput: Send {
    fn write(&mut self, high: bool) -> Result<(), ActuatorError>;
}

/// A single PWM channel.
pub trait PwmOutput: Send {
    /// Start (or retune) the channel at `freq_hz` with `duty_percent` (0–100).
    fn open(&mut self, freq_hz: u32, duty_percent: u8) -> Result<(), ActuatorError>;

    /// Stop the channel and drive the output idle.
    fn close(&mut self) -> Result<(), ActuatorError>;
}

/// Opens peripherals.  Implementations fail with
/// [`AcquireError::Absent`] when the driver is not part of the build and
/// with [`AcquireError::OpenFailed`] for transient failures.
pub trait PeripheralPort: Send + Sync {
    /// Configure `gpio` as a push-pull output, initially low.
    fn open_output(&self, gpio: i32) -> Result<Box<dyn DigitalOutput>, AcquireError>;

    /// Configure PWM `channel` on `gpio` at `freq_hz`, initially 0 % duty.
    fn open_pwm(
        &self,
        channel: u32,
        gpio: i32,
        freq_hz: u32,
    ) -> Result<Box<dyn PwmOutput>, AcquireError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Accelerometer and gyroscope axes, in that order.
pub type MotionReading = ([f32; 3], [f32; 3]);

/// Synchronous sensor getters.  `Ok(None)` means the sensor is not fitted
/// or has no sample yet; `Err` means the read itself failed.
pub trait SensorPort: Send + Sync {
    /// (temperature °C, relative humidity %) from the combined T/RH sensor.
    fn temperature_humidity(&self) -> Result<Option<(f32, f32)>, SensorError>;

    /// (pressure hPa, temperature °C) from the barometer.
    fn pressure_temperature(&self) -> Result<Option<(f32, f32)>, SensorError>;

    /// (accelerometer, gyroscope) from the IMU.
    fn motion(&self) -> Result<Option<MotionReading>, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Cloud link (driven adapter: domain → platform)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the thing-model connection.  Framing and encoding are
/// the adapter's business; the domain only hands over [`Report`]s.
pub trait CloudLink: Send + Sync {
    /// Whether the platform session is currently up.
    fn is_connected(&self) -> bool;

    /// Push an unsolicited report.
    fn send_report(&self, mode: u8, payload: &Report) -> Result<(), LinkError>;

    /// Answer a read request identified by `correlation_id`.
    fn ack_read(&self, mode: u8, payload: &Report, correlation_id: u32) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ← persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads the device configuration.  Implementations validate before
/// returning; the core never sees an invalid config.
pub trait ConfigPort {
    fn load(&self) -> Result<DeviceConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the work it triggers)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when an entry fires.
pub trait SchedulerDelegate {
    /// * `label`: the human-readable label of the entry that fired.
    /// * `kind`: what the entry is for.
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// Try to reopen a lost peripheral.
    Reconnect,
    /// Push a status report to the cloud.
    Report,
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`CloudLink`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The platform session is down.
    Disconnected,
    /// The transport rejected the message with a return code.
    Rejected(i32),
    /// The send did not complete within the configured timeout.
    Timeout,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file found.
    NotFound,
    /// Config file is not valid JSON or is missing required keys.
    Malformed,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "link disconnected"),
            Self::Rejected(rc) => write!(f, "rejected by transport (rc={})", rc),
            Self::Timeout => write!(f, "send timed out"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for LinkError {}
impl std::error::Error for ConfigError {}
