//! Unified error types for the SimpliKit bridge.
//!
//! Every subsystem has a small `Copy` error enum.  Hardware errors
//! ([`AcquireError`], [`ActuatorError`]) stay inside the hardware handle,
//! which turns them into a disconnected state.  The others convert into
//! the top-level [`Error`] where they are logged or handed to the binary.
//! None of them escapes to the cloud link: supervisors return booleans
//! and the dispatcher omits response fields.

use core::fmt;

use crate::app::ports::{ConfigError, LinkError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor getter failed.
    Sensor(SensorError),
    /// A command value was rejected at the setter boundary.
    Input(InputError),
    /// The cloud link refused or dropped a message.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A collaborator (supervisor, sensor hub) cannot be reached.
    Unavailable(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Unavailable(what) => write!(f, "{what} unavailable"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Peripheral acquisition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The driver module is not part of this build.  Permanent.
    Absent,
    /// The open/configure call failed with a driver return code.
    /// Eligible for a later retry.
    OpenFailed(i32),
}

impl AcquireError {
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "driver not present in this build"),
            Self::OpenFailed(rc) => write!(f, "open failed (rc={rc})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator writes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO level write failed.
    GpioWriteFailed,
    /// PWM duty/frequency write failed.
    PwmWriteFailed,
    /// The handle holds no driver.
    NotConnected,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::NotConnected => write!(f, "hardware not connected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor reads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer on the bus.
    NotResponding,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotResponding => write!(f, "sensor not responding"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Command input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Fan mode outside 1..=3.
    ModeOutOfRange(i64),
    /// The value could not be coerced to an integer.
    NotAnInteger,
    /// The id exists but cannot be written.
    ReadOnly(u16),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeOutOfRange(v) => write!(f, "fan mode {v} out of range (1..=3)"),
            Self::NotAnInteger => write!(f, "value is not an integer"),
            Self::ReadOnly(id) => write!(f, "id {id} is read-only"),
        }
    }
}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
