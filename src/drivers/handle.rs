//! Hot-plug ownership wrapper around one peripheral driver.
//!
//! The handle either holds a live driver or nothing; `connected` is derived
//! from that, so the two cannot disagree.  Any failed write drops the
//! driver.  There are no retries in here: retry policy belongs to the
//! supervisor that owns the handle.
//!
//! A driver that is missing from the build ([`AcquireError::Absent`]) is
//! remembered, and later acquisitions short-circuit without calling the
//! opener again.

use core::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::{AcquireError, ActuatorError};

/// Which physical peripheral a handle refers to.  Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Gpio(i32),
    Pwm { channel: u32, gpio: i32 },
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(pin) => write!(f, "GPIO{}", pin),
            Self::Pwm { channel, gpio } => write!(f, "PWM{} (GPIO{})", channel, gpio),
        }
    }
}

pub struct HardwareHandle<D> {
    peripheral: Peripheral,
    driver: Option<D>,
    absent: bool,
    call_budget: Duration,
}

impl<D> HardwareHandle<D> {
    /// A handle that holds nothing yet.
    pub fn unavailable(peripheral: Peripheral, call_budget: Duration) -> Self {
        Self {
            peripheral,
            driver: None,
            absent: false,
            call_budget,
        }
    }

    /// Open the peripheral now.  Never fails: on error the handle is
    /// returned disconnected.
    pub fn acquire(
        peripheral: Peripheral,
        call_budget: Duration,
        open: impl FnOnce() -> Result<D, AcquireError>,
    ) -> Self {
        let mut handle = Self::unavailable(peripheral, call_budget);
        handle.reacquire(open);
        handle
    }

    /// Try to (re)open the peripheral if no driver is held.
    /// Returns whether a driver is held afterwards.
    pub fn reacquire(&mut self, open: impl FnOnce() -> Result<D, AcquireError>) -> bool {
        if self.driver.is_some() {
            return true;
        }
        if self.absent {
            return false;
        }

        match open() {
            Ok(driver) => {
                info!("{}: driver opened", self.peripheral);
                self.driver = Some(driver);
                true
            }
            Err(e) if e.is_permanent() => {
                warn!("{}: {}, giving up on this peripheral", self.peripheral, e);
                self.absent = true;
                false
            }
            Err(e) => {
                debug!("{}: {}", self.peripheral, e);
                false
            }
        }
    }

    /// Run one write against the driver.  On failure the driver is
    /// dropped and the handle becomes disconnected.
    pub fn apply(
        &mut self,
        write: impl FnOnce(&mut D) -> Result<(), ActuatorError>,
    ) -> Result<(), ActuatorError> {
        let Some(driver) = self.driver.as_mut() else {
            return Err(ActuatorError::NotConnected);
        };

        let started = Instant::now();
        let result = write(driver);
        let elapsed = started.elapsed();
        if elapsed > self.call_budget {
            warn!(
                "{}: write took {} ms (budget {} ms)",
                self.peripheral,
                elapsed.as_millis(),
                self.call_budget.as_millis()
            );
        }

        if let Err(e) = result {
            warn!("{}: {}, marking disconnected", self.peripheral, e);
            self.release();
        }
        result
    }

    /// Drop the driver.  Idempotent.
    pub fn release(&mut self) {
        if self.driver.take().is_some() {
            debug!("{}: driver released", self.peripheral);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// The driver is missing from the build; reconnection is pointless.
    pub fn is_absent(&self) -> bool {
        self.absent
    }

    pub fn peripheral(&self) -> Peripheral {
        self.peripheral
    }
}
