//! Hardware adapter: opens real peripherals behind [`PeripheralPort`].
//!
//! This is the only module that hands out drivers touching actual
//! registers.  On non-espidf targets every open fails with
//! [`AcquireError::Absent`] (see [`crate::drivers::hw_init`]), so the
//! supervisors treat the outputs as permanently missing.

use log::debug;

use crate::app::ports::{DigitalOutput, PeripheralPort, PwmOutput};
use crate::drivers::hw_init;
use crate::error::{AcquireError, ActuatorError};

/// ESP-IDF GPIO/LEDC backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareBoard;

impl HardwareBoard {
    pub fn new() -> Self {
        Self
    }
}

// ── PeripheralPort implementation ─────────────────────────────

impl PeripheralPort for HardwareBoard {
    fn open_output(&self, gpio: i32) -> Result<Box<dyn DigitalOutput>, AcquireError> {
        hw_init::gpio_output_init(gpio)?;
        Ok(Box::new(EspOutput { gpio }))
    }

    fn open_pwm(
        &self,
        channel: u32,
        gpio: i32,
        freq_hz: u32,
    ) -> Result<Box<dyn PwmOutput>, AcquireError> {
        hw_init::ledc_init(channel, gpio, freq_hz)?;
        Ok(Box::new(EspPwm { channel, freq_hz }))
    }
}

// ── Drivers ───────────────────────────────────────────────────

struct EspOutput {
    gpio: i32,
}

impl DigitalOutput for EspOutput {
    fn write(&mut self, high: bool) -> Result<(), ActuatorError> {
        hw_init::gpio_write(self.gpio, high)
    }
}

/// LEDC channel bound to the timer configured at open time.
struct EspPwm {
    channel: u32,
    freq_hz: u32,
}

impl PwmOutput for EspPwm {
    fn open(&mut self, freq_hz: u32, duty_percent: u8) -> Result<(), ActuatorError> {
        if freq_hz != self.freq_hz {
            debug!(
                "hardware: CH{} carrier {} Hz requested, timer at {} Hz",
                self.channel, freq_hz, self.freq_hz
            );
            return Err(ActuatorError::PwmWriteFailed);
        }
        hw_init::ledc_set(self.channel, duty_percent)
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        hw_init::ledc_stop(self.channel)
    }
}
