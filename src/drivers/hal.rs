//! embedded-hal bridges.
//!
//! Wrap any `embedded_hal` output pin or PWM channel so the supervisors can
//! drive it through the object-safe [`DigitalOutput`] / [`PwmOutput`] ports.
//! Driver error details are logged at debug level and collapsed into
//! [`ActuatorError`].

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::debug;

use crate::app::ports::{DigitalOutput, PwmOutput};
use crate::error::ActuatorError;

pub struct HalOutput<P> {
    pin: P,
}

impl<P: OutputPin> HalOutput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin + Send> DigitalOutput for HalOutput<P> {
    fn write(&mut self, high: bool) -> Result<(), ActuatorError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|e| {
            debug!("gpio: {:?}", digital::Error::kind(&e));
            ActuatorError::GpioWriteFailed
        })
    }
}

/// PWM channel whose carrier is fixed when the channel is configured.
/// `SetDutyCycle` has no notion of frequency, so a request for a different
/// carrier is refused rather than silently ignored.
pub struct HalPwm<P> {
    channel: P,
    freq_hz: u32,
}

impl<P: SetDutyCycle> HalPwm<P> {
    pub fn new(channel: P, freq_hz: u32) -> Self {
        Self { channel, freq_hz }
    }
}

impl<P: SetDutyCycle + Send> PwmOutput for HalPwm<P> {
    fn open(&mut self, freq_hz: u32, duty_percent: u8) -> Result<(), ActuatorError> {
        if freq_hz != self.freq_hz {
            debug!("pwm: carrier {} Hz requested, channel fixed at {} Hz", freq_hz, self.freq_hz);
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.channel
            .set_duty_cycle_percent(duty_percent.min(100))
            .map_err(|e| {
                debug!("pwm: {:?}", pwm::Error::kind(&e));
                ActuatorError::PwmWriteFailed
            })
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        self.channel.set_duty_cycle_fully_off().map_err(|e| {
            debug!("pwm: {:?}", pwm::Error::kind(&e));
            ActuatorError::PwmWriteFailed
        })
    }
}
