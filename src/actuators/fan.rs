//! Fan on one PWM channel with a fixed 100 Hz carrier.

use serde::{Deserialize, Serialize};

use crate::actuators::{Actuator, ActuatorStatus};
use crate::app::ports::{PeripheralPort, PwmOutput};
use crate::config::HardwareConfig;
use crate::drivers::handle::Peripheral;
use crate::error::{AcquireError, ActuatorError, InputError};
use crate::thing_model::{self, Report};

/// Speed level.  Wire values 1..=3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum FanMode {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl FanMode {
    /// Duty cycle for this level.  The board's supply browns out above
    /// 25 %, so these values are upper bounds, not tuning knobs.
    pub const fn duty_percent(self) -> u8 {
        match self {
            Self::Low => 10,
            Self::Medium => 18,
            Self::High => 25,
        }
    }

    pub const fn level(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for FanMode {
    type Error = InputError;

    fn try_from(v: i64) -> Result<Self, InputError> {
        match v {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            _ => Err(InputError::ModeOutOfRange(v)),
        }
    }
}

impl From<FanMode> for i64 {
    fn from(m: FanMode) -> Self {
        m.level()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanState {
    pub on: bool,
    pub mode: FanMode,
}

#[derive(Debug, Clone, Copy)]
pub struct Fan {
    channel: u32,
    gpio: i32,
    freq_hz: u32,
}

impl Fan {
    pub fn new(hw: &HardwareConfig) -> Self {
        Self {
            channel: hw.fan_pwm_channel,
            gpio: hw.fan_pwm_gpio,
            freq_hz: hw.fan_pwm_freq_hz,
        }
    }
}

impl Actuator for Fan {
    type State = FanState;
    type Driver = Box<dyn PwmOutput>;

    const NAME: &'static str = "fan";

    fn peripheral(&self) -> Peripheral {
        Peripheral::Pwm {
            channel: self.channel,
            gpio: self.gpio,
        }
    }

    fn open(&self, port: &dyn PeripheralPort) -> Result<Self::Driver, AcquireError> {
        port.open_pwm(self.channel, self.gpio, self.freq_hz)
    }

    fn apply(&self, state: &FanState, driver: &mut Self::Driver) -> Result<(), ActuatorError> {
        if state.on {
            driver.open(self.freq_hz, state.mode.duty_percent())
        } else {
            driver.close()
        }
    }

    fn is_on(state: &FanState) -> bool {
        state.on
    }

    fn set_on(state: &mut FanState, on: bool) {
        state.on = on;
    }

    fn report(status: &ActuatorStatus<FanState>) -> Report {
        let mut r = Report::new();
        thing_model::put(&mut r, thing_model::FAN_SWITCH, status.state.on);
        thing_model::put(&mut r, thing_model::FAN_MODE, status.state.mode.level());
        r
    }
}
