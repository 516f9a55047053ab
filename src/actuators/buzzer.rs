//! Buzzer on a single digital output.

use crate::actuators::{Actuator, ActuatorStatus};
use crate::app::ports::{DigitalOutput, PeripheralPort};
use crate::drivers::handle::Peripheral;
use crate::error::{AcquireError, ActuatorError};
use crate::thing_model::{self, Report};

#[derive(Debug, Clone, Copy)]
pub struct Buzzer {
    gpio: i32,
}

impl Buzzer {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuzzerState {
    pub on: bool,
}

impl Actuator for Buzzer {
    type State = BuzzerState;
    type Driver = Box<dyn DigitalOutput>;

    const NAME: &'static str = "buzzer";

    fn peripheral(&self) -> Peripheral {
        Peripheral::Gpio(self.gpio)
    }

    fn open(&self, port: &dyn PeripheralPort) -> Result<Self::Driver, AcquireError> {
        port.open_output(self.gpio)
    }

    fn apply(&self, state: &BuzzerState, driver: &mut Self::Driver) -> Result<(), ActuatorError> {
        driver.write(state.on)
    }

    fn is_on(state: &BuzzerState) -> bool {
        state.on
    }

    fn set_on(state: &mut BuzzerState, on: bool) {
        state.on = on;
    }

    fn report(status: &ActuatorStatus<BuzzerState>) -> Report {
        let mut r = Report::new();
        thing_model::put(&mut r, thing_model::BUZZER_SWITCH, status.state.on);
        r
    }
}
