//! Simulated board for host runs.
//!
//! Pins are plain `embedded_hal` implementations wrapped in the
//! [`HalOutput`]/[`HalPwm`] bridges, so the host exercises the same driver
//! path as any HAL-backed board.  All pins share one state block, which
//! doubles as the fault-injection surface: a driver can be made absent,
//! opens can be made to fail, and writes can be made to fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::{debug, info};

use crate::app::ports::{DigitalOutput, MotionReading, PeripheralPort, PwmOutput, SensorPort};
use crate::drivers::hal::{HalOutput, HalPwm};
use crate::error::{AcquireError, SensorError};

#[derive(Debug, Default)]
struct BoardState {
    absent: bool,
    open_failures: u32,
    write_fails: bool,
    opens: u32,
    levels: HashMap<i32, bool>,
    duties: HashMap<u32, u8>,
}

/// In-memory peripheral port.  Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SimBoard {
    state: Arc<Mutex<BoardState>>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `false` makes every open fail permanently with [`AcquireError::Absent`].
    pub fn set_present(&self, present: bool) {
        self.state().absent = !present;
    }

    /// The next `n` opens fail with a transient error.
    pub fn fail_next_opens(&self, n: u32) {
        self.state().open_failures = n;
    }

    /// While set, every pin write fails.
    pub fn set_write_fails(&self, fails: bool) {
        self.state().write_fails = fails;
    }

    /// Last level written to `gpio`, if any.
    pub fn level(&self, gpio: i32) -> Option<bool> {
        self.state().levels.get(&gpio).copied()
    }

    /// Last duty (percent) written to PWM `channel`, if any.
    pub fn duty(&self, channel: u32) -> Option<u8> {
        self.state().duties.get(&channel).copied()
    }

    /// Successful opens so far.
    pub fn opens(&self) -> u32 {
        self.state().opens
    }

    fn check_open(&self) -> Result<(), AcquireError> {
        let mut st = self.state();
        if st.absent {
            return Err(AcquireError::Absent);
        }
        if st.open_failures > 0 {
            st.open_failures -= 1;
            return Err(AcquireError::OpenFailed(-1));
        }
        st.opens += 1;
        Ok(())
    }
}

impl PeripheralPort for SimBoard {
    fn open_output(&self, gpio: i32) -> Result<Box<dyn DigitalOutput>, AcquireError> {
        self.check_open()?;
        let mut pin = SimPin {
            gpio,
            board: self.clone(),
        };
        pin.set_low().map_err(|_| AcquireError::OpenFailed(-2))?;
        info!("sim: GPIO{} opened", gpio);
        Ok(Box::new(HalOutput::new(pin)))
    }

    fn open_pwm(
        &self,
        channel: u32,
        gpio: i32,
        freq_hz: u32,
    ) -> Result<Box<dyn PwmOutput>, AcquireError> {
        self.check_open()?;
        let mut ch = SimPwm {
            channel,
            board: self.clone(),
        };
        ch.set_duty_cycle_fully_off()
            .map_err(|_| AcquireError::OpenFailed(-2))?;
        info!("sim: PWM{} on GPIO{} opened at {} Hz", channel, gpio, freq_hz);
        Ok(Box::new(HalPwm::new(ch, freq_hz)))
    }
}

// ── embedded-hal pins ─────────────────────────────────────────

/// Injected write failure.
#[derive(Debug, Clone, Copy)]
pub struct SimFault;

impl digital::Error for SimFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for SimFault {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

struct SimPin {
    gpio: i32,
    board: SimBoard,
}

impl SimPin {
    fn set(&mut self, high: bool) -> Result<(), SimFault> {
        let mut st = self.board.state();
        if st.write_fails {
            return Err(SimFault);
        }
        st.levels.insert(self.gpio, high);
        debug!("sim: GPIO{} <- {}", self.gpio, high);
        Ok(())
    }
}

impl digital::ErrorType for SimPin {
    type Error = SimFault;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), SimFault> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), SimFault> {
        self.set(true)
    }
}

/// Duty is tracked in whole percent: `max_duty_cycle` is 100.
struct SimPwm {
    channel: u32,
    board: SimBoard,
}

impl pwm::ErrorType for SimPwm {
    type Error = SimFault;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), SimFault> {
        let mut st = self.board.state();
        if st.write_fails {
            return Err(SimFault);
        }
        let pct = u8::try_from(duty.min(100)).unwrap_or(100);
        st.duties.insert(self.channel, pct);
        debug!("sim: PWM{} <- {}%", self.channel, pct);
        Ok(())
    }
}

// ── Sensors ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct SensorState {
    failing: bool,
    temperature_humidity: Option<(f32, f32)>,
    pressure_temperature: Option<(f32, f32)>,
    motion: Option<MotionReading>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            failing: false,
            temperature_humidity: Some((22.5, 41.0)),
            pressure_temperature: Some((1013.25, 22.8)),
            motion: Some(([0.0, 0.0, 9.81], [0.0, 0.0, 0.0])),
        }
    }
}

/// Fixed sensor readings with a failure switch.
#[derive(Debug, Clone, Default)]
pub struct SimSensors {
    state: Arc<Mutex<SensorState>>,
}

impl SimSensors {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn set_temperature_humidity(&self, v: Option<(f32, f32)>) {
        self.state().temperature_humidity = v;
    }

    pub fn set_pressure_temperature(&self, v: Option<(f32, f32)>) {
        self.state().pressure_temperature = v;
    }

    pub fn set_motion(&self, v: Option<MotionReading>) {
        self.state().motion = v;
    }

    fn read<T>(&self, pick: impl FnOnce(&SensorState) -> Option<T>) -> Result<Option<T>, SensorError> {
        let st = self.state();
        if st.failing {
            return Err(SensorError::NotResponding);
        }
        Ok(pick(&st))
    }
}

impl SensorPort for SimSensors {
    fn temperature_humidity(&self) -> Result<Option<(f32, f32)>, SensorError> {
        self.read(|s| s.temperature_humidity)
    }

    fn pressure_temperature(&self) -> Result<Option<(f32, f32)>, SensorError> {
        self.read(|s| s.pressure_temperature)
    }

    fn motion(&self) -> Result<Option<MotionReading>, SensorError> {
        self.read(|s| s.motion)
    }
}
