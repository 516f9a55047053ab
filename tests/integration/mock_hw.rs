//! Mock adapters for integration tests.
//!
//! Records every peripheral call so tests can assert on the full command
//! history without touching real GPIO/PWM registers, and lets each test
//! script failures on the peripheral, link, and sensor side.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use simplikit::app::ports::{
    CloudLink, DigitalOutput, LinkError, MotionReading, PeripheralPort, PwmOutput, SensorPort,
};
use simplikit::error::{AcquireError, ActuatorError, SensorError};
use simplikit::thing_model::Report;

// ── Peripheral call record ────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    OpenOutput { gpio: i32 },
    OpenPwm { channel: u32, freq_hz: u32 },
    Write { gpio: i32, high: bool },
    PwmOpen { channel: u32, freq_hz: u32, duty: u8 },
    PwmClose { channel: u32 },
}

#[derive(Debug, Default)]
struct PortState {
    absent: bool,
    open_fails: bool,
    write_fails: bool,
    open_attempts: u32,
    calls: Vec<HwCall>,
}

// ── MockPeripherals ───────────────────────────────────────────

/// Recording [`PeripheralPort`].  Clones share the same record.
#[derive(Clone, Default)]
pub struct MockPeripherals {
    state: Arc<Mutex<PortState>>,
}

#[allow(dead_code)]
impl MockPeripherals {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port whose driver module is missing from the build.
    pub fn absent() -> Self {
        let port = Self::new();
        port.state().absent = true;
        port
    }

    fn state(&self) -> MutexGuard<'_, PortState> {
        self.state.lock().unwrap()
    }

    pub fn set_open_fails(&self, fails: bool) {
        self.state().open_fails = fails;
    }

    pub fn set_write_fails(&self, fails: bool) {
        self.state().write_fails = fails;
    }

    pub fn open_attempts(&self) -> u32 {
        self.state().open_attempts
    }

    pub fn calls(&self) -> Vec<HwCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Writes only (opens filtered out).
    pub fn writes(&self) -> Vec<HwCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, HwCall::OpenOutput { .. } | HwCall::OpenPwm { .. }))
            .collect()
    }

    fn open(&self, call: HwCall) -> Result<(), AcquireError> {
        let mut st = self.state();
        if st.absent {
            return Err(AcquireError::Absent);
        }
        st.open_attempts += 1;
        if st.open_fails {
            return Err(AcquireError::OpenFailed(-1));
        }
        st.calls.push(call);
        Ok(())
    }

    fn write(&self, call: HwCall, err: ActuatorError) -> Result<(), ActuatorError> {
        let mut st = self.state();
        if st.write_fails {
            return Err(err);
        }
        st.calls.push(call);
        Ok(())
    }
}

impl PeripheralPort for MockPeripherals {
    fn open_output(&self, gpio: i32) -> Result<Box<dyn DigitalOutput>, AcquireError> {
        self.open(HwCall::OpenOutput { gpio })?;
        Ok(Box::new(MockOutput {
            gpio,
            port: self.clone(),
        }))
    }

    fn open_pwm(
        &self,
        channel: u32,
        _gpio: i32,
        freq_hz: u32,
    ) -> Result<Box<dyn PwmOutput>, AcquireError> {
        self.open(HwCall::OpenPwm { channel, freq_hz })?;
        Ok(Box::new(MockPwm {
            channel,
            port: self.clone(),
        }))
    }
}

struct MockOutput {
    gpio: i32,
    port: MockPeripherals,
}

impl DigitalOutput for MockOutput {
    fn write(&mut self, high: bool) -> Result<(), ActuatorError> {
        self.port.write(
            HwCall::Write {
                gpio: self.gpio,
                high,
            },
            ActuatorError::GpioWriteFailed,
        )
    }
}

struct MockPwm {
    channel: u32,
    port: MockPeripherals,
}

impl PwmOutput for MockPwm {
    fn open(&mut self, freq_hz: u32, duty_percent: u8) -> Result<(), ActuatorError> {
        self.port.write(
            HwCall::PwmOpen {
                channel: self.channel,
                freq_hz,
                duty: duty_percent,
            },
            ActuatorError::PwmWriteFailed,
        )
    }

    fn close(&mut self) -> Result<(), ActuatorError> {
        self.port.write(
            HwCall::PwmClose {
                channel: self.channel,
            },
            ActuatorError::PwmWriteFailed,
        )
    }
}

// ── RecordingLink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingLink {
    pub disconnected: AtomicBool,
    pub fail_sends: AtomicBool,
    pub reports: Mutex<Vec<(u8, Report)>>,
    pub acks: Mutex<Vec<(u8, u32, Report)>>,
}

#[allow(dead_code)]
impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<(u8, Report)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<(u8, u32, Report)> {
        self.acks.lock().unwrap().clone()
    }
}

impl CloudLink for RecordingLink {
    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }

    fn send_report(&self, mode: u8, payload: &Report) -> Result<(), LinkError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LinkError::Timeout);
        }
        self.reports.lock().unwrap().push((mode, payload.clone()));
        Ok(())
    }

    fn ack_read(&self, mode: u8, payload: &Report, correlation_id: u32) -> Result<(), LinkError> {
        self.acks
            .lock()
            .unwrap()
            .push((mode, correlation_id, payload.clone()));
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LinkError::Timeout);
        }
        Ok(())
    }
}

// ── ScriptedSensors ───────────────────────────────────────────

/// Fixed readings with per-getter failure switches and call counters.
#[derive(Default)]
pub struct ScriptedSensors {
    pub fail_temperature_humidity: AtomicBool,
    pub fail_pressure_temperature: AtomicBool,
    pub fail_motion: AtomicBool,
    pub temperature_humidity_calls: AtomicU32,
    pub pressure_temperature_calls: AtomicU32,
    pub motion_calls: AtomicU32,
}

impl SensorPort for ScriptedSensors {
    fn temperature_humidity(&self) -> Result<Option<(f32, f32)>, SensorError> {
        self.temperature_humidity_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_temperature_humidity.load(Ordering::SeqCst) {
            return Err(SensorError::NotResponding);
        }
        Ok(Some((21.456, 38.0)))
    }

    fn pressure_temperature(&self) -> Result<Option<(f32, f32)>, SensorError> {
        self.pressure_temperature_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pressure_temperature.load(Ordering::SeqCst) {
            return Err(SensorError::NotResponding);
        }
        Ok(Some((1009.5, 22.0)))
    }

    fn motion(&self) -> Result<Option<MotionReading>, SensorError> {
        self.motion_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_motion.load(Ordering::SeqCst) {
            return Err(SensorError::NotResponding);
        }
        Ok(Some(([0.5, -0.25, 9.75], [1.0, 2.0, -3.0])))
    }
}
