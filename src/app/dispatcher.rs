//! Command dispatcher: routes thing-model traffic to its owners.
//!
//! ```text
//!                         ┌──────────────────────┐ ──▶ FanSupervisor
//!  CloudLink (inbound) ──▶│  CommandDispatcher    │ ──▶ BuzzerSupervisor
//!                         │  id → Route table     │ ──▶ SensorPort
//!  CloudLink (ack)     ◀──└──────────────────────┘
//! ```
//!
//! Collaborators are injected one by one and any of them may be missing.
//! Writes are applied entry by entry; one bad entry never aborts the
//! rest of the batch.  Reads query each collaborator at most once per
//! response and silently omit ids whose collaborator failed.

use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::Value;

use crate::actuators::{BuzzerSupervisor, FanSupervisor};
use crate::app::commands::{default_routes, ActuatorCommand, Route, RouteTable, SensorPoint};
use crate::app::ports::{CloudLink, MotionReading, SensorPort};
use crate::error::{Error, InputError, SensorError};
use crate::thing_model::{self as tsl, Axes, Report, TslId, TslValue};

/// Outcome counts for one command batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Entries that reached the hardware.
    pub applied: usize,
    /// Entries rejected at coercion or not applied by their owner.
    pub failed: usize,
    /// Unknown or read-only ids.
    pub ignored: usize,
}

pub struct CommandDispatcher {
    routes: RouteTable,
    link: Arc<dyn CloudLink>,
    fan: Option<Arc<FanSupervisor>>,
    buzzer: Option<Arc<BuzzerSupervisor>>,
    sensors: Option<Arc<dyn SensorPort>>,
}

impl CommandDispatcher {
    pub fn new(link: Arc<dyn CloudLink>) -> Self {
        Self {
            routes: default_routes(),
            link,
            fan: None,
            buzzer: None,
            sensors: None,
        }
    }

    pub fn with_fan(mut self, fan: Arc<FanSupervisor>) -> Self {
        self.fan = Some(fan);
        self
    }

    pub fn with_buzzer(mut self, buzzer: Arc<BuzzerSupervisor>) -> Self {
        self.buzzer = Some(buzzer);
        self
    }

    pub fn with_sensors(mut self, sensors: Arc<dyn SensorPort>) -> Self {
        self.sensors = Some(sensors);
        self
    }

    // ── Writes ────────────────────────────────────────────────

    /// Apply a batch of writes in order.
    pub fn dispatch_command(&self, batch: &[(TslId, Value)]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for (id, value) in batch {
            let Some(route) = self.routes.get(id).copied() else {
                warn!("dispatch: unknown id {}, ignored", id);
                summary.ignored += 1;
                continue;
            };

            match ActuatorCommand::decode(*id, route, value) {
                Ok(cmd) => {
                    if self.execute(cmd) {
                        summary.applied += 1;
                    } else {
                        warn!("dispatch: id {} not applied", id);
                        summary.failed += 1;
                    }
                }
                Err(InputError::ReadOnly(_)) => {
                    debug!("dispatch: id {} is read-only, ignored", id);
                    summary.ignored += 1;
                }
                Err(e) => {
                    warn!("dispatch: id {} value {}: {}", id, value, Error::from(e));
                    summary.failed += 1;
                }
            }
        }

        info!(
            "dispatch: {} applied, {} failed, {} ignored",
            summary.applied, summary.failed, summary.ignored
        );
        summary
    }

    fn execute(&self, cmd: ActuatorCommand) -> bool {
        match cmd {
            ActuatorCommand::FanSwitch(on) => self.fan().is_some_and(|f| f.set_on(on)),
            ActuatorCommand::FanMode(mode) => self.fan().is_some_and(|f| f.set_fan_mode(mode)),
            ActuatorCommand::BuzzerSwitch(on) => self.buzzer().is_some_and(|b| b.set_on(on)),
        }
    }

    fn fan(&self) -> Option<&FanSupervisor> {
        let fan = self.fan.as_deref();
        if fan.is_none() {
            warn!("dispatch: fan not fitted");
        }
        fan
    }

    fn buzzer(&self) -> Option<&BuzzerSupervisor> {
        let buzzer = self.buzzer.as_deref();
        if buzzer.is_none() {
            warn!("dispatch: buzzer not fitted");
        }
        buzzer
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Resolve `ids` into a report.  Unknown ids and ids whose
    /// collaborator is missing or failing are left out.
    pub fn build_read_response(&self, ids: &[TslId]) -> Report {
        let mut reads = Reads::new(self);
        let mut report = Report::new();

        for id in ids {
            let Some(route) = self.routes.get(id).copied() else {
                debug!("read: unknown id {}", id);
                continue;
            };
            let value = match route {
                Route::FanSwitch | Route::FanMode => reads.fan().and_then(|r| r.get(id).copied()),
                Route::BuzzerSwitch => reads.buzzer().and_then(|r| r.get(id).copied()),
                Route::Sensor(point) => reads.sensor(point),
            };
            match value {
                Some(v) => tsl::put(&mut report, *id, v),
                None => debug!("read: id {} unavailable, omitted", id),
            }
        }
        report
    }

    /// Build the response for a read request and acknowledge it.
    pub fn handle_read(&self, ids: &[TslId], correlation_id: u32) -> Report {
        let report = self.build_read_response(ids);
        if let Err(e) = self
            .link
            .ack_read(tsl::TSL_SEND_MODE, &report, correlation_id)
        {
            warn!("read: ack {} failed: {}", correlation_id, Error::from(e));
        }
        report
    }
}

// ── Per-response collaborator cache ───────────────────────────

/// Loads each collaborator's data on first use, at most once.
struct Lazy<T>(Option<Option<T>>);

impl<T> Lazy<T> {
    fn get(&mut self, load: impl FnOnce() -> Option<T>) -> Option<&T> {
        self.0.get_or_insert_with(load).as_ref()
    }
}

struct Reads<'a> {
    dispatcher: &'a CommandDispatcher,
    fan: Lazy<Report>,
    buzzer: Lazy<Report>,
    temperature_humidity: Lazy<(f32, f32)>,
    pressure_temperature: Lazy<(f32, f32)>,
    motion: Lazy<MotionReading>,
}

impl<'a> Reads<'a> {
    fn new(dispatcher: &'a CommandDispatcher) -> Self {
        Self {
            dispatcher,
            fan: Lazy(None),
            buzzer: Lazy(None),
            temperature_humidity: Lazy(None),
            pressure_temperature: Lazy(None),
            motion: Lazy(None),
        }
    }

    fn fan(&mut self) -> Option<&Report> {
        let fan = self.dispatcher.fan.as_deref();
        self.fan.get(|| fan.and_then(|f| logged("fan", f.report())))
    }

    fn buzzer(&mut self) -> Option<&Report> {
        let buzzer = self.dispatcher.buzzer.as_deref();
        self.buzzer.get(|| buzzer.and_then(|b| logged("buzzer", b.report())))
    }

    fn sensor(&mut self, point: SensorPoint) -> Option<TslValue> {
        let sensors = self.dispatcher.sensors.as_deref()?;
        let float = |v: f32| TslValue::Float(tsl::round2(v));
        match point {
            SensorPoint::Temperature1 | SensorPoint::Humidity => {
                let (t, h) = *self
                    .temperature_humidity
                    .get(|| sensor_logged(sensors.temperature_humidity()))?;
                Some(float(if point == SensorPoint::Humidity { h } else { t }))
            }
            SensorPoint::Pressure | SensorPoint::Temperature2 => {
                let (p, t) = *self
                    .pressure_temperature
                    .get(|| sensor_logged(sensors.pressure_temperature()))?;
                Some(float(if point == SensorPoint::Pressure { p } else { t }))
            }
            SensorPoint::Accelerometer | SensorPoint::Gyroscope => {
                let (accel, gyro) = *self.motion.get(|| sensor_logged(sensors.motion()))?;
                let axes = if point == SensorPoint::Gyroscope { gyro } else { accel };
                Some(TslValue::Axes(Axes::from_reading(axes)))
            }
        }
    }
}

fn logged(what: &str, result: Result<Report, Error>) -> Option<Report> {
    result
        .map_err(|e| warn!("read: {} status: {}", what, e))
        .ok()
}

fn sensor_logged<T>(result: Result<Option<T>, SensorError>) -> Option<T> {
    result.unwrap_or_else(|e| {
        warn!("read: {}", Error::from(e));
        None
    })
}
