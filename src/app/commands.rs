//! Inbound thing-model commands.
//!
//! The platform delivers writes as `id → JSON value` pairs.  Each id is
//! routed once through a fixed table; values are coerced the way the
//! platform's scripting runtime would coerce them (see [`truthy`] and
//! [`to_int`]) and turned into a typed [`ActuatorCommand`].

use heapless::LinearMap;
use serde_json::Value;

use crate::actuators::FanMode;
use crate::error::InputError;
use crate::thing_model::{self as tsl, TslId};

/// Routing table capacity.
pub const MAX_ROUTES: usize = 16;

pub type RouteTable = LinearMap<TslId, Route, MAX_ROUTES>;

/// Where a thing-model id is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FanSwitch,
    FanMode,
    BuzzerSwitch,
    /// Read-only sensor point.
    Sensor(SensorPoint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorPoint {
    Temperature1,
    Humidity,
    Temperature2,
    Pressure,
    Gyroscope,
    Accelerometer,
}

/// A validated write for one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    FanSwitch(bool),
    FanMode(FanMode),
    BuzzerSwitch(bool),
}

impl ActuatorCommand {
    /// Coerce `value` for the write routed at `route`.
    pub fn decode(id: TslId, route: Route, value: &Value) -> Result<Self, InputError> {
        match route {
            Route::FanSwitch => Ok(Self::FanSwitch(truthy(value))),
            Route::BuzzerSwitch => Ok(Self::BuzzerSwitch(truthy(value))),
            Route::FanMode => Ok(Self::FanMode(FanMode::try_from(to_int(value)?)?)),
            Route::Sensor(_) => Err(InputError::ReadOnly(id)),
        }
    }
}

/// The device's id → route table.
pub fn default_routes() -> RouteTable {
    const TABLE: [(TslId, Route); 9] = [
        (tsl::TEMPERATURE_1, Route::Sensor(SensorPoint::Temperature1)),
        (tsl::HUMIDITY, Route::Sensor(SensorPoint::Humidity)),
        (tsl::TEMPERATURE_2, Route::Sensor(SensorPoint::Temperature2)),
        (tsl::PRESSURE, Route::Sensor(SensorPoint::Pressure)),
        (tsl::GYROSCOPE, Route::Sensor(SensorPoint::Gyroscope)),
        (tsl::ACCELEROMETER, Route::Sensor(SensorPoint::Accelerometer)),
        (tsl::FAN_SWITCH, Route::FanSwitch),
        (tsl::FAN_MODE, Route::FanMode),
        (tsl::BUZZER_SWITCH, Route::BuzzerSwitch),
    ];

    let mut routes = RouteTable::new();
    for (id, route) in TABLE {
        if routes.insert(id, route).is_err() {
            log::error!("routes: table full at id {}", id);
        }
    }
    routes
}

// ── Value coercion ────────────────────────────────────────────

/// Truthiness: `null`, `false`, zero, and empty strings/arrays/objects are
/// false; everything else is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Integer coercion: floats truncate toward zero, booleans are 0/1, strings
/// are parsed after trimming.  Anything else is rejected.
pub fn to_int(value: &Value) -> Result<i64, InputError> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
                _ => Err(InputError::NotAnInteger),
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| InputError::NotAnInteger),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(InputError::NotAnInteger),
    }
}
