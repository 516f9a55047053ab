//! Thing-model identifiers and values.
//!
//! The cloud platform addresses every data point of the device by a small
//! integer id.  These ids are part of the product definition on the
//! platform side and must never be renumbered.

use heapless::FnvIndexMap;
use serde::{Deserialize, Serialize};

/// Thing-model data point id.
pub type TslId = u16;

pub const TEMPERATURE_1: TslId = 3;
pub const HUMIDITY: TslId = 4;
pub const TEMPERATURE_2: TslId = 5;
pub const PRESSURE: TslId = 6;
pub const GYROSCOPE: TslId = 9;
pub const ACCELEROMETER: TslId = 10;
pub const FAN_SWITCH: TslId = 11;
pub const FAN_MODE: TslId = 12;
pub const BUZZER_SWITCH: TslId = 13;

/// Send mode used for periodic reports and read acknowledgements.
pub const TSL_SEND_MODE: u8 = 1;

/// Maximum number of points in one report.
pub const REPORT_CAPACITY: usize = 16;

/// Outbound payload: insertion-ordered id → value map.
pub type Report = FnvIndexMap<TslId, TslValue, REPORT_CAPACITY>;

/// A single thing-model value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TslValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Axes(Axes),
}

/// Three-axis reading encoded as the platform's `{1: x, 2: y, 3: z}` struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    #[serde(rename = "1")]
    pub x: f64,
    #[serde(rename = "2")]
    pub y: f64,
    #[serde(rename = "3")]
    pub z: f64,
}

impl Axes {
    pub fn from_reading(v: [f32; 3]) -> Self {
        Self {
            x: round2(v[0]),
            y: round2(v[1]),
            z: round2(v[2]),
        }
    }
}

impl From<bool> for TslValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for TslValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Axes> for TslValue {
    fn from(v: Axes) -> Self {
        Self::Axes(v)
    }
}

/// Sensor values are published with two decimals.
pub fn round2(v: f32) -> f64 {
    (f64::from(v) * 100.0).round() / 100.0
}

/// Insert into a report, logging instead of failing when it is full.
pub fn put(report: &mut Report, id: TslId, value: impl Into<TslValue>) {
    if report.insert(id, value.into()).is_err() {
        log::warn!("report: capacity reached, dropping id {}", id);
    }
}
