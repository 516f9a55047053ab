//! Integration tests for the command dispatcher: batch writes, read
//! responses, and acknowledgements.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use simplikit::actuators::{Buzzer, BuzzerSupervisor, Fan, FanMode, FanSupervisor};
use simplikit::adapters::console::{self, ConsoleLink};
use simplikit::app::dispatcher::{CommandDispatcher, DispatchSummary};
use simplikit::config::HardwareConfig;
use simplikit::thing_model::{Axes, TSL_SEND_MODE, TslValue};

use crate::mock_hw::{HwCall, MockPeripherals, RecordingLink, ScriptedSensors};

const BUDGET: Duration = Duration::from_millis(50);

struct Rig {
    port: MockPeripherals,
    link: Arc<RecordingLink>,
    sensors: Arc<ScriptedSensors>,
    fan: Arc<FanSupervisor>,
    buzzer: Arc<BuzzerSupervisor>,
}

impl Rig {
    fn new() -> Self {
        let port = MockPeripherals::new();
        let fan = Arc::new(FanSupervisor::new(
            Fan::new(&HardwareConfig::default()),
            Arc::new(port.clone()),
            BUDGET,
        ));
        let buzzer = Arc::new(BuzzerSupervisor::new(
            Buzzer::new(36),
            Arc::new(port.clone()),
            BUDGET,
        ));
        port.clear_calls();
        Self {
            port,
            link: Arc::new(RecordingLink::new()),
            sensors: Arc::new(ScriptedSensors::default()),
            fan,
            buzzer,
        }
    }

    fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(self.link.clone())
            .with_fan(self.fan.clone())
            .with_buzzer(self.buzzer.clone())
            .with_sensors(self.sensors.clone())
    }
}

// ── Writes ────────────────────────────────────────────────────

#[test]
fn batch_isolation() {
    let rig = Rig::new();
    let summary = rig.dispatcher().dispatch_command(&[
        (11, json!(1)),
        (12, json!("bad")),
        (13, json!(0)),
    ]);

    assert_eq!(
        summary,
        DispatchSummary {
            applied: 2,
            failed: 1,
            ignored: 0
        }
    );
    assert_eq!(
        rig.port.calls(),
        vec![
            HwCall::PwmOpen {
                channel: 0,
                freq_hz: 100,
                duty: 10
            },
            HwCall::Write {
                gpio: 36,
                high: false
            },
        ]
    );
    assert_eq!(rig.fan.get_status().unwrap().state.mode, FanMode::Low);
}

#[test]
fn string_and_float_values_are_coerced() {
    let rig = Rig::new();
    let d = rig.dispatcher();
    assert_eq!(d.dispatch_command(&[(11, json!("yes")), (12, json!(" 3 "))]).applied, 2);
    assert_eq!(d.dispatch_command(&[(12, json!(2.7))]).applied, 1);

    let st = rig.fan.get_status().unwrap().state;
    assert!(st.on);
    assert_eq!(st.mode, FanMode::Medium);
}

#[test]
fn out_of_range_mode_is_counted_as_failed() {
    let rig = Rig::new();
    let summary = rig.dispatcher().dispatch_command(&[(12, json!(9))]);
    assert_eq!(summary.failed, 1);
    assert!(rig.port.calls().is_empty());
}

#[test]
fn unknown_and_read_only_ids_are_ignored() {
    let rig = Rig::new();
    let summary = rig
        .dispatcher()
        .dispatch_command(&[(99, json!(true)), (4, json!(50)), (13, json!(true))]);
    assert_eq!(summary.ignored, 2);
    assert_eq!(summary.applied, 1);
}

// ── Reads ─────────────────────────────────────────────────────

#[test]
fn partial_read_tolerance_with_missing_buzzer() {
    let rig = Rig::new();
    let d = CommandDispatcher::new(rig.link.clone()).with_fan(rig.fan.clone());

    let report = d.handle_read(&[11, 12, 13, 99], 42);
    let ids: Vec<_> = report.keys().copied().collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(report.get(&11), Some(&TslValue::Bool(false)));
    assert_eq!(report.get(&12), Some(&TslValue::Int(1)));

    let acks = rig.link.acks();
    assert_eq!(acks.len(), 1);
    assert_eq!(acks[0].0, TSL_SEND_MODE);
    assert_eq!(acks[0].1, 42);
    assert_eq!(acks[0].2, report);
}

#[test]
fn ack_is_sent_even_for_empty_response() {
    let rig = Rig::new();
    let report = rig.dispatcher().handle_read(&[99], 3);
    assert!(report.is_empty());
    assert_eq!(rig.link.acks().len(), 1);
}

#[test]
fn each_sensor_is_queried_once_per_response() {
    let rig = Rig::new();
    let report = rig.dispatcher().build_read_response(&[3, 4, 5, 6, 9, 10, 3]);

    assert_eq!(rig.sensors.temperature_humidity_calls.load(Ordering::SeqCst), 1);
    assert_eq!(rig.sensors.pressure_temperature_calls.load(Ordering::SeqCst), 1);
    assert_eq!(rig.sensors.motion_calls.load(Ordering::SeqCst), 1);

    assert_eq!(report.get(&3), Some(&TslValue::Float(21.46)));
    assert_eq!(report.get(&4), Some(&TslValue::Float(38.0)));
    assert_eq!(report.get(&5), Some(&TslValue::Float(22.0)));
    assert_eq!(report.get(&6), Some(&TslValue::Float(1009.5)));
    assert_eq!(
        report.get(&9),
        Some(&TslValue::Axes(Axes {
            x: 1.0,
            y: 2.0,
            z: -3.0
        }))
    );
    assert_eq!(
        report.get(&10),
        Some(&TslValue::Axes(Axes {
            x: 0.5,
            y: -0.25,
            z: 9.75
        }))
    );
}

#[test]
fn failing_sensor_omits_only_its_ids() {
    let rig = Rig::new();
    rig.sensors
        .fail_temperature_humidity
        .store(true, Ordering::SeqCst);
    let report = rig.dispatcher().build_read_response(&[3, 4, 5, 11]);
    let ids: Vec<_> = report.keys().copied().collect();
    assert_eq!(ids, vec![5, 11]);
}

#[test]
fn reads_never_touch_hardware() {
    let rig = Rig::new();
    rig.dispatcher().build_read_response(&[11, 12, 13]);
    assert!(rig.port.calls().is_empty());
}

// ── Console round trip ────────────────────────────────────────

#[test]
fn console_lines_drive_the_dispatcher() {
    let rig = Rig::new();
    let link = Arc::new(ConsoleLink::new(Vec::new()));
    let d = CommandDispatcher::new(link.clone())
        .with_fan(rig.fan.clone())
        .with_buzzer(rig.buzzer.clone());

    let input = concat!(
        "{\"type\":\"command\",\"data\":{\"11\":true,\"12\":2}}\n",
        "garbage\n",
        "\n",
        "{\"type\":\"read\",\"ids\":[11,12],\"pkg_id\":5}\n",
    );
    console::serve(input.as_bytes(), &d, &*link).unwrap();
    drop(d);

    let link = Arc::try_unwrap(link).ok().expect("dispatcher dropped");
    let out = String::from_utf8(link.into_inner()).unwrap();
    assert_eq!(
        out,
        "{\"type\":\"ack\",\"mode\":1,\"pkg_id\":5,\"data\":{\"11\":true,\"12\":2}}\n"
    );
}
