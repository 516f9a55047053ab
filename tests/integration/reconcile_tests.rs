//! Integration tests for the reconciliation loop: reconnect cadence,
//! periodic reports, and shutdown.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use simplikit::actuators::{Buzzer, BuzzerSupervisor, Fan, FanSupervisor, ReconcileTask};
use simplikit::config::{HardwareConfig, ReconcileConfig};
use simplikit::scheduler::{IntervalTicker, ManualTicks, Shutdown};
use simplikit::thing_model::{TSL_SEND_MODE, TslValue};

use crate::mock_hw::{HwCall, MockPeripherals, RecordingLink};

const BUDGET: Duration = Duration::from_millis(50);

fn fan_rig(port: &MockPeripherals) -> (Arc<FanSupervisor>, Arc<RecordingLink>) {
    let fan = Arc::new(FanSupervisor::new(
        Fan::new(&HardwareConfig::default()),
        Arc::new(port.clone()),
        BUDGET,
    ));
    (fan, Arc::new(RecordingLink::new()))
}

fn pwm_opens(port: &MockPeripherals) -> usize {
    port.calls()
        .iter()
        .filter(|c| matches!(c, HwCall::PwmOpen { .. }))
        .count()
}

#[test]
fn reconnect_is_attempted_on_schedule() {
    let port = MockPeripherals::new();
    port.set_open_fails(true);
    let (fan, link) = fan_rig(&port);
    assert!(!fan.set_on(true));
    let baseline = port.open_attempts();

    let mut task = ReconcileTask::new(fan.clone(), link, &ReconcileConfig::default());

    // Tick 1 attempts, ticks 2..=30 do not.
    task.step();
    assert_eq!(port.open_attempts(), baseline + 1);
    for _ in 2..=30 {
        task.step();
    }
    assert_eq!(port.open_attempts(), baseline + 1);

    // Driver comes back; tick 31 restores availability and reapplies once.
    port.set_open_fails(false);
    task.step();
    assert!(fan.is_hardware_available());
    assert_eq!(pwm_opens(&port), 1);
    assert_eq!(
        port.calls().last(),
        Some(&HwCall::PwmOpen {
            channel: 0,
            freq_hz: 100,
            duty: 10
        })
    );

    // Connected: later reconnect ticks do nothing.
    for _ in 32..=91 {
        task.step();
    }
    assert_eq!(pwm_opens(&port), 1);
    assert_eq!(port.open_attempts(), baseline + 2);
}

#[test]
fn reports_every_sixty_ticks_when_link_is_up() {
    let port = MockPeripherals::new();
    let (fan, link) = fan_rig(&port);
    assert!(fan.set_on(true));
    assert!(fan.set_mode(3));

    ReconcileTask::new(fan, link.clone(), &ReconcileConfig::default()).run(ManualTicks::new(121));

    let reports = link.reports();
    assert_eq!(reports.len(), 3, "ticks 1, 61 and 121");
    let (mode, report) = &reports[0];
    assert_eq!(*mode, TSL_SEND_MODE);
    let items: Vec<_> = report.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(items, vec![(11, TslValue::Bool(true)), (12, TslValue::Int(3))]);
}

#[test]
fn no_report_while_link_is_down() {
    let port = MockPeripherals::new();
    let (fan, link) = fan_rig(&port);
    link.set_connected(false);

    let mut task = ReconcileTask::new(fan, link.clone(), &ReconcileConfig::default());
    task.step();
    assert!(link.reports().is_empty());

    // Link comes back; the next report slot is tick 61.
    link.set_connected(true);
    for _ in 2..=60 {
        task.step();
    }
    assert!(link.reports().is_empty());
    task.step();
    assert_eq!(link.reports().len(), 1);
}

#[test]
fn report_is_sent_even_without_hardware() {
    let port = MockPeripherals::absent();
    let buzzer = Arc::new(BuzzerSupervisor::new(
        Buzzer::new(36),
        Arc::new(port.clone()),
        BUDGET,
    ));
    let link = Arc::new(RecordingLink::new());
    assert!(!buzzer.set_on(true));

    ReconcileTask::new(buzzer, link.clone(), &ReconcileConfig::default()).run(ManualTicks::new(1));

    let reports = link.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].1.get(&13), Some(&TslValue::Bool(true)));
    assert_eq!(port.open_attempts(), 0);
}

#[test]
fn failed_send_does_not_stop_the_loop() {
    let port = MockPeripherals::new();
    let (fan, link) = fan_rig(&port);
    link.fail_sends.store(true, Ordering::SeqCst);
    let cfg = ReconcileConfig {
        report_every_ticks: 1,
        ..ReconcileConfig::default()
    };

    let mut task = ReconcileTask::new(fan, link.clone(), &cfg);
    task.step();
    task.step();
    link.fail_sends.store(false, Ordering::SeqCst);
    task.step();
    assert_eq!(link.reports().len(), 1);
}

#[test]
fn spawned_loop_stops_on_shutdown() {
    let port = MockPeripherals::new();
    let (fan, link) = fan_rig(&port);
    let shutdown = Arc::new(Shutdown::new());
    let cfg = ReconcileConfig {
        wake_interval_ms: 5,
        ..ReconcileConfig::default()
    };

    let handle = ReconcileTask::new(fan, link.clone(), &cfg)
        .spawn(IntervalTicker::new(cfg.wake_interval(), shutdown.clone()))
        .unwrap();
    assert_eq!(handle.thread().name(), Some("reconcile-fan"));

    std::thread::sleep(Duration::from_millis(30));
    shutdown.trigger();
    handle.join().unwrap();

    // The first tick reports immediately.
    assert!(!link.reports().is_empty());
}
