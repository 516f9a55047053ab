//! Fuzz target: `CommandDispatcher::dispatch_command`
//!
//! Feeds arbitrary JSON objects as command batches to a dispatcher backed
//! by the simulated board.  Every entry must be counted exactly once and
//! the fan mode must stay within 1..=3.
//!
//! cargo fuzz run fuzz_command_batch

#![no_main]

use std::sync::Arc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};
use simplikit::actuators::{Buzzer, BuzzerSupervisor, Fan, FanSupervisor};
use simplikit::adapters::console::{ConsoleLink, command_batch};
use simplikit::adapters::sim::SimBoard;
use simplikit::app::dispatcher::CommandDispatcher;
use simplikit::config::HardwareConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(object) = serde_json::from_slice::<Map<String, Value>>(data) else {
        return;
    };
    let board = SimBoard::new();
    let budget = Duration::from_millis(50);
    let fan = Arc::new(FanSupervisor::new(
        Fan::new(&HardwareConfig::default()),
        Arc::new(board.clone()),
        budget,
    ));
    let buzzer = Arc::new(BuzzerSupervisor::new(
        Buzzer::new(36),
        Arc::new(board),
        budget,
    ));
    let dispatcher = CommandDispatcher::new(Arc::new(ConsoleLink::new(std::io::sink())))
        .with_fan(fan.clone())
        .with_buzzer(buzzer);

    let batch = command_batch(object);
    let summary = dispatcher.dispatch_command(&batch);
    assert_eq!(
        summary.applied + summary.failed + summary.ignored,
        batch.len(),
        "every entry is counted once"
    );
    let mode = fan.get_status().map(|s| s.state.mode.level());
    assert!(mode.is_ok_and(|m| (1..=3).contains(&m)));
});
