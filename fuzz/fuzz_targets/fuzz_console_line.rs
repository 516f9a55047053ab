//! Fuzz target: `console::parse_line` + `command_batch` / `read_ids`
//!
//! Arbitrary text must either parse into an inbound message or fail with a
//! JSON error.  Every id in a resulting batch came from a numeric key.
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use simplikit::adapters::console::{Inbound, command_batch, parse_line, read_ids};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    match parse_line(line) {
        Ok(Inbound::Command { data }) => {
            let keys = data.len();
            let batch = command_batch(data);
            assert!(batch.len() <= keys, "batch larger than its source object");
        }
        Ok(Inbound::Read { ids, .. }) => {
            assert!(read_ids(&ids).len() <= ids.len());
        }
        _ => {}
    }
});
