//! Application core: routing and coercion of thing-model traffic.
//!
//! Everything outside the process is reached through the **port traits**
//! in [`ports`]; the dispatcher and the supervisors it drives never touch
//! a vendor API directly.

pub mod commands;
pub mod dispatcher;
pub mod ports;
