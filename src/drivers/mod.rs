//! Peripheral handles, raw output calls, and embedded-hal bridges.

pub mod hal;
pub mod handle;
pub mod hw_init;
