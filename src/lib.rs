//! SimpliKit bridge library.
//!
//! Exposes the actuator core, the dispatcher, and the adapters for
//! integration testing and for the binary.  All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod actuators;
pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
pub mod thing_model;
