//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements       | Connects to                  |
//! |---------------|------------------|------------------------------|
//! | `hardware`    | PeripheralPort   | ESP32 GPIO, LEDC PWM         |
//! | `sim`         | PeripheralPort   | In-memory embedded-hal pins  |
//! |               | SensorPort       | Fixed readings               |
//! | `console`     | CloudLink        | NDJSON on stdin/stdout       |
//! | `config_file` | ConfigPort       | JSON file on the filesystem  |

pub mod config_file;
pub mod console;
pub mod hardware;
pub mod sim;
