//! Peripheral assignments for the SimpliKit carrier board.
//!
//! Single source of truth for the defaults: every actuator references
//! this module rather than hard-coding pin numbers.  The values can be
//! overridden from the device config file.

// ---------------------------------------------------------------------------
// Buzzer (active buzzer behind an NPN driver)
// ---------------------------------------------------------------------------

/// Digital output: HIGH = buzzer sounding.
pub const BUZZER_GPIO: i32 = 36;

// ---------------------------------------------------------------------------
// Fan (brushless fan, low-side MOSFET on PWM)
// ---------------------------------------------------------------------------

/// PWM channel driving the fan MOSFET gate.
pub const FAN_PWM_CHANNEL: u32 = 0;
/// Output pin routed to the fan PWM channel.
pub const FAN_PWM_GPIO: i32 = 21;
/// Fan PWM carrier frequency.  Fixed: the duty table in
/// [`FanMode::duty_percent`](crate::actuators::fan::FanMode::duty_percent)
/// is only valid at this frequency.
pub const FAN_PWM_FREQ_HZ: u32 = 100;
