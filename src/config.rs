//! Device configuration
//!
//! Loaded once at start-up from the device JSON file.  The cloud keys use
//! the platform's own spelling so the same file can be shared with the
//! provisioning tooling; everything else is optional and falls back to the
//! defaults below.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Core device configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(flatten)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Thing-model platform credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(rename = "QTH_PRODUCT_KEY")]
    pub product_key: String,
    #[serde(rename = "QTH_PRODUCT_SECRET")]
    pub product_secret: String,
    #[serde(rename = "QTH_SERVER")]
    pub server: String,
    #[serde(rename = "APP_version")]
    pub app_version: String,
}

/// Peripheral assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Buzzer output pin
    pub buzzer_gpio: i32,
    /// Fan PWM channel
    pub fan_pwm_channel: u32,
    /// Pin routed to the fan PWM channel
    pub fan_pwm_gpio: i32,
    /// Fan PWM carrier (Hz); only 100 is accepted
    pub fan_pwm_freq_hz: u32,
}

/// Reconciliation loop cadence and call budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Loop wake interval (milliseconds)
    pub wake_interval_ms: u64,
    /// Reconnect attempt every N wake-ups
    pub reconnect_every_ticks: u32,
    /// Status report every N wake-ups
    pub report_every_ticks: u32,
    /// Budget for one outbound report (milliseconds)
    pub report_timeout_ms: u64,
    /// Budget for one hardware write (milliseconds)
    pub hardware_call_budget_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            product_key: String::new(),
            product_secret: String::new(),
            server: String::new(),
            app_version: String::from(env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            buzzer_gpio: pins::BUZZER_GPIO,
            fan_pwm_channel: pins::FAN_PWM_CHANNEL,
            fan_pwm_gpio: pins::FAN_PWM_GPIO,
            fan_pwm_freq_hz: pins::FAN_PWM_FREQ_HZ,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            wake_interval_ms: 2000,     // 0.5 Hz
            reconnect_every_ticks: 30,  // 1/min
            report_every_ticks: 60,     // 1/2min
            report_timeout_ms: 5000,
            hardware_call_budget_ms: 50,
        }
    }
}

impl ReconcileConfig {
    pub fn wake_interval(&self) -> Duration {
        Duration::from_millis(self.wake_interval_ms)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }

    pub fn hardware_call_budget(&self) -> Duration {
        Duration::from_millis(self.hardware_call_budget_ms)
    }
}

impl DeviceConfig {
    /// Parse and validate the JSON config file contents.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            log::warn!("config: {}", e);
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field the core depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reconcile;
        if r.wake_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("wake_interval_ms must be > 0"));
        }
        if r.reconnect_every_ticks == 0 {
            return Err(ConfigError::ValidationFailed("reconnect_every_ticks must be > 0"));
        }
        if r.report_every_ticks == 0 {
            return Err(ConfigError::ValidationFailed("report_every_ticks must be > 0"));
        }
        if self.hardware.fan_pwm_freq_hz != pins::FAN_PWM_FREQ_HZ {
            return Err(ConfigError::ValidationFailed("fan_pwm_freq_hz must be 100"));
        }
        if self.hardware.buzzer_gpio < 0 || self.hardware.fan_pwm_gpio < 0 {
            return Err(ConfigError::ValidationFailed("gpio numbers must be >= 0"));
        }
        Ok(())
    }
}
