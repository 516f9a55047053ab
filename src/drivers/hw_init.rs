//! Raw peripheral calls for the actuator outputs.
//!
//! Configures GPIO outputs and LEDC PWM channels using ESP-IDF sys calls.
//! Unlike a one-shot boot init, every function here may be called again
//! at runtime when a supervisor reconnects a lost peripheral.
//!
//! On builds without ESP-IDF the driver module is absent: every init call
//! fails with [`AcquireError::Absent`] and nothing else is reachable.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::error::{AcquireError, ActuatorError};

/// LEDC duty resolution used for every channel.
#[cfg(target_os = "espidf")]
const LEDC_DUTY_MAX: u32 = (1 << 10) - 1;

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_output_init(pin: i32) -> Result<(), AcquireError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: gpio_config only touches the pin named in the mask; callers
    // serialize access per pin through the owning supervisor's lock.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(AcquireError::OpenFailed(ret));
    }
    // SAFETY: pin was configured as an output just above.
    let ret = unsafe { gpio_set_level(pin, 0) };
    if ret != ESP_OK as i32 {
        return Err(AcquireError::OpenFailed(ret));
    }
    info!("hw_init: GPIO{} configured as output", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_output_init(_pin: i32) -> Result<(), AcquireError> {
    Err(AcquireError::Absent)
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), ActuatorError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::GpioWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> Result<(), ActuatorError> {
    Err(ActuatorError::GpioWriteFailed)
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn ledc_init(channel: u32, gpio: i32, freq_hz: u32) -> Result<(), AcquireError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_10_BIT,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: timer 0 is reserved for the fan; reconfiguring it with the
    // same parameters on reconnect is allowed by the driver.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(AcquireError::OpenFailed(ret));
    }

    // SAFETY: as above, channel config is idempotent for identical input.
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(AcquireError::OpenFailed(ret));
    }

    info!("hw_init: LEDC CH{} on GPIO{} at {} Hz", channel, gpio, freq_hz);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_init(_channel: u32, _gpio: i32, _freq_hz: u32) -> Result<(), AcquireError> {
    Err(AcquireError::Absent)
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty_percent: u8) -> Result<(), ActuatorError> {
    let duty = u32::from(duty_percent.min(100)) * LEDC_DUTY_MAX / 100;
    // SAFETY: channel was configured by ledc_init(); duty writes for one
    // channel are serialized by the owning supervisor's lock.
    unsafe {
        if ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty) != ESP_OK as i32 {
            return Err(ActuatorError::PwmWriteFailed);
        }
        if ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) != ESP_OK as i32 {
            return Err(ActuatorError::PwmWriteFailed);
        }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty_percent: u8) -> Result<(), ActuatorError> {
    Err(ActuatorError::PwmWriteFailed)
}

#[cfg(target_os = "espidf")]
pub fn ledc_stop(channel: u32) -> Result<(), ActuatorError> {
    // SAFETY: see ledc_set().
    let ret = unsafe { esp_idf_svc::sys::ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, 0) };
    if ret != ESP_OK as i32 {
        return Err(ActuatorError::PwmWriteFailed);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_stop(_channel: u32) -> Result<(), ActuatorError> {
    Err(ActuatorError::PwmWriteFailed)
}
