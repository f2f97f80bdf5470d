//! One-shot hardware peripheral initialization.
//!
//! Configures GPIO directions using raw ESP-IDF sys calls. Called once from
//! `main()` once the configuration is loaded, before the control loop starts.
//!
//! Host builds keep a table of simulated pin levels instead, so the same
//! [`GpioPin`](super::gpio::GpioPin) code runs in simulation and tests.

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization and raw pin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    GpioWriteFailed(i32),
    InvalidPin(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::GpioWriteFailed(rc) => write!(f, "GPIO write failed (rc={})", rc),
            Self::InvalidPin(pin) => write!(f, "GPIO {} out of range", pin),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::AlertConfig;

#[cfg(target_os = "espidf")]
use crate::pins;

/// Resting level of each line when nothing drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleLevels {
    /// The sensor is pulled towards its inactive level, so a disconnected
    /// sensor reads as "no anomaly".
    pub sensor_high: bool,
    /// The button is pulled towards its released level.
    pub button_high: bool,
    /// Level that keeps the relay de-energised.
    pub relay_high: bool,
}

impl IdleLevels {
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            sensor_high: !config.sensor_active_high,
            button_high: config.button_active_low,
            relay_high: !config.relay_active_high,
        }
    }
}

/// Configure the sensor and button inputs and the relay output.
/// The relay's idle level is written before the pin is switched to output
/// so the light never flickers at boot.
#[cfg(target_os = "espidf")]
pub fn init_peripherals(config: &AlertConfig) -> Result<(), HwInitError> {
    let idle = IdleLevels::from_config(config);
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_input(pins::SENSOR_GPIO, idle.sensor_high)?;
        init_gpio_input(pins::BUTTON_GPIO, idle.button_high)?;
        init_gpio_outputs(idle.relay_high)?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

/// Host: the simulated lines start at their idle levels.
#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(config: &AlertConfig) -> Result<(), HwInitError> {
    let idle = IdleLevels::from_config(config);
    sim_set_level(crate::pins::SENSOR_GPIO, idle.sensor_high)?;
    sim_set_level(crate::pins::BUTTON_GPIO, idle.button_high)?;
    sim_set_level(crate::pins::RELAY_GPIO, idle.relay_high)?;
    log::info!("hw_init(sim): lines set to idle levels");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

/// Polled once per cycle; no interrupts.  The pull resistor holds the
/// line at `idle_high` while nothing drives it.
#[cfg(target_os = "espidf")]
unsafe fn init_gpio_input(pin: i32, idle_high: bool) -> Result<(), HwInitError> {
    let (pull_up_en, pull_down_en) = if idle_high {
        (gpio_pullup_t_GPIO_PULLUP_ENABLE, gpio_pulldown_t_GPIO_PULLDOWN_DISABLE)
    } else {
        (gpio_pullup_t_GPIO_PULLUP_DISABLE, gpio_pulldown_t_GPIO_PULLDOWN_ENABLE)
    };
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en,
        pull_down_en,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: GPIO {} input, pulled {}", pin, if idle_high { "up" } else { "down" });
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> Result<bool, HwInitError> {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    Ok((unsafe { gpio_get_level(pin) }) != 0)
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> Result<bool, HwInitError> {
    let slot = sim_slot(pin)?;
    Ok(slot.load(Ordering::Acquire))
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs(relay_idle_high: bool) -> Result<(), HwInitError> {
    let pin = pins::RELAY_GPIO;

    let ret = unsafe { gpio_set_level(pin, u32::from(relay_idle_high)) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: relay output configured (GPIO {}, idle={})", pin, relay_idle_high);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), HwInitError> {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioWriteFailed(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), HwInitError> {
    sim_set_level(pin, high)
}

// ── Simulated levels (host) ───────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const SIM_PIN_COUNT: usize = 49;

/// Lines start HIGH until [`init_peripherals`] or a test sets them.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [AtomicBool; SIM_PIN_COUNT] = [const { AtomicBool::new(true) }; SIM_PIN_COUNT];

#[cfg(not(target_os = "espidf"))]
fn sim_slot(pin: i32) -> Result<&'static AtomicBool, HwInitError> {
    usize::try_from(pin)
        .ok()
        .and_then(|idx| SIM_LEVELS.get(idx))
        .ok_or(HwInitError::InvalidPin(pin))
}

/// Drive a simulated line (host only).  Used by simulations and tests to
/// stand in for the outside world.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) -> Result<(), HwInitError> {
    sim_slot(pin)?.store(high, Ordering::Release);
    Ok(())
}
