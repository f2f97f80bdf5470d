//! Input subsystem: the pressure sensor, the acknowledgement button, and
//! the aggregating [`InputSampler`].
//!
//! The sampler owns both input lines and produces an [`InputSnapshot`]
//! once per cycle; the snapshot is all the controller ever sees of them.

pub mod pressure;

use embedded_hal::digital::InputPin;
use log::warn;

use crate::config::AlertConfig;
use crate::drivers::button::DebouncedButton;
use crate::fsm::context::InputSnapshot;
use pressure::PressureSensor;

/// Reads both inputs and runs the button debounce guard.
pub struct InputSampler<S, B> {
    sensor: PressureSensor<S>,
    button_pin: B,
    button_active_low: bool,
    button: DebouncedButton,
    button_faulted: bool,
}

impl<S: InputPin, B: InputPin> InputSampler<S, B> {
    /// Pins must already be configured as inputs.
    pub fn new(sensor_pin: S, button_pin: B, config: &AlertConfig) -> Self {
        Self {
            sensor: PressureSensor::new(sensor_pin, config.sensor_active_high),
            button_pin,
            button_active_low: config.button_active_low,
            button: DebouncedButton::new(config.debounce_ms),
            button_faulted: false,
        }
    }

    /// Sample both lines.  Read failures count as inactive.
    pub fn sample(&mut self, now_ms: u32) -> InputSnapshot {
        let sensor_triggered = self.sensor.is_triggered();
        let pressed = self.button_pressed();

        InputSnapshot {
            sensor_triggered,
            button_accepted: self.button.poll(pressed, now_ms),
        }
    }

    fn button_pressed(&mut self) -> bool {
        match self.button_pin.is_high() {
            Ok(high) => {
                self.button_faulted = false;
                high != self.button_active_low
            }
            Err(_) => {
                if !self.button_faulted {
                    warn!("InputSampler: button read failed, treating as released");
                    self.button_faulted = true;
                }
                false
            }
        }
    }
}
