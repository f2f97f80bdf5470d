//! Pressure-anomaly sensor.
//!
//! The sensor is a comparator stage with a single digital output; the
//! threshold is set in hardware.  This driver only resolves polarity and
//! handles read faults.

use embedded_hal::digital::InputPin;
use log::warn;

pub struct PressureSensor<P> {
    pin: P,
    active_high: bool,
    /// Latched while reads keep failing, so the fault is logged once.
    faulted: bool,
}

impl<P: InputPin> PressureSensor<P> {
    pub fn new(pin: P, active_high: bool) -> Self {
        Self {
            pin,
            active_high,
            faulted: false,
        }
    }

    /// `true` while the anomaly line is asserted.  A failed read counts as
    /// "no anomaly".
    pub fn is_triggered(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => {
                if self.faulted {
                    log::info!("PressureSensor: line readable again");
                    self.faulted = false;
                }
                high == self.active_high
            }
            Err(_) => {
                if !self.faulted {
                    warn!("PressureSensor: read failed, treating line as inactive");
                    self.faulted = true;
                }
                false
            }
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }
}
