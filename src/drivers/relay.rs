//! Indicator relay driver.
//!
//! A single digital output drives the relay coil; the relay switches the
//! indicator light.  `energize()` and `de_energize()` are idempotent: once
//! the physical state is known, a repeated request does not touch the pin.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`].  On ESP-IDF the pin is
//! a [`GpioPin`](crate::drivers::gpio::GpioPin) backed by real registers;
//! tests use recording mock pins.

use embedded_hal::digital::OutputPin;

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Energized,
    DeEnergized,
}

pub struct RelayDriver<P> {
    pin: P,
    active_high: bool,
    /// Physical state last written successfully.  `None` until the first
    /// write succeeds.
    state: Option<RelayState>,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the pin and drive it to the de-energised level.
    pub fn new(pin: P, active_high: bool) -> Self {
        let mut relay = Self {
            pin,
            active_high,
            state: None,
        };
        if relay.de_energize().is_err() {
            log::warn!("Relay: initial de-energise failed, state unknown until a write succeeds");
        }
        relay
    }

    pub fn energize(&mut self) -> Result<(), ActuatorError> {
        self.drive(RelayState::Energized)
    }

    pub fn de_energize(&mut self) -> Result<(), ActuatorError> {
        self.drive(RelayState::DeEnergized)
    }

    fn drive(&mut self, target: RelayState) -> Result<(), ActuatorError> {
        if self.state == Some(target) {
            return Ok(());
        }

        let high = matches!(target, RelayState::Energized) == self.active_high;
        let written = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        written.map_err(|_| ActuatorError::GpioWriteFailed)?;

        self.state = Some(target);
        Ok(())
    }

    pub fn state(&self) -> Option<RelayState> {
        self.state
    }

    pub fn is_energized(&self) -> bool {
        self.state == Some(RelayState::Energized)
    }

    /// Release the pin (tests and teardown).
    pub fn into_inner(self) -> P {
        self.pin
    }
}
