//! `embedded-hal` digital pins over the raw [`hw_init`](super::hw_init)
//! helpers.
//!
//! The pins must already be configured by
//! [`hw_init::init_peripherals`](super::hw_init::init_peripherals); a
//! `GpioPin` only reads and writes levels.

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use super::hw_init::{self, HwInitError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub HwInitError);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// One GPIO line, addressed by its number in [`crate::pins`].
#[derive(Debug)]
pub struct GpioPin {
    pin: i32,
}

impl GpioPin {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn number(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioPin {
    type Error = GpioError;
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        hw_init::gpio_read(self.pin).map_err(GpioError)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, false).map_err(GpioError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.pin, true).map_err(GpioError)
    }
}
