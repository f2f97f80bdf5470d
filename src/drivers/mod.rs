//! Input/output drivers, hardware initialisation, and the watchdog.

pub mod button;
pub mod gpio;
pub mod hw_init;
pub mod relay;
pub mod watchdog;
