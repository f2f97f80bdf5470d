//! Hardware adapter — bridges the input and relay drivers to the domain
//! port traits.
//!
//! Owns the [`InputSampler`] and the [`RelayDriver`], exposing them through
//! [`InputPort`] and [`RelayPort`].  Generic over the `embedded-hal` pin
//! types: [`GpioPin`](crate::drivers::gpio::GpioPin) on the device, mock
//! pins in tests.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{InputPort, RelayPort};
use crate::drivers::relay::{RelayDriver, RelayState};
use crate::error::ActuatorError;
use crate::fsm::context::InputSnapshot;
use crate::sensors::InputSampler;

/// Concrete adapter that combines the I/O behind port traits.
pub struct HardwareAdapter<S, B, R> {
    inputs: InputSampler<S, B>,
    relay: RelayDriver<R>,
    /// A relay write has failed and no write has succeeded since.
    relay_faulted: bool,
}

impl<S, B, R> HardwareAdapter<S, B, R>
where
    S: InputPin,
    B: InputPin,
    R: OutputPin,
{
    pub fn new(inputs: InputSampler<S, B>, relay: RelayDriver<R>) -> Self {
        Self {
            inputs,
            relay,
            relay_faulted: false,
        }
    }

    pub fn relay(&self) -> &RelayDriver<R> {
        &self.relay
    }

    /// Log the first failure of a fault episode and the recovery.
    fn note_relay_write(&mut self, result: Result<(), ActuatorError>) {
        match result {
            Ok(()) if self.relay_faulted => {
                info!("Relay write recovered");
                self.relay_faulted = false;
            }
            Ok(()) => {}
            Err(e) if !self.relay_faulted => {
                warn!("Relay write failed: {}, retrying every cycle", e);
                self.relay_faulted = true;
            }
            Err(_) => {}
        }
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<S, B, R> InputPort for HardwareAdapter<S, B, R>
where
    S: InputPin,
    B: InputPin,
    R: OutputPin,
{
    fn sample(&mut self, now_ms: u32) -> InputSnapshot {
        self.inputs.sample(now_ms)
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<S, B, R> RelayPort for HardwareAdapter<S, B, R>
where
    S: InputPin,
    B: InputPin,
    R: OutputPin,
{
    fn energize_relay(&mut self) {
        let result = self.relay.energize();
        self.note_relay_write(result);
    }

    fn de_energize_relay(&mut self) {
        let result = self.relay.de_energize();
        self.note_relay_write(result);
    }

    fn is_relay_energized(&self) -> bool {
        self.relay.is_energized()
    }

    fn relay_matches(&self, energized: bool) -> bool {
        let target = if energized {
            RelayState::Energized
        } else {
            RelayState::DeEnergized
        };
        self.relay.state() == Some(target)
    }
}
