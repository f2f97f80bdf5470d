//! Unified error types for the Pressure Sentry firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! startup sequence and the top-level binary uniform.  All variants are
//! `Copy` so they can be logged and emitted as events without allocation.

use core::fmt;

use crate::app::ports::{AudioError, StorageError, WatchdogError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The storage volume or a file on it is unavailable.
    Storage(StorageError),
    /// The audio output rejected the alert sound or a playback request.
    Audio(AudioError),
    /// The watchdog could not be configured.
    Watchdog(WatchdogError),
    /// A peripheral could not be brought up; names the peripheral.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Audio(e) => write!(f, "audio: {e}"),
            Self::Watchdog(e) => write!(f, "watchdog: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<AudioError> for Error {
    fn from(e: AudioError) -> Self {
        Self::Audio(e)
    }
}

impl From<WatchdogError> for Error {
    fn from(e: WatchdogError) -> Self {
        Self::Watchdog(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// Relay write failure.  Retried by the adapter rather than escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
