//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AlertService (domain)
//! ```
//!
//! Driven adapters (inputs, relay, storage, audio, watchdog, event sinks)
//! implement these traits.  The [`AlertService`](super::service::AlertService)
//! and the [`Runtime`](super::runtime::Runtime) consume them via generics, so
//! the controller never touches hardware directly.
//!
//! All port errors are typed `Copy` enums so they can be logged and carried
//! in events without allocation.

use crate::config::AlertConfig;
use crate::fsm::context::InputSnapshot;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: sampled exactly once per control cycle.
pub trait InputPort {
    /// Read the sensor and button lines and run the button debounce guard.
    fn sample(&mut self, now_ms: u32) -> InputSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the indicator relay.  Both commands are idempotent.
pub trait RelayPort {
    /// Energise the relay coil (indicator light on).
    fn energize_relay(&mut self);

    /// De-energise the relay coil (indicator light off).
    fn de_energize_relay(&mut self);

    /// Last relay state known to have reached the pin.
    fn is_relay_energized(&self) -> bool;

    /// The pin is known to be at the level for `energized`.  An adapter
    /// whose state can be unknown (a write never succeeded) returns `false`
    /// for both values.
    fn relay_matches(&self, energized: bool) -> bool {
        self.is_relay_energized() == energized
    }
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash volume)
// ───────────────────────────────────────────────────────────────

/// Locates and opens the alert sound.
pub trait StoragePort {
    /// Readable handle to an opened file.
    type Source;

    /// Bring up the storage volume.  Called once during startup.
    fn mount(&mut self) -> Result<(), StorageError>;

    /// Open `name` from the beginning.  Every call yields a fresh handle.
    fn open(&mut self, name: &str) -> Result<Self::Source, StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Audio port (driven adapter: domain → codec / amplifier)
// ───────────────────────────────────────────────────────────────

/// A single playback stream.  Decoding and output live behind this port.
pub trait AudioPort<Src> {
    /// Startup validation: can this source be decoded and played?
    fn can_play(&mut self, source: &mut Src) -> bool;

    /// Begin playback of `source`.  Returns as soon as the stream is started.
    fn play(&mut self, source: Src) -> Result<(), AudioError>;

    /// Whether the last started stream is still producing sound.
    fn is_playing(&mut self) -> bool;

    /// Stop playback.  No-op when nothing is playing.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Hardware (or supervisor) watchdog.  Resets the device unless fed.
pub trait WatchdogPort {
    /// Arm the watchdog with the given timeout.
    fn begin(&mut self, timeout_ms: u32) -> Result<(), WatchdogError>;

    /// Reset the countdown.  Must be called at least once per timeout.
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter.  Wraps at `u32::MAX`; callers compare
/// with `wrapping_sub`.
pub trait ClockPort {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Best-effort and one-way: nothing emitted here is
/// ever read back for a control decision.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads tunable parameters.
///
/// Implementations MUST validate before returning; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`ConfigError::NotFound`] if no stored config exists.
    fn load(&self) -> Result<AlertConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Forwarding impls
// ───────────────────────────────────────────────────────────────
//
// Lets callers lend an adapter to the runtime and inspect it afterwards.

impl<T: InputPort + ?Sized> InputPort for &mut T {
    fn sample(&mut self, now_ms: u32) -> InputSnapshot {
        (**self).sample(now_ms)
    }
}

impl<T: RelayPort + ?Sized> RelayPort for &mut T {
    fn energize_relay(&mut self) {
        (**self).energize_relay();
    }

    fn de_energize_relay(&mut self) {
        (**self).de_energize_relay();
    }

    fn is_relay_energized(&self) -> bool {
        (**self).is_relay_energized()
    }

    fn relay_matches(&self, energized: bool) -> bool {
        (**self).relay_matches(energized)
    }
}

impl<T: StoragePort + ?Sized> StoragePort for &mut T {
    type Source = T::Source;

    fn mount(&mut self) -> Result<(), StorageError> {
        (**self).mount()
    }

    fn open(&mut self, name: &str) -> Result<Self::Source, StorageError> {
        (**self).open(name)
    }
}

impl<Src, T: AudioPort<Src> + ?Sized> AudioPort<Src> for &mut T {
    fn can_play(&mut self, source: &mut Src) -> bool {
        (**self).can_play(source)
    }

    fn play(&mut self, source: Src) -> Result<(), AudioError> {
        (**self).play(source)
    }

    fn is_playing(&mut self) -> bool {
        (**self).is_playing()
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

impl<T: WatchdogPort + ?Sized> WatchdogPort for &mut T {
    fn begin(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        (**self).begin(timeout_ms)
    }

    fn feed(&mut self) {
        (**self).feed();
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::AppEvent) {
        (**self).emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The volume could not be mounted or is not present.
    Unavailable,
    /// Requested file does not exist.
    NotFound,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`AudioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioError {
    /// The source is not a format the output can play.
    Unsupported,
    /// The output driver refused to start a stream.
    OutputFailed,
}

/// Errors from [`WatchdogPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogError {
    /// Timeout reconfiguration was rejected (carries the driver return code).
    ConfigureFailed(i32),
    /// The control task could not be subscribed (carries the driver return code).
    SubscribeFailed(i32),
    /// The supervisor could not be started.
    SupervisorFailed,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "volume unavailable"),
            Self::NotFound => write!(f, "file not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for AudioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported audio format"),
            Self::OutputFailed => write!(f, "audio output failed to start"),
        }
    }
}

impl core::fmt::Display for WatchdogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConfigureFailed(rc) => write!(f, "configure failed (rc={})", rc),
            Self::SubscribeFailed(rc) => write!(f, "subscribe failed (rc={})", rc),
            Self::SupervisorFailed => write!(f, "supervisor failed to start"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
