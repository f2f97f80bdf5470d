//! Per-cycle context handed to the pure transition function, and the
//! command list it hands back.
//!
//! `CycleContext` is an immutable snapshot: the clock reading, debounced
//! inputs, and the playback completion edge, all sampled once at the top
//! of the cycle.  State handlers read it; they never write hardware.
//! Instead they append [`Command`]s that the service applies afterwards.

use crate::config::AlertConfig;

// ---------------------------------------------------------------------------
// Input snapshot (written by the input sampler)
// ---------------------------------------------------------------------------

/// Debounced view of both input lines for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Pressure anomaly present (level, not debounced).
    pub sensor_triggered: bool,
    /// A new button press passed the debounce guard this cycle.
    pub button_accepted: bool,
}

// ---------------------------------------------------------------------------
// Side-effect commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// A side effect requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    EnergizeRelay,
    DeEnergizeRelay,
    StartPlayback,
    StopPlayback,
}

/// Upper bound on commands one cycle can produce (exit + enter + audio).
pub const MAX_COMMANDS: usize = 4;

/// Ordered command list for one cycle.
pub type Commands = heapless::Vec<Command, MAX_COMMANDS>;

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// Everything the controller may look at during one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext {
    /// Clock reading for this cycle.  Never re-read mid-cycle.
    pub now_ms: u32,
    /// Debounced inputs.
    pub inputs: InputSnapshot,
    /// The stream started earlier has stopped on its own since the last
    /// cycle.  Only meaningful while a playback is in flight.
    pub playback_finished: bool,
    /// How long a cross-check keeps the relay energised.
    pub cross_check_duration_ms: u32,
    /// Pause between alert playbacks.
    pub alert_repeat_delay_ms: u32,
}

impl CycleContext {
    /// Build a context with the timing parameters taken from `config`.
    pub fn new(config: &AlertConfig, now_ms: u32, inputs: InputSnapshot) -> Self {
        Self {
            now_ms,
            inputs,
            playback_finished: false,
            cross_check_duration_ms: config.cross_check_duration_ms,
            alert_repeat_delay_ms: config.alert_repeat_delay_ms,
        }
    }

    /// Same context with the playback completion edge set.
    pub fn with_playback_finished(mut self, finished: bool) -> Self {
        self.playback_finished = finished;
        self
    }

    /// Milliseconds since `since_ms`, tolerant of counter wrap.
    pub fn elapsed_since(&self, since_ms: u32) -> u32 {
        self.now_ms.wrapping_sub(since_ms)
    }
}
