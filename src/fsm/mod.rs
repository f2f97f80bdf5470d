//! Alert controller state machine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Controller                                                   │
//! │  ┌──────────────┐   step(state, playback, &CycleContext)      │
//! │  │ SystemState  │ ─────────────────────────────────────▶ Step │
//! │  │ Playback     │ ◀──────────── commit ───────────────────┘   │
//! │  └──────────────┘                                             │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transition logic in [`states::step`] is a pure function: it gets an
//! immutable per-cycle context and returns the next state, the next
//! playback bookkeeping, and an ordered list of [`Command`]s.  The
//! [`Controller`] is the only owner of the authoritative state and the
//! only place it is mutated.

pub mod context;
pub mod states;

use context::{Command, CycleContext};
use log::{info, warn};

use crate::control::alert_audio::PlaybackState;

pub use states::Step;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Plain discriminant of [`SystemState`], for events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Alert = 1,
    CrossCheck = 2,
}

/// The single authoritative controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Quiet: relay off, no audio.
    Idle,
    /// Pressure anomaly: relay on, alert sound repeating.
    Alert,
    /// Manual indicator self-test: relay on for a bounded time, no audio.
    CrossCheck {
        /// Clock reading at which the cross-check began.
        started_ms: u32,
    },
}

impl SystemState {
    pub fn id(&self) -> StateId {
        match self {
            Self::Idle => StateId::Idle,
            Self::Alert => StateId::Alert,
            Self::CrossCheck { .. } => StateId::CrossCheck,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Alert => "Alert",
            Self::CrossCheck { .. } => "CrossCheck",
        }
    }

    /// Whether the relay must be energised in this state.
    pub fn relay_energized(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Alert | Self::CrossCheck { .. } => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owner of [`SystemState`] and [`PlaybackState`].
#[derive(Debug)]
pub struct Controller {
    state: SystemState,
    playback: PlaybackState,
    /// Monotonically increasing evaluation counter.
    cycle_count: u64,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Start in `Idle`, nothing playing.
    pub fn new() -> Self {
        Self {
            state: SystemState::Idle,
            playback: PlaybackState::reset(),
            cycle_count: 0,
        }
    }

    /// Evaluate one cycle without changing anything.
    pub fn evaluate(&self, ctx: &CycleContext) -> Step {
        states::step(self.state, self.playback, ctx)
    }

    /// Evaluate and commit one cycle.  Returns the step so the caller can
    /// apply its commands.
    pub fn tick(&mut self, ctx: &CycleContext) -> Step {
        self.cycle_count += 1;
        let step = self.evaluate(ctx);

        if step.next != self.state {
            info!("FSM transition: {} -> {}", self.state.name(), step.next.name());
        }

        self.state = step.next;
        self.playback = step.playback;
        step
    }

    /// The audio output refused the request issued by the last
    /// [`Command::StartPlayback`].  Clears the in-flight flag so the
    /// request is retried on a following cycle; the state is unchanged.
    pub fn playback_start_failed(&mut self) {
        if self.playback.is_playing {
            warn!("FSM: alert playback did not start, will retry");
            self.playback.is_playing = false;
        }
    }

    /// The current state.
    pub fn state(&self) -> SystemState {
        self.state
    }

    /// The current playback bookkeeping.
    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// How many cycles have been evaluated.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
