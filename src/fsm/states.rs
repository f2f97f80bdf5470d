//! Concrete state handlers and the pure transition function.
//!
//! Each state has an `update` handler that inspects the [`CycleContext`]
//! and returns `Some(next)` to leave, plus `enter`/`exit` builders that
//! append side-effect [`Command`]s.  Dispatch is an exhaustive `match`
//! over [`SystemState`], so a new state cannot be added without handling it.
//!
//! ```text
//!  IDLE ──[sensor]──────────────▶ ALERT ──[button | sensor clear]──▶ IDLE
//!    │                              ⟲ audio scheduler
//!    └──[button, no sensor]──▶ CROSS-CHECK ──[duration elapsed]──▶ IDLE
//! ```

use log::{debug, info};

use super::SystemState;
use super::context::{Command, Commands, CycleContext};
use crate::control::alert_audio::{self, AudioAction, PlaybackState};

/// Outcome of one controller evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State after this cycle.
    pub next: SystemState,
    /// Playback bookkeeping after this cycle.
    pub playback: PlaybackState,
    /// Side effects to apply, in order.
    pub commands: Commands,
}

/// Evaluate one cycle.  Pure: no hardware, no clock, no globals.
///
/// At most one exit path runs per cycle.  When the state is kept and it is
/// `Alert`, the audio scheduler gets its turn.
pub fn step(state: SystemState, playback: PlaybackState, ctx: &CycleContext) -> Step {
    let mut commands = Commands::new();
    let mut playback = playback;

    let target = match state {
        SystemState::Idle => idle_update(ctx),
        SystemState::Alert => alert_update(ctx),
        SystemState::CrossCheck { started_ms } => cross_check_update(started_ms, ctx),
    };

    let next = match target {
        Some(next) => {
            exit(state, &mut playback, &mut commands);
            enter(next, &mut playback, &mut commands);
            next
        }
        None => {
            if state == SystemState::Alert {
                playback = alert_during(playback, ctx, &mut commands);
            }
            state
        }
    };

    Step {
        next,
        playback,
        commands,
    }
}

fn push(commands: &mut Commands, command: Command) {
    if commands.push(command).is_err() {
        debug_assert!(false, "command list overflow: {command:?}");
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Enter / exit effects
// ═══════════════════════════════════════════════════════════════════════════

fn enter(state: SystemState, playback: &mut PlaybackState, commands: &mut Commands) {
    match state {
        SystemState::Idle => push(commands, Command::DeEnergizeRelay),
        SystemState::Alert => {
            push(commands, Command::EnergizeRelay);
            *playback = PlaybackState::reset();
        }
        SystemState::CrossCheck { .. } => push(commands, Command::EnergizeRelay),
    }
}

fn exit(state: SystemState, playback: &mut PlaybackState, commands: &mut Commands) {
    match state {
        SystemState::Alert => {
            push(commands, Command::StopPlayback);
            *playback = PlaybackState::reset();
        }
        SystemState::Idle | SystemState::CrossCheck { .. } => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &CycleContext) -> Option<SystemState> {
    // The sensor wins when both lines are active in the same cycle.
    if ctx.inputs.sensor_triggered {
        info!("IDLE: pressure anomaly detected, raising alert");
        return Some(SystemState::Alert);
    }

    if ctx.inputs.button_accepted {
        info!("IDLE: button pressed, starting indicator cross-check");
        return Some(SystemState::CrossCheck {
            started_ms: ctx.now_ms,
        });
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALERT state: relay on, alert sound repeating
// ═══════════════════════════════════════════════════════════════════════════

fn alert_update(ctx: &CycleContext) -> Option<SystemState> {
    // Acknowledgement is checked before the sensor-clear path.
    if ctx.inputs.button_accepted {
        info!("ALERT: acknowledged by button");
        return Some(SystemState::Idle);
    }

    if !ctx.inputs.sensor_triggered {
        info!("ALERT: pressure anomaly cleared");
        return Some(SystemState::Idle);
    }

    None
}

fn alert_during(
    playback: PlaybackState,
    ctx: &CycleContext,
    commands: &mut Commands,
) -> PlaybackState {
    let (playback, action) = alert_audio::schedule(
        playback,
        ctx.now_ms,
        ctx.playback_finished,
        ctx.alert_repeat_delay_ms,
    );

    match action {
        AudioAction::RequestPlayback => {
            debug!("ALERT: requesting alert playback at {} ms", ctx.now_ms);
            push(commands, Command::StartPlayback);
        }
        AudioAction::Idle => {}
    }

    playback
}

// ═══════════════════════════════════════════════════════════════════════════
//  CROSS-CHECK state: indicator lit for a fixed time, no audio
// ═══════════════════════════════════════════════════════════════════════════

fn cross_check_update(started_ms: u32, ctx: &CycleContext) -> Option<SystemState> {
    if ctx.elapsed_since(started_ms) >= ctx.cross_check_duration_ms {
        info!(
            "CROSS-CHECK: {} ms elapsed, returning to idle",
            ctx.cross_check_duration_ms
        );
        return Some(SystemState::Idle);
    }

    None
}
