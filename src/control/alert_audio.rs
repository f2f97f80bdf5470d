//! Alert audio scheduler.
//!
//! Decides, once per cycle while the controller sits in `Alert`, whether a
//! playback should be requested or a finished one should be recorded.
//!
//! ```text
//!   not playing ──[never played | now - last_end >= repeat_delay]──▶ request
//!        ▲                                                              │
//!        └──────[finished edge: record last_end = now]──── playing ◀────┘
//! ```
//!
//! `is_playing` is raised at the moment a request is issued, so a second
//! request can never be issued while the first is still in flight.

/// Playback bookkeeping for the current alert episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// A playback request is in flight (started and not yet finished).
    pub is_playing: bool,
    /// When the most recent playback of this episode finished.
    /// `None` means nothing has played since the episode began.
    pub last_end_ms: Option<u32>,
}

impl PlaybackState {
    /// "Never played": the state at the start of every alert episode.
    pub const fn reset() -> Self {
        Self {
            is_playing: false,
            last_end_ms: None,
        }
    }

    /// True when nothing has played yet in this episode.
    pub fn never_played(&self) -> bool {
        !self.is_playing && self.last_end_ms.is_none()
    }
}

/// What the scheduler wants done this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioAction {
    /// Nothing to do.
    Idle,
    /// Ask the audio output to start the alert sound.
    RequestPlayback,
}

/// Advance the scheduler by one cycle.
///
/// `finished` is the completion edge polled from the audio output; it is
/// consumed here and only while a playback is in flight.
pub fn schedule(
    playback: PlaybackState,
    now_ms: u32,
    finished: bool,
    repeat_delay_ms: u32,
) -> (PlaybackState, AudioAction) {
    if playback.is_playing {
        if finished {
            let done = PlaybackState {
                is_playing: false,
                last_end_ms: Some(now_ms),
            };
            return (done, AudioAction::Idle);
        }
        return (playback, AudioAction::Idle);
    }

    let due = match playback.last_end_ms {
        None => true,
        Some(end) => now_ms.wrapping_sub(end) >= repeat_delay_ms,
    };

    if due {
        let requested = PlaybackState {
            is_playing: true,
            ..playback
        };
        (requested, AudioAction::RequestPlayback)
    } else {
        (playback, AudioAction::Idle)
    }
}
