//! Outbound application events.
//!
//! The [`AlertService`](super::service::AlertService) and the
//! [`Runtime`](super::runtime::Runtime) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the stock one logs to serial.

use crate::error::Error;
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The control loop is about to run its first cycle.
    Started(StateId),

    /// The controller transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// An alert playback was handed to the audio output.
    PlaybackStarted,

    /// The audio output reported the end of an alert playback.
    PlaybackFinished,

    /// A playback request could not be started; retried next cycle.
    PlaybackStartFailed(Error),

    /// Periodic status snapshot.
    Status(StatusData),

    /// A startup step failed; the control loop will never run.
    Fatal(Error),
}

/// A point-in-time status snapshot suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusData {
    pub state: StateId,
    pub relay_energized: bool,
    pub playing: bool,
    pub cycle_count: u64,
    pub uptime_ms: u32,
}
