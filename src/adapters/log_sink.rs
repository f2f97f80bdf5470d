//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production, stderr on the host).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                info!(
                    "STATUS | state={:?} | relay={} | audio={} | cycles={} | uptime={}ms",
                    s.state,
                    if s.relay_energized { "ON" } else { "OFF" },
                    if s.playing { "PLAYING" } else { "QUIET" },
                    s.cycle_count,
                    s.uptime_ms,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PlaybackStarted => {
                info!("AUDIO | alert started");
            }
            AppEvent::PlaybackFinished => {
                info!("AUDIO | alert finished");
            }
            AppEvent::PlaybackStartFailed(e) => {
                warn!("AUDIO | start failed: {}", e);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::Fatal(e) => {
                error!("FATAL | {}", e);
            }
        }
    }
}
