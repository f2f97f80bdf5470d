//! Application service — the hexagonal core.
//!
//! [`AlertService`] owns the [`Controller`] and the live configuration.
//! Every cycle it samples the inputs, turns the audio output's state into
//! a single `playback_finished` edge, lets the controller decide, and then
//! applies the resulting commands through the ports.
//!
//! ```text
//!  InputPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                │      AlertService      │
//!  RelayPort ◀── │  Controller · schedule │ ──▶ StoragePort / AudioPort
//!                └────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::AlertConfig;
use crate::error::Error;
use crate::fsm::context::{Command, CycleContext};
use crate::fsm::{Controller, StateId, SystemState};

use super::events::{AppEvent, StatusData};
use super::ports::{AudioPort, EventSink, InputPort, RelayPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// AlertService
// ───────────────────────────────────────────────────────────────

pub struct AlertService {
    controller: Controller,
    config: AlertConfig,
    /// Clock reading at `start`, for uptime in status snapshots.
    started_ms: u32,
    last_status_ms: u32,
}

impl AlertService {
    /// Construct the service.  Call [`start`](Self::start) before the
    /// first [`tick`](Self::tick).
    pub fn new(config: AlertConfig) -> Self {
        Self {
            controller: Controller::new(),
            config,
            started_ms: 0,
            last_status_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the outputs in the `Idle` configuration and announce the start.
    pub fn start(&mut self, now_ms: u32, relay: &mut impl RelayPort, sink: &mut impl EventSink) {
        relay.de_energize_relay();
        self.started_ms = now_ms;
        self.last_status_ms = now_ms;
        sink.emit(&AppEvent::Started(self.state()));
        info!("AlertService started in {:?}", self.state());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle: sample → evaluate → apply commands.
    ///
    /// `hw` satisfies both [`InputPort`] and [`RelayPort`]; `now_ms` is the
    /// single clock reading for this cycle.
    pub fn tick<S, A>(
        &mut self,
        now_ms: u32,
        hw: &mut (impl InputPort + RelayPort),
        storage: &mut S,
        audio: &mut A,
        sink: &mut impl EventSink,
    ) where
        S: StoragePort,
        A: AudioPort<S::Source>,
    {
        let prev_state = self.controller.state();

        // 1. Inputs
        let inputs = hw.sample(now_ms);

        // 2. Completion edge: only a stream this controller started can finish.
        let playback_finished = self.controller.playback().is_playing && !audio.is_playing();

        // 3. Controller (pure evaluation, committed here)
        let ctx = CycleContext::new(&self.config, now_ms, inputs)
            .with_playback_finished(playback_finished);
        let step = self.controller.tick(&ctx);

        if playback_finished {
            debug!("Alert playback finished at {} ms", now_ms);
            sink.emit(&AppEvent::PlaybackFinished);
        }

        // 4. Side effects, in order
        for &command in &step.commands {
            self.apply(command, hw, storage, audio, sink);
        }

        // 5. Relay follows the state; a write that failed earlier is retried.
        self.reconcile_relay(hw);

        // 6. Report
        let new_state = self.controller.state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state.id(),
                to: new_state.id(),
            });
        }

        if now_ms.wrapping_sub(self.last_status_ms) >= self.config.status_interval_ms {
            self.last_status_ms = now_ms;
            sink.emit(&AppEvent::Status(self.build_status(now_ms, &*hw)));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of the controller for status reporting.
    pub fn build_status(&self, now_ms: u32, relay: &impl RelayPort) -> StatusData {
        StatusData {
            state: self.state(),
            relay_energized: relay.is_relay_energized(),
            playing: self.controller.playback().is_playing,
            cycle_count: self.controller.cycle_count(),
            uptime_ms: now_ms.wrapping_sub(self.started_ms),
        }
    }

    pub fn state(&self) -> StateId {
        self.controller.state().id()
    }

    pub fn system_state(&self) -> SystemState {
        self.controller.state()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn reconcile_relay(&self, relay: &mut impl RelayPort) {
        let wanted = self.controller.state().relay_energized();
        if relay.relay_matches(wanted) {
            return;
        }
        if wanted {
            relay.energize_relay();
        } else {
            relay.de_energize_relay();
        }
    }

    fn apply<S, A>(
        &mut self,
        command: Command,
        relay: &mut impl RelayPort,
        storage: &mut S,
        audio: &mut A,
        sink: &mut impl EventSink,
    ) where
        S: StoragePort,
        A: AudioPort<S::Source>,
    {
        match command {
            Command::EnergizeRelay => relay.energize_relay(),
            Command::DeEnergizeRelay => relay.de_energize_relay(),
            Command::StopPlayback => audio.stop(),
            Command::StartPlayback => match self.start_playback(storage, audio) {
                Ok(()) => {
                    info!("Alert playback started ({})", self.config.alert_sound);
                    sink.emit(&AppEvent::PlaybackStarted);
                }
                Err(e) => {
                    warn!("Alert playback failed to start: {}", e);
                    self.controller.playback_start_failed();
                    sink.emit(&AppEvent::PlaybackStartFailed(e));
                }
            },
        }
    }

    /// Reopen the sound so it plays from the beginning, then hand it over.
    fn start_playback<S, A>(&self, storage: &mut S, audio: &mut A) -> Result<(), Error>
    where
        S: StoragePort,
        A: AudioPort<S::Source>,
    {
        let source = storage.open(&self.config.alert_sound)?;
        audio.play(source)?;
        Ok(())
    }
}
