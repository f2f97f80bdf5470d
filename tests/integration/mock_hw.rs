//! Mock adapters for integration tests.
//!
//! Records every relay, storage, audio, and watchdog call so tests can
//! assert on the full command history without touching real GPIO, flash,
//! or an amplifier.

use std::cell::RefCell;
use std::rc::Rc;

use pressure_sentry::app::events::AppEvent;
use pressure_sentry::app::ports::{
    AudioError, AudioPort, EventSink, InputPort, RelayPort, StorageError, StoragePort,
    WatchdogError, WatchdogPort,
};
use pressure_sentry::drivers::button::DebouncedButton;
use pressure_sentry::fsm::context::InputSnapshot;

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Energize,
    DeEnergize,
}

// ── Shared call order ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Feed,
    Sample,
}

/// Interleaved record of watchdog feeds and input samples, shared between
/// [`MockWatchdog`] and [`MockHardware`].
pub type CallLog = Rc<RefCell<Vec<Call>>>;

// ── MockHardware ──────────────────────────────────────────────

/// Input levels are set directly by the test; the button still goes
/// through the real debounce guard.
pub struct MockHardware {
    pub sensor: bool,
    pub button_down: bool,
    button: DebouncedButton,
    pub samples: usize,
    pub relay_calls: Vec<RelayCall>,
    relay_on: bool,
    pub calls: Option<CallLog>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            sensor: false,
            button_down: false,
            button: DebouncedButton::default(),
            samples: 0,
            relay_calls: Vec::new(),
            relay_on: false,
            calls: None,
        }
    }

    pub fn relay_on(&self) -> bool {
        self.relay_on
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for MockHardware {
    fn sample(&mut self, now_ms: u32) -> InputSnapshot {
        self.samples += 1;
        if let Some(calls) = &self.calls {
            calls.borrow_mut().push(Call::Sample);
        }
        InputSnapshot {
            sensor_triggered: self.sensor,
            button_accepted: self.button.poll(self.button_down, now_ms),
        }
    }
}

impl RelayPort for MockHardware {
    fn energize_relay(&mut self) {
        self.relay_calls.push(RelayCall::Energize);
        self.relay_on = true;
    }

    fn de_energize_relay(&mut self) {
        self.relay_calls.push(RelayCall::DeEnergize);
        self.relay_on = false;
    }

    fn is_relay_energized(&self) -> bool {
        self.relay_on
    }
}

// ── MockStorage ───────────────────────────────────────────────

/// Handle returned by [`MockStorage::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSound(pub String);

pub struct MockStorage {
    pub mount_result: Result<(), StorageError>,
    pub sound_present: bool,
    /// Number of upcoming `open` calls that fail with `IoError`.
    pub fail_opens: usize,
    pub mounted: bool,
    pub opens: usize,
}

#[allow(dead_code)]
impl MockStorage {
    pub fn new() -> Self {
        Self {
            mount_result: Ok(()),
            sound_present: true,
            fail_opens: 0,
            mounted: false,
            opens: 0,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mount_result: Err(StorageError::Unavailable),
            ..Self::new()
        }
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MockStorage {
    type Source = MockSound;

    fn mount(&mut self) -> Result<(), StorageError> {
        self.mount_result?;
        self.mounted = true;
        Ok(())
    }

    fn open(&mut self, name: &str) -> Result<MockSound, StorageError> {
        self.opens += 1;
        if !self.mounted {
            return Err(StorageError::Unavailable);
        }
        if self.fail_opens > 0 {
            self.fail_opens -= 1;
            return Err(StorageError::IoError);
        }
        if !self.sound_present {
            return Err(StorageError::NotFound);
        }
        Ok(MockSound(name.to_string()))
    }
}

// ── MockAudio ─────────────────────────────────────────────────

pub struct MockAudio {
    pub playable: bool,
    /// Number of upcoming `play` calls that fail with `OutputFailed`.
    pub fail_plays: usize,
    pub playing: bool,
    pub played: Vec<MockSound>,
    pub stops: usize,
}

#[allow(dead_code)]
impl MockAudio {
    pub fn new() -> Self {
        Self {
            playable: true,
            fail_plays: 0,
            playing: false,
            played: Vec::new(),
            stops: 0,
        }
    }

    /// The sound ran to its end.
    pub fn finish(&mut self) {
        self.playing = false;
    }
}

impl Default for MockAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPort<MockSound> for MockAudio {
    fn can_play(&mut self, _source: &mut MockSound) -> bool {
        self.playable
    }

    fn play(&mut self, source: MockSound) -> Result<(), AudioError> {
        if self.fail_plays > 0 {
            self.fail_plays -= 1;
            return Err(AudioError::OutputFailed);
        }
        self.played.push(source);
        self.playing = true;
        Ok(())
    }

    fn is_playing(&mut self) -> bool {
        self.playing
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.playing = false;
    }
}

// ── MockWatchdog ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockWatchdog {
    pub fail_begin: bool,
    pub armed_with: Option<u32>,
    pub feeds: usize,
    pub calls: Option<CallLog>,
}

impl WatchdogPort for MockWatchdog {
    fn begin(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        if self.fail_begin {
            return Err(WatchdogError::ConfigureFailed(-1));
        }
        self.armed_with = Some(timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        self.feeds += 1;
        if let Some(calls) = &self.calls {
            calls.borrow_mut().push(Call::Feed);
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
