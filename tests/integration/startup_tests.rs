//! Integration tests for the boot sequence and the runtime cycle.

use pressure_sentry::app::events::AppEvent;
use pressure_sentry::app::ports::{
    AudioError, ConfigError, ConfigPort, StorageError, WatchdogError,
};
use pressure_sentry::app::runtime::{self, Runtime, RuntimeParts};
use pressure_sentry::config::AlertConfig;
use pressure_sentry::error::Error;
use pressure_sentry::fsm::StateId;

use super::mock_hw::{
    Call, CallLog, MockAudio, MockHardware, MockStorage, MockWatchdog, RecordingSink,
};

struct Mocks {
    hw: MockHardware,
    storage: MockStorage,
    audio: MockAudio,
    watchdog: MockWatchdog,
    sink: RecordingSink,
}

impl Mocks {
    fn new() -> Self {
        Self {
            hw: MockHardware::new(),
            storage: MockStorage::new(),
            audio: MockAudio::new(),
            watchdog: MockWatchdog::default(),
            sink: RecordingSink::new(),
        }
    }

    fn boot(&mut self) -> Result<(), Error> {
        let parts = RuntimeParts {
            hw: &mut self.hw,
            storage: &mut self.storage,
            audio: &mut self.audio,
            watchdog: &mut self.watchdog,
            sink: &mut self.sink,
        };
        Runtime::boot(AlertConfig::default(), parts, 0).map(|_| ())
    }

    fn fatal_events(&self) -> Vec<Error> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Fatal(err) => Some(*err),
                _ => None,
            })
            .collect()
    }
}

// ── Fatal paths ───────────────────────────────────────────────

#[test]
fn storage_failure_prevents_any_cycle() {
    let mut m = Mocks::new();
    m.storage = MockStorage::unavailable();

    assert_eq!(m.boot(), Err(Error::Storage(StorageError::Unavailable)));
    assert_eq!(m.fatal_events(), vec![Error::Storage(StorageError::Unavailable)]);
    assert_eq!(m.hw.samples, 0, "no control cycle may run");
    assert!(m.hw.relay_calls.is_empty());
    assert_eq!(m.watchdog.armed_with, None);
    assert_eq!(m.watchdog.feeds, 0);
    assert!(!m.sink.events.iter().any(|e| matches!(e, AppEvent::Started(_))));
}

#[test]
fn missing_sound_is_fatal() {
    let mut m = Mocks::new();
    m.storage.sound_present = false;
    assert_eq!(m.boot(), Err(Error::Storage(StorageError::NotFound)));
    assert_eq!(m.fatal_events().len(), 1);
    assert_eq!(m.hw.samples, 0);
}

#[test]
fn unplayable_sound_is_fatal() {
    let mut m = Mocks::new();
    m.audio.playable = false;
    assert_eq!(m.boot(), Err(Error::Audio(AudioError::Unsupported)));
    assert_eq!(m.watchdog.armed_with, None);
}

#[test]
fn watchdog_failure_is_fatal() {
    let mut m = Mocks::new();
    m.watchdog.fail_begin = true;
    assert_eq!(
        m.boot(),
        Err(Error::Watchdog(WatchdogError::ConfigureFailed(-1)))
    );
    assert_eq!(m.hw.samples, 0);
}

// ── Successful boot ───────────────────────────────────────────

#[test]
fn boot_validates_sound_and_arms_watchdog() {
    let mut m = Mocks::new();
    assert_eq!(m.boot(), Ok(()));
    assert!(m.storage.mounted);
    assert_eq!(m.storage.opens, 1);
    assert_eq!(m.watchdog.armed_with, Some(2_000));
    assert_eq!(m.sink.events, vec![AppEvent::Started(StateId::Idle)]);
    assert!(m.fatal_events().is_empty());
}

#[test]
fn every_cycle_feeds_watchdog_before_sampling() {
    let mut m = Mocks::new();
    let calls = CallLog::default();
    m.hw.calls = Some(calls.clone());
    m.watchdog.calls = Some(calls.clone());
    let parts = RuntimeParts {
        hw: &mut m.hw,
        storage: &mut m.storage,
        audio: &mut m.audio,
        watchdog: &mut m.watchdog,
        sink: &mut m.sink,
    };
    let mut rt = Runtime::boot(AlertConfig::default(), parts, 0).unwrap();

    assert!(calls.borrow().is_empty(), "boot neither feeds nor samples");

    for t in (5..=50).step_by(5) {
        rt.run_cycle(t);
        assert_eq!(calls.borrow().as_slice(), [Call::Feed, Call::Sample]);
        calls.borrow_mut().clear();
    }
    assert_eq!(rt.parts().watchdog.feeds, 10);

    rt.parts_mut().hw.sensor = true;
    rt.run_cycle(55);
    assert_eq!(rt.service().state(), StateId::Alert);
}

#[test]
fn peripheral_init_failure_is_reported_as_fatal() {
    let mut sink = RecordingSink::new();
    runtime::report_fatal(&mut sink, Error::Init("i2s"));
    assert_eq!(sink.events, vec![AppEvent::Fatal(Error::Init("i2s"))]);
}

// ── Config loading ────────────────────────────────────────────

struct FixedConfig(Result<AlertConfig, ConfigError>);

impl ConfigPort for FixedConfig {
    fn load(&self) -> Result<AlertConfig, ConfigError> {
        self.0.clone()
    }
}

#[test]
fn load_config_falls_back_to_defaults() {
    for err in [
        ConfigError::NotFound,
        ConfigError::Corrupted,
        ConfigError::IoError,
        ConfigError::ValidationFailed("debounce_ms"),
    ] {
        assert_eq!(runtime::load_config(&FixedConfig(Err(err))), AlertConfig::default());
    }
}

#[test]
fn load_config_uses_stored_values() {
    let stored = AlertConfig {
        alert_repeat_delay_ms: 4_000,
        ..AlertConfig::default()
    };
    assert_eq!(runtime::load_config(&FixedConfig(Ok(stored.clone()))), stored);
}
