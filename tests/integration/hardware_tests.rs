//! End-to-end tests over the real adapters on the host: simulated GPIO
//! levels, a directory standing in for the storage volume, and the WAV
//! player streaming into a [`NullSink`].

use std::cell::Cell;
use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use tempfile::TempDir;

use pressure_sentry::adapters::audio::{NullSink, WavPlayer};
use pressure_sentry::adapters::hardware::HardwareAdapter;
use pressure_sentry::adapters::storage::FsStorage;
use pressure_sentry::app::events::AppEvent;
use pressure_sentry::app::ports::{AudioPort, StorageError, StoragePort};
use pressure_sentry::app::runtime::{Runtime, RuntimeParts};
use pressure_sentry::app::service::AlertService;
use pressure_sentry::config::AlertConfig;
use pressure_sentry::drivers::gpio::GpioPin;
use pressure_sentry::drivers::hw_init::{gpio_read, sim_set_level};
use pressure_sentry::drivers::relay::RelayDriver;
use pressure_sentry::error::Error;
use pressure_sentry::fsm::StateId;
use pressure_sentry::sensors::InputSampler;

use super::mock_hw::{MockAudio, MockStorage, MockWatchdog, RecordingSink};

/// Scratch volume holding one alert sound.
fn volume_with_sound(bytes: &[u8]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alert.wav"), bytes).unwrap();
    dir
}

/// 16-bit mono PCM, 16 kHz.
fn alert_wav(samples: u32) -> Vec<u8> {
    let data_len = samples * 2;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&16_000u32.to_le_bytes());
    out.extend_from_slice(&32_000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(out.len() + data_len as usize, 0);
    out
}

type Hw = HardwareAdapter<GpioPin, GpioPin, GpioPin>;

/// Each test uses its own line numbers; the simulated levels are global.
fn hardware(sensor: i32, button: i32, relay: i32, config: &AlertConfig) -> Hw {
    let inputs = InputSampler::new(GpioPin::new(sensor), GpioPin::new(button), config);
    let relay = RelayDriver::new(GpioPin::new(relay), config.relay_active_high);
    HardwareAdapter::new(inputs, relay)
}

#[test]
fn sensor_alert_plays_sound_and_button_acknowledges() {
    const SENSOR: i32 = 20;
    const BUTTON: i32 = 21;
    const RELAY: i32 = 22;

    let volume = volume_with_sound(&alert_wav(1_600));

    let config = AlertConfig::default();
    sim_set_level(SENSOR, false).unwrap();
    sim_set_level(BUTTON, true).unwrap();

    let parts = RuntimeParts {
        hw: hardware(SENSOR, BUTTON, RELAY, &config),
        storage: FsStorage::new(volume.path()),
        audio: WavPlayer::new(NullSink::new(false)),
        watchdog: MockWatchdog::default(),
        sink: RecordingSink::new(),
    };
    let mut rt = Runtime::boot(config, parts, 0).unwrap();
    assert_eq!(gpio_read(RELAY), Ok(false));

    rt.run_cycle(5);
    assert_eq!(rt.service().state(), StateId::Idle);

    // Pressure anomaly.
    sim_set_level(SENSOR, true).unwrap();
    rt.run_cycle(10);
    assert_eq!(rt.service().state(), StateId::Alert);
    assert_eq!(gpio_read(RELAY), Ok(true));

    rt.run_cycle(15);
    assert!(rt.service().controller().playback().is_playing);

    let deadline = Instant::now() + Duration::from_secs(5);
    while AudioPort::<BufReader<File>>::is_playing(&mut rt.parts_mut().audio) {
        assert!(Instant::now() < deadline, "playback never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
    rt.run_cycle(20);
    assert_eq!(
        rt.service().controller().playback().last_end_ms,
        Some(20)
    );

    // Acknowledge: the button line is pulled low while pressed.
    sim_set_level(BUTTON, false).unwrap();
    rt.run_cycle(25);
    assert_eq!(rt.service().state(), StateId::Idle);
    assert_eq!(gpio_read(RELAY), Ok(false));

    let events = &rt.parts().sink.events;
    assert_eq!(events[0], AppEvent::Started(StateId::Idle));
    assert!(events.contains(&AppEvent::PlaybackStarted));
    assert!(events.contains(&AppEvent::PlaybackFinished));
    assert!(events.contains(&AppEvent::StateChanged {
        from: StateId::Alert,
        to: StateId::Idle
    }));
    assert_eq!(rt.parts().watchdog.feeds, 5);
}

#[test]
fn missing_volume_halts_before_first_cycle() {
    const SENSOR: i32 = 23;
    const BUTTON: i32 = 24;
    const RELAY: i32 = 25;

    let config = AlertConfig::default();
    sim_set_level(SENSOR, true).unwrap();

    let mut parts = RuntimeParts {
        hw: hardware(SENSOR, BUTTON, RELAY, &config),
        storage: FsStorage::new("/no/such/volume"),
        audio: WavPlayer::new(NullSink::new(false)),
        watchdog: MockWatchdog::default(),
        sink: RecordingSink::new(),
    };
    let result = Runtime::boot(
        config,
        RuntimeParts {
            hw: &mut parts.hw,
            storage: &mut parts.storage,
            audio: &mut parts.audio,
            watchdog: &mut parts.watchdog,
            sink: &mut parts.sink,
        },
        0,
    )
    .map(|_| ());

    assert_eq!(result, Err(Error::Storage(StorageError::Unavailable)));
    assert_eq!(gpio_read(RELAY), Ok(false), "indicator stays off");
    assert_eq!(parts.watchdog.armed_with, None);
    assert_eq!(
        parts.sink.events,
        vec![AppEvent::Fatal(Error::Storage(StorageError::Unavailable))]
    );
}

#[test]
fn unreadable_sound_is_rejected_at_boot() {
    let volume = volume_with_sound(b"not a wave file");

    let config = AlertConfig::default();
    let mut storage = FsStorage::new(volume.path());
    let mut audio = WavPlayer::new(NullSink::new(false));
    let mut watchdog = MockWatchdog::default();
    let mut sink = RecordingSink::new();

    let result = Runtime::boot(
        config.clone(),
        RuntimeParts {
            hw: hardware(26, 27, 28, &config),
            storage: &mut storage,
            audio: &mut audio,
            watchdog: &mut watchdog,
            sink: &mut sink,
        },
        0,
    )
    .map(|_| ());

    assert!(matches!(result, Err(Error::Audio(_))));
    assert_eq!(watchdog.armed_with, None);
}

// ── Relay write faults ────────────────────────────────────────

/// Output pin whose next `failures` writes are rejected.
struct FlakyPin {
    level: Rc<Cell<Option<bool>>>,
    failures: Rc<Cell<u32>>,
}

#[derive(Debug)]
struct WriteRejected;

impl embedded_hal::digital::Error for WriteRejected {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for FlakyPin {
    type Error = WriteRejected;
}

impl FlakyPin {
    fn write(&mut self, high: bool) -> Result<(), WriteRejected> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(WriteRejected);
        }
        self.level.set(Some(high));
        Ok(())
    }
}

impl OutputPin for FlakyPin {
    fn set_low(&mut self) -> Result<(), WriteRejected> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), WriteRejected> {
        self.write(true)
    }
}

struct FlakyRig {
    service: AlertService,
    hw: HardwareAdapter<GpioPin, GpioPin, FlakyPin>,
    storage: MockStorage,
    audio: MockAudio,
    sink: RecordingSink,
    level: Rc<Cell<Option<bool>>>,
    failures: Rc<Cell<u32>>,
}

impl FlakyRig {
    /// The first `initial_failures` writes fail, starting with the one made
    /// by `RelayDriver::new`.
    fn new(sensor: i32, button: i32, initial_failures: u32) -> Self {
        let config = AlertConfig::default();
        let level = Rc::new(Cell::new(None));
        let failures = Rc::new(Cell::new(initial_failures));
        let pin = FlakyPin {
            level: Rc::clone(&level),
            failures: Rc::clone(&failures),
        };
        let inputs = InputSampler::new(GpioPin::new(sensor), GpioPin::new(button), &config);
        let mut storage = MockStorage::new();
        storage.mount().unwrap();
        let mut rig = Self {
            service: AlertService::new(config),
            hw: HardwareAdapter::new(inputs, RelayDriver::new(pin, true)),
            storage,
            audio: MockAudio::new(),
            sink: RecordingSink::new(),
            level,
            failures,
        };
        rig.service.start(0, &mut rig.hw, &mut rig.sink);
        rig
    }

    fn tick(&mut self, now_ms: u32) {
        self.service.tick(
            now_ms,
            &mut self.hw,
            &mut self.storage,
            &mut self.audio,
            &mut self.sink,
        );
    }
}

#[test]
fn failed_relay_write_is_retried_until_it_lands() {
    const SENSOR: i32 = 29;
    const BUTTON: i32 = 30;
    sim_set_level(SENSOR, false).unwrap();
    sim_set_level(BUTTON, true).unwrap();

    let mut rig = FlakyRig::new(SENSOR, BUTTON, 0);
    assert_eq!(rig.level.get(), Some(false));

    // Entering Alert: the commanded write and the same-cycle retry both
    // fail, then one more cycle fails.
    rig.failures.set(3);
    sim_set_level(SENSOR, true).unwrap();
    rig.tick(5);
    assert_eq!(rig.service.state(), StateId::Alert);
    assert_eq!(rig.level.get(), Some(false));
    assert!(!rig.hw.relay().is_energized());

    rig.tick(10);
    assert_eq!(rig.level.get(), Some(false));

    rig.tick(15);
    assert_eq!(rig.level.get(), Some(true));
    assert!(rig.hw.relay().is_energized());

    // Sensor held active: the relay stays on for the whole alert.
    for t in (20..5_000).step_by(5) {
        rig.tick(t);
        assert_eq!(rig.service.state(), StateId::Alert);
        assert_eq!(rig.level.get(), Some(true));
    }

    // Leaving Alert: both writes in the exit cycle fail.
    rig.failures.set(2);
    sim_set_level(SENSOR, false).unwrap();
    rig.tick(5_000);
    assert_eq!(rig.service.state(), StateId::Idle);
    assert_eq!(rig.level.get(), Some(true));

    rig.tick(5_005);
    assert_eq!(rig.level.get(), Some(false));
    assert!(!rig.hw.relay().is_energized());
}

#[test]
fn unknown_initial_relay_level_is_driven_off() {
    const SENSOR: i32 = 31;
    const BUTTON: i32 = 32;
    sim_set_level(SENSOR, false).unwrap();
    sim_set_level(BUTTON, true).unwrap();

    // Both the driver's initial write and the one in `start` fail.
    let mut rig = FlakyRig::new(SENSOR, BUTTON, 2);
    assert_eq!(rig.level.get(), None);
    assert_eq!(rig.hw.relay().state(), None);

    rig.tick(5);
    assert_eq!(rig.service.state(), StateId::Idle);
    assert_eq!(rig.level.get(), Some(false));
}
