//! Startup sequencing and the control loop.
//!
//! ```text
//!  boot: mount ─▶ open sound ─▶ can_play ─▶ arm watchdog ─▶ Runtime
//!          │          │             │             │
//!          └──────────┴─────────────┴─────────────┴──▶ Err(Error) ─▶ halt()
//!
//!  run:  loop { feed watchdog ─▶ AlertService::tick ─▶ delay }
//! ```
//!
//! A [`Runtime`] only exists once every startup step has succeeded, so a
//! failed boot can never run a control cycle.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::config::AlertConfig;
use crate::drivers::watchdog;
use crate::error::{Error, Result};

use super::events::AppEvent;
use super::ports::{
    AudioError, AudioPort, ClockPort, ConfigError, ConfigPort, EventSink, InputPort, RelayPort,
    StoragePort, WatchdogPort,
};
use super::service::AlertService;

/// The adapters a [`Runtime`] drives.
pub struct RuntimeParts<H, S, A, W, E> {
    /// Inputs and relay.
    pub hw: H,
    pub storage: S,
    pub audio: A,
    pub watchdog: W,
    pub sink: E,
}

pub struct Runtime<H, S, A, W, E> {
    service: AlertService,
    parts: RuntimeParts<H, S, A, W, E>,
    loop_delay_ms: u32,
}

impl<H, S, A, W, E> Runtime<H, S, A, W, E>
where
    H: InputPort + RelayPort,
    S: StoragePort,
    A: AudioPort<S::Source>,
    W: WatchdogPort,
    E: EventSink,
{
    /// Run the startup sequence.  Any failure is fatal: it is logged,
    /// emitted as [`AppEvent::Fatal`], and returned.
    pub fn boot(
        config: AlertConfig,
        mut parts: RuntimeParts<H, S, A, W, E>,
        now_ms: u32,
    ) -> Result<Self> {
        if let Err(e) = Self::prepare(&config, &mut parts) {
            report_fatal(&mut parts.sink, e);
            return Err(e);
        }

        let mut service = AlertService::new(config);
        let loop_delay_ms = service.config().loop_delay_ms;
        service.start(now_ms, &mut parts.hw, &mut parts.sink);

        Ok(Self {
            service,
            parts,
            loop_delay_ms,
        })
    }

    fn prepare(config: &AlertConfig, parts: &mut RuntimeParts<H, S, A, W, E>) -> Result<()> {
        parts.storage.mount()?;
        info!("Startup: storage mounted");

        let mut source = parts.storage.open(&config.alert_sound)?;
        if !parts.audio.can_play(&mut source) {
            return Err(AudioError::Unsupported.into());
        }
        info!("Startup: alert sound '{}' is playable", config.alert_sound);

        parts.watchdog.begin(config.watchdog_timeout_ms)?;
        info!("Startup: watchdog armed ({} ms)", config.watchdog_timeout_ms);
        Ok(())
    }

    /// One control cycle at `now_ms`.  The watchdog is fed first.
    pub fn run_cycle(&mut self, now_ms: u32) {
        self.parts.watchdog.feed();
        self.service.tick(
            now_ms,
            &mut self.parts.hw,
            &mut self.parts.storage,
            &mut self.parts.audio,
            &mut self.parts.sink,
        );
    }

    /// Run forever: one cycle, then `loop_delay_ms` of sleep.
    pub fn run(mut self, clock: &impl ClockPort, delay: &mut impl DelayNs) -> ! {
        info!("Entering control loop ({} ms cycle)", self.loop_delay_ms);
        loop {
            self.run_cycle(clock.now_ms());
            delay.delay_ms(self.loop_delay_ms);
        }
    }

    pub fn service(&self) -> &AlertService {
        &self.service
    }

    pub fn parts(&self) -> &RuntimeParts<H, S, A, W, E> {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut RuntimeParts<H, S, A, W, E> {
        &mut self.parts
    }
}

/// Read `config.json`.  A missing file means defaults; an unreadable or
/// invalid one is reported and also falls back to defaults.
pub fn load_config(port: &impl ConfigPort) -> AlertConfig {
    match port.load() {
        Ok(config) => {
            info!("Config loaded");
            config
        }
        Err(ConfigError::NotFound) => {
            info!("No stored config, using defaults");
            AlertConfig::default()
        }
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            AlertConfig::default()
        }
    }
}

/// Log and emit a startup failure.  The caller halts.
pub fn report_fatal(sink: &mut impl EventSink, error: Error) {
    error!("Startup failed: {}", error);
    sink.emit(&AppEvent::Fatal(error));
}

/// Park after a fatal startup failure without ever feeding the watchdog.
///
/// The watchdog is armed here if boot did not get that far, so the reset
/// still comes.  If it cannot be armed at all, reset right away.
pub fn halt(watchdog: &mut impl WatchdogPort, timeout_ms: u32) -> ! {
    if let Err(e) = watchdog.begin(timeout_ms) {
        error!("Halt: watchdog unavailable ({})", e);
        watchdog::force_reset();
    }

    error!("Halted; waiting for watchdog reset");
    loop {
        std::thread::park();
    }
}
