//! Pressure Sentry Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    WavPlayer<I2sSink>   FsStorage    Watchdog │
//! │  (Input+Relay)      (AudioPort)          (Storage+    (TWDT)   │
//! │                                           Config)              │
//! │  LogEventSink       MonotonicClock       StdDelay              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        Runtime → AlertService → Controller (pure)      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2s::config::{DataBitWidth, StdConfig};
use esp_idf_hal::i2s::I2sDriver;
use esp_idf_hal::peripherals::Peripherals;

use pressure_sentry::adapters::audio::{I2sSink, WavPlayer};
use pressure_sentry::adapters::delay::StdDelay;
use pressure_sentry::adapters::hardware::HardwareAdapter;
use pressure_sentry::adapters::log_sink::LogEventSink;
use pressure_sentry::adapters::storage::FsStorage;
use pressure_sentry::adapters::time::MonotonicClock;
use pressure_sentry::app::ports::{ClockPort, StoragePort};
use pressure_sentry::app::runtime::{self, Runtime, RuntimeParts};
use pressure_sentry::config::AlertConfig;
use pressure_sentry::drivers::gpio::GpioPin;
use pressure_sentry::drivers::relay::RelayDriver;
use pressure_sentry::drivers::hw_init;
use pressure_sentry::drivers::watchdog::Watchdog;
use pressure_sentry::error::Error;
use pressure_sentry::pins;
use pressure_sentry::sensors::InputSampler;

/// Sample rate the I2S transmitter runs at; the alert sound must match.
const ALERT_SAMPLE_RATE_HZ: u32 = 16_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Pressure Sentry v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let clock = MonotonicClock::new();
    let mut events = LogEventSink::new();

    // ── 2. Config from the storage volume (or defaults) ───────
    // A mount failure here is reported by the boot sequence below.
    let mut storage = FsStorage::new(pins::STORAGE_MOUNT_POINT);
    let config = match storage.mount() {
        Ok(()) => runtime::load_config(&storage),
        Err(_) => AlertConfig::default(),
    };
    let watchdog_timeout_ms = config.watchdog_timeout_ms;

    // ── 3. Digital I/O ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(&config) {
        error!("GPIO init failed: {}", e);
        runtime::report_fatal(&mut events, Error::Init("gpio"));
        runtime::halt(&mut Watchdog::new(), watchdog_timeout_ms);
    }

    let inputs = InputSampler::new(
        GpioPin::new(pins::SENSOR_GPIO),
        GpioPin::new(pins::BUTTON_GPIO),
        &config,
    );
    let relay = RelayDriver::new(GpioPin::new(pins::RELAY_GPIO), config.relay_active_high);
    let hw = HardwareAdapter::new(inputs, relay);

    // ── 4. Audio output ───────────────────────────────────────
    let audio = match init_audio() {
        Ok(sink) => WavPlayer::new(sink),
        Err(e) => {
            error!("I2S init failed: {}", e);
            runtime::report_fatal(&mut events, Error::Init("i2s"));
            runtime::halt(&mut Watchdog::new(), watchdog_timeout_ms);
        }
    };

    // ── 5. Boot sequence → control loop ───────────────────────
    let parts = RuntimeParts {
        hw,
        storage,
        audio,
        watchdog: Watchdog::new(),
        sink: events,
    };

    let app = match Runtime::boot(config, parts, clock.now_ms()) {
        Ok(rt) => rt,
        Err(_) => runtime::halt(&mut Watchdog::new(), watchdog_timeout_ms),
    };

    info!("System ready.");
    app.run(&clock, &mut StdDelay)
}

fn init_audio() -> Result<I2sSink> {
    let peripherals = Peripherals::take()?;
    let std_cfg = StdConfig::philips(ALERT_SAMPLE_RATE_HZ, DataBitWidth::Bits16);

    // SAFETY: the I2S pins are not used by anything else.
    let (bclk, dout, ws) = unsafe {
        (
            AnyIOPin::new(pins::I2S_BCLK_GPIO),
            AnyIOPin::new(pins::I2S_DOUT_GPIO),
            AnyIOPin::new(pins::I2S_WS_GPIO),
        )
    };

    let driver = I2sDriver::new_std_tx(
        peripherals.i2s0,
        &std_cfg,
        bclk,
        dout,
        Option::<AnyIOPin>::None,
        ws,
    )?;

    I2sSink::new(driver, ALERT_SAMPLE_RATE_HZ)
        .map_err(|e| anyhow::anyhow!("I2S enable failed: {}", e))
}
