//! System configuration parameters
//!
//! All tunable parameters for the Pressure Sentry controller.
//! Values can be overridden by a `config.json` file on the storage volume.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Maximum length of the alert sound file name.
pub const SOUND_NAME_CAPACITY: usize = 32;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    // --- Input ---
    /// Minimum time between two accepted button presses (milliseconds)
    pub debounce_ms: u32,
    /// Sensor line reads HIGH while a pressure anomaly is present
    pub sensor_active_high: bool,
    /// Button line reads LOW while pressed (pull-up wiring)
    pub button_active_low: bool,

    // --- Indicator ---
    /// Relay coil is energised by driving the pin HIGH
    pub relay_active_high: bool,
    /// How long a manual cross-check keeps the indicator lit (milliseconds)
    pub cross_check_duration_ms: u32,

    // --- Audio ---
    /// Pause between the end of one alert playback and the next (milliseconds)
    pub alert_repeat_delay_ms: u32,
    /// Alert sound file name, relative to the storage root
    pub alert_sound: heapless::String<SOUND_NAME_CAPACITY>,

    // --- Timing ---
    /// Watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Idle delay at the end of every control cycle (milliseconds)
    pub loop_delay_ms: u32,
    /// Status report interval (milliseconds)
    pub status_interval_ms: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let mut alert_sound = heapless::String::new();
        // Fits: the literal is shorter than SOUND_NAME_CAPACITY.
        let _ = alert_sound.push_str("alert.wav");

        Self {
            // Input
            debounce_ms: 50,
            sensor_active_high: true,
            button_active_low: true,

            // Indicator
            relay_active_high: true,
            cross_check_duration_ms: 2_000,

            // Audio
            alert_repeat_delay_ms: 10_000,
            alert_sound,

            // Timing
            watchdog_timeout_ms: 2_000,
            loop_delay_ms: 5,
            status_interval_ms: 60_000, // 1/min
        }
    }
}

impl AlertConfig {
    /// Range-check every field.
    ///
    /// The watchdog must tolerate at least ten loop periods, otherwise a
    /// slow cycle would reset a healthy device.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce_ms must be > 0"));
        }
        if self.cross_check_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "cross_check_duration_ms must be > 0",
            ));
        }
        if self.alert_sound.is_empty() {
            return Err(ConfigError::ValidationFailed("alert_sound must not be empty"));
        }
        if self.watchdog_timeout_ms < self.loop_delay_ms.saturating_mul(10).max(1) {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must be >= 10 x loop_delay_ms",
            ));
        }
        if self.status_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("status_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.  Missing fields take defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}
