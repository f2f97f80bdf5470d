//! GPIO / peripheral pin assignments for the Pressure Sentry board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Pressure-anomaly sensor, digital output of the comparator stage.
/// HIGH = anomaly (see `AlertConfig::sensor_active_high`).  Pulled towards
/// the inactive level, so an open line reads as no anomaly.
pub const SENSOR_GPIO: i32 = 4;

/// Acknowledgement / cross-check push button (active LOW by default,
/// pulled to the released level).
pub const BUTTON_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Relay coil driver transistor; the relay switches the indicator light.
pub const RELAY_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Audio (I2S amplifier, MAX98357A class)
// ---------------------------------------------------------------------------

pub const I2S_BCLK_GPIO: i32 = 15;
pub const I2S_WS_GPIO: i32 = 16;
pub const I2S_DOUT_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Mount point of the flash data partition holding the alert sound and
/// `config.json`.
pub const STORAGE_MOUNT_POINT: &str = "/storage";

/// Partition label in the partition table.
pub const STORAGE_PARTITION: &str = "storage";
