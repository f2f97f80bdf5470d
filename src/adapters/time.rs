//! Monotonic clock adapter.
//!
//! The control loop reads this once per cycle as a `u32` millisecond count.
//! On the device it is the ESP-IDF high-resolution timer
//! (`esp_timer_get_time()`), which starts at boot; on the host it counts
//! from construction with `std::time::Instant`.

use crate::app::ports::ClockPort;

/// Milliseconds since boot, backed by the platform's microsecond timer.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads a free-running hardware counter; no preconditions.
        (unsafe { esp_idf_sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for MonotonicClock {
    /// Wraps every ~49.7 days; consumers compare with `wrapping_sub`.
    fn now_ms(&self) -> u32 {
        (self.uptime_us() / 1_000) as u32
    }
}
