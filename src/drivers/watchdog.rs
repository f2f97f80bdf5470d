//! Watchdog supervisor.
//!
//! On ESP-IDF this wraps the Task Watchdog Timer (TWDT): the timeout is
//! reconfigured, panic-on-trigger is enabled, and the control task is
//! subscribed.  A stalled control loop resets the chip.
//!
//! On host builds a supervisor thread tracks a [`WatchdogTimer`] deadline
//! and aborts the process when it expires, so an outer process supervisor
//! restarts it the way the chip would reboot.
//!
//! The control loop must call `feed()` on every cycle.

use crate::app::ports::{WatchdogError, WatchdogPort};

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(target_os = "espidf"))]
use std::sync::{Arc, Mutex};
#[cfg(not(target_os = "espidf"))]
use std::time::{Duration, Instant};

use log::info;

// ---------------------------------------------------------------------------
// Deadline tracking
// ---------------------------------------------------------------------------

/// Pure deadline tracker on a wrapping millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogTimer {
    timeout_ms: u32,
    last_feed_ms: u32,
}

impl WatchdogTimer {
    /// Armed at `now_ms`.
    pub fn new(timeout_ms: u32, now_ms: u32) -> Self {
        Self {
            timeout_ms,
            last_feed_ms: now_ms,
        }
    }

    pub fn feed(&mut self, now_ms: u32) {
        self.last_feed_ms = now_ms;
    }

    /// True once more than `timeout_ms` passed without a feed.
    pub fn expired(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_feed_ms) > self.timeout_ms
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,

    #[cfg(not(target_os = "espidf"))]
    epoch: Instant,
    #[cfg(not(target_os = "espidf"))]
    timer: Option<Arc<Mutex<WatchdogTimer>>>,
    #[cfg(not(target_os = "espidf"))]
    armed: Arc<AtomicBool>,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Create an unarmed watchdog.  Nothing is enforced until
    /// [`WatchdogPort::begin`] succeeds.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            Self { subscribed: false }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            Self {
                epoch: Instant::now(),
                timer: None,
                armed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    /// Whether `begin` succeeded.
    pub fn is_armed(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.subscribed
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.armed.load(Ordering::Acquire)
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn elapsed_ms(epoch: Instant) -> u32 {
        // Truncation is the wrap the timer is built for.
        epoch.elapsed().as_millis() as u32
    }
}

#[cfg(target_os = "espidf")]
impl WatchdogPort for Watchdog {
    fn begin(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        if self.subscribed {
            log::warn!("Watchdog: already subscribed");
            return Ok(());
        }

        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };

            // The bootloader usually starts the TWDT already; fall back to
            // init when it is not running.
            let mut ret = esp_task_wdt_reconfigure(&cfg);
            if ret == ESP_ERR_INVALID_STATE as i32 {
                ret = esp_task_wdt_init(&cfg);
            }
            if ret != ESP_OK as i32 {
                log::error!("Watchdog: TWDT configure failed ({})", ret);
                return Err(WatchdogError::ConfigureFailed(ret));
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            if ret != ESP_OK as i32 {
                log::error!("Watchdog: failed to subscribe ({})", ret);
                return Err(WatchdogError::SubscribeFailed(ret));
            }
        }

        self.subscribed = true;
        info!(
            "Watchdog: subscribed ({} ms timeout, panic on trigger)",
            timeout_ms
        );
        Ok(())
    }

    fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WatchdogPort for Watchdog {
    fn begin(&mut self, timeout_ms: u32) -> Result<(), WatchdogError> {
        if self.armed.load(Ordering::Acquire) {
            log::warn!("Watchdog(sim): already armed");
            return Ok(());
        }

        let epoch = self.epoch;
        let timer = Arc::new(Mutex::new(WatchdogTimer::new(
            timeout_ms,
            Self::elapsed_ms(epoch),
        )));
        let armed = Arc::clone(&self.armed);
        armed.store(true, Ordering::Release);

        let watched = Arc::clone(&timer);
        let poll = Duration::from_millis(u64::from((timeout_ms / 4).max(1)));

        let spawned = std::thread::Builder::new()
            .name("watchdog".into())
            .spawn(move || {
                while armed.load(Ordering::Acquire) {
                    std::thread::sleep(poll);
                    let expired = match watched.lock() {
                        Ok(t) => t.expired(Self::elapsed_ms(epoch)),
                        Err(_) => true,
                    };
                    if expired && armed.load(Ordering::Acquire) {
                        log::error!(
                            "Watchdog(sim): not fed for {} ms, aborting",
                            timeout_ms
                        );
                        std::process::abort();
                    }
                }
            });

        if spawned.is_err() {
            self.armed.store(false, Ordering::Release);
            log::error!("Watchdog(sim): supervisor thread failed to start");
            return Err(WatchdogError::SupervisorFailed);
        }

        self.timer = Some(timer);
        info!("Watchdog(sim): armed ({} ms timeout)", timeout_ms);
        Ok(())
    }

    fn feed(&mut self) {
        if let Some(timer) = &self.timer {
            if let Ok(mut t) = timer.lock() {
                t.feed(Self::elapsed_ms(self.epoch));
            }
        }
    }
}

/// Last resort when no watchdog can be armed: reset immediately.
#[cfg(target_os = "espidf")]
pub fn force_reset() -> ! {
    log::error!("Watchdog: forcing chip restart");
    esp_idf_hal::reset::restart()
}

/// Last resort when no watchdog can be armed: abort the process.
#[cfg(not(target_os = "espidf"))]
pub fn force_reset() -> ! {
    log::error!("Watchdog(sim): forcing process abort");
    std::process::abort()
}

#[cfg(not(target_os = "espidf"))]
impl Drop for Watchdog {
    fn drop(&mut self) {
        self.armed.store(false, Ordering::Release);
    }
}
