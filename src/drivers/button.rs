//! Debounced acknowledgement button.
//!
//! ## Hardware
//!
//! Momentary switch, polled once per control cycle.  The polarity is
//! resolved by the caller; this driver only sees "pressed" / "released".
//!
//! ## Debounce policy
//!
//! A press is the released → pressed edge.  It is accepted only if more
//! than `debounce_ms` have passed since the previously accepted press.
//! Contact bounce shows up as a burst of edges within a few milliseconds;
//! only the first edge of the burst survives.
//!
//! | Condition                                  | Result    |
//! |--------------------------------------------|-----------|
//! | level unchanged or released                | rejected  |
//! | edge, no press accepted yet                | accepted  |
//! | edge, `now - last_accepted > debounce_ms`  | accepted  |
//! | edge, `now - last_accepted <= debounce_ms` | rejected  |

pub const DEFAULT_DEBOUNCE_MS: u32 = 50;

pub struct DebouncedButton {
    debounce_ms: u32,
    /// Level seen on the previous poll.
    was_pressed: bool,
    /// Timestamp of the last accepted press.
    last_accepted_ms: Option<u32>,
}

impl DebouncedButton {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            was_pressed: false,
            last_accepted_ms: None,
        }
    }

    /// Call once per control cycle with the current logical level.
    /// `now_ms` is the cycle's monotonic clock reading.
    /// Returns `true` if this poll produced an accepted press.
    pub fn poll(&mut self, pressed: bool, now_ms: u32) -> bool {
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;

        if !edge {
            return false;
        }

        let clear = match self.last_accepted_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) > self.debounce_ms,
        };

        if clear {
            self.last_accepted_ms = Some(now_ms);
        }
        clear
    }

    /// Timestamp of the last accepted press, if any.
    pub fn last_accepted_ms(&self) -> Option<u32> {
        self.last_accepted_ms
    }
}

impl Default for DebouncedButton {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
