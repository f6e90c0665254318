//! Heater pulse rate limiter.
//!
//! The ledger holds the start times of pulses younger than the window,
//! at most [`MAX_PULSES_PER_HOUR`] of them.  Its capacity is the hourly
//! ceiling itself: when every slot holds a pulse younger than the window,
//! no further pulse is allowed until the oldest one ages out.
//!
//! Ages use wrap-safe arithmetic, which is only unambiguous for ages
//! below 2^32 ms.  The controller calls [`PulseLimiter::prune`] every tick,
//! dropping entries as soon as they leave the window, so a counter
//! rollover can never alias a stale entry back into it.
//!
//! The debounce is measured from the end of the previous pulse.

use heapless::Vec;

use crate::config::{HeaterConfig, MAX_PULSES_PER_HOUR};
use crate::time::{elapsed_ms, has_elapsed};

pub struct PulseLimiter {
    /// Pulse start times, oldest first.
    ledger: Vec<u32, MAX_PULSES_PER_HOUR>,
    /// Heater-off time of the last pulse, until the debounce has passed.
    last_pulse_end_ms: Option<u32>,
    /// Minimum spacing between a pulse ending and the next one starting.
    debounce_ms: u32,
    window_ms: u32,
}

impl PulseLimiter {
    pub fn new(debounce_ms: u32, window_ms: u32) -> Self {
        Self {
            ledger: Vec::new(),
            last_pulse_end_ms: None,
            debounce_ms,
            window_ms,
        }
    }

    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(config.sample_interval_ms, config.pulse_window_ms)
    }

    /// Debounce and hourly ceiling both permit a pulse at `now_ms`.
    ///
    /// Heater and cooldown state are checked by the state machine, not
    /// here.
    pub fn allows(&self, now_ms: u32) -> bool {
        if let Some(end) = self.last_pulse_end_ms {
            if !has_elapsed(now_ms, end, self.debounce_ms) {
                return false;
            }
        }
        self.pulses_in_window(now_ms) < MAX_PULSES_PER_HOUR
    }

    /// Log a pulse start.  The oldest entry is dropped if the ledger is
    /// still full.
    pub fn record_pulse(&mut self, now_ms: u32) {
        self.prune(now_ms);
        if self.ledger.is_full() {
            self.ledger.remove(0);
        }
        // Cannot fail: a slot was freed above.
        let _ = self.ledger.push(now_ms);
    }

    /// Log the heater switching off; the debounce runs from here.
    pub fn record_pulse_end(&mut self, now_ms: u32) {
        self.last_pulse_end_ms = Some(now_ms);
    }

    /// Forget everything that no longer affects a decision at `now_ms`:
    /// ledger entries older than the window and an expired debounce.
    pub fn prune(&mut self, now_ms: u32) {
        let window_ms = self.window_ms;
        self.ledger
            .retain(|&started| elapsed_ms(now_ms, started) <= window_ms);
        if let Some(end) = self.last_pulse_end_ms {
            if has_elapsed(now_ms, end, self.debounce_ms) {
                self.last_pulse_end_ms = None;
            }
        }
    }

    /// Pulses whose age is at most one window.
    pub fn pulses_in_window(&self, now_ms: u32) -> usize {
        self.ledger
            .iter()
            .filter(|&&started| elapsed_ms(now_ms, started) <= self.window_ms)
            .count()
    }

    pub fn last_pulse_end_ms(&self) -> Option<u32> {
        self.last_pulse_end_ms
    }

    /// Forget every recorded pulse.
    pub fn clear(&mut self) {
        self.ledger.clear();
        self.last_pulse_end_ms = None;
    }
}
