//! Condensation fault detection.
//!
//! Short bursts of heater pulses are normal (lid opened, misting cycle).
//! What is not normal is the heater running at its ceiling hour after
//! hour: that points at water ingress or a failed sensor, and heating
//! will not fix it.  The monitor counts pulses in two rolling one-hour
//! buckets and latches a sticky fault once **both** the current and the
//! previous bucket exceed the threshold.
//!
//! ## Bucket lifecycle
//!
//! 1. The first pulse opens epoch 1 (`hours_filled = 1`).
//! 2. Every tick, each whole window elapsed since the epoch start rotates
//!    to the other slot and zeroes it (`hours_filled` saturates at 2).
//! 3. Each pulse increments the active slot.
//! 4. With both slots filled and both above threshold, the fault latches.
//!
//! The latch never clears on its own.  Idle hours rotate the buckets to
//! zero but leave `hours_filled` at 2; only [`CondensationMonitor::clear`]
//! (sensor re-initialisation) resets it.

use log::{error, info};

use crate::config::{CONDENSATION_HOURS, HeaterConfig};
use crate::time::elapsed_ms;

pub struct CondensationMonitor {
    buckets: [u32; CONDENSATION_HOURS],
    current: usize,
    /// Start of the active epoch; `None` until the first pulse.
    epoch_start_ms: Option<u32>,
    hours_filled: usize,
    latched: bool,
    window_ms: u32,
    /// A bucket must exceed this count to count as offending.
    threshold: u32,
}

impl CondensationMonitor {
    pub fn new(window_ms: u32, threshold: u32) -> Self {
        Self {
            buckets: [0; CONDENSATION_HOURS],
            current: 0,
            epoch_start_ms: None,
            hours_filled: 0,
            latched: false,
            window_ms,
            threshold,
        }
    }

    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(config.pulse_window_ms, config.condensation_fault_threshold)
    }

    /// Advance epoch bookkeeping to `now_ms`.
    ///
    /// Rotation is driven by elapsed time, so this runs on every tick,
    /// not only when a pulse fires.
    pub fn roll(&mut self, now_ms: u32) {
        let Some(start) = self.epoch_start_ms else {
            return;
        };
        let epochs = elapsed_ms(now_ms, start) / self.window_ms;
        if epochs == 0 {
            return;
        }
        // Past two rotations every slot is already zero.
        for _ in 0..epochs.min(CONDENSATION_HOURS as u32) {
            self.rotate();
        }
        self.epoch_start_ms = Some(start.wrapping_add(epochs * self.window_ms));
    }

    /// Count a heater pulse starting at `now_ms`.
    pub fn record_pulse(&mut self, now_ms: u32) {
        if self.epoch_start_ms.is_none() {
            self.epoch_start_ms = Some(now_ms);
            self.hours_filled = self.hours_filled.max(1);
            info!("Condensation monitor: first pulse opens hourly epoch");
        }
        self.roll(now_ms);
        self.buckets[self.current] = self.buckets[self.current].saturating_add(1);
    }

    /// Roll to `now_ms` and re-check the latch condition.
    ///
    /// Returns `true` exactly once: on the evaluation that sets the fault.
    pub fn evaluate(&mut self, now_ms: u32) -> bool {
        self.roll(now_ms);
        if self.latched || self.hours_filled < CONDENSATION_HOURS {
            return false;
        }
        let current = self.current_count();
        let previous = self.previous_count();
        if current > self.threshold && previous > self.threshold {
            self.latched = true;
            error!(
                "CONDENSATION FAULT SET: {current} pulses this hour, {previous} last hour \
                 (threshold {})",
                self.threshold
            );
            return true;
        }
        false
    }

    /// Sticky fault flag.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Pulses counted in the active epoch.
    pub fn current_count(&self) -> u32 {
        self.buckets[self.current]
    }

    /// Pulses counted in the epoch before the active one.
    pub fn previous_count(&self) -> u32 {
        self.buckets[(self.current + CONDENSATION_HOURS - 1) % CONDENSATION_HOURS]
    }

    /// Epochs observed so far, saturating at [`CONDENSATION_HOURS`].
    pub fn hours_filled(&self) -> usize {
        self.hours_filled
    }

    /// Reset every counter and the latch.  Only sensor re-initialisation
    /// calls this.
    pub fn clear(&mut self) {
        self.buckets = [0; CONDENSATION_HOURS];
        self.current = 0;
        self.epoch_start_ms = None;
        self.hours_filled = 0;
        self.latched = false;
    }

    // ── Internal ──────────────────────────────────────────────────

    fn rotate(&mut self) {
        self.current = (self.current + 1) % CONDENSATION_HOURS;
        self.buckets[self.current] = 0;
        if self.hours_filled < CONDENSATION_HOURS {
            self.hours_filled += 1;
        }
    }
}
