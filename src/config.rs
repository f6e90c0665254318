//! Heater controller configuration.
//!
//! Ring capacities are compile-time constants because they size inline
//! buffers.  Everything else is a runtime tunable in [`HeaterConfig`],
//! which the console or persistence layer may load and hand to the
//! controller.  Defaults reproduce the shipped lid behaviour.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::MAX_INTERVAL_MS;

// --- Structural capacities ---

/// Readings kept in the sample history ring.
pub const HISTORY_CAPACITY: usize = 4;
/// Consecutive trusted samples the wet-stuck detector inspects.
pub const WET_STUCK_SAMPLES: usize = 2;
/// Hard ceiling on heater pulses in any trailing pulse window.
/// Also the capacity of the pulse timestamp ledger.
pub const MAX_PULSES_PER_HOUR: usize = 12;
/// Completed heater events retained for display/console.
pub const HEATER_EVENT_CAPACITY: usize = 8;
/// Hourly buckets tracked by the condensation fault detector.
pub const CONDENSATION_HOURS: usize = 2;

/// Default SHT3x address (ADDR pin low).
pub const SHT3X_PRIMARY_ADDRESS: u8 = 0x44;
/// Alternate SHT3x address (ADDR pin high).
pub const SHT3X_FALLBACK_ADDRESS: u8 = 0x45;

/// Runtime tunables for the anti-condensation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    // --- Sampling ---
    /// Minimum spacing between sensor reads; also the pulse debounce.
    pub sample_interval_ms: u32,

    // --- Wet-stuck detection ---
    /// Humidity at or above which a sample counts as saturated (%RH).
    pub wet_stuck_rh_threshold: f32,
    /// Largest temperature spread (°C) still considered "flat".
    pub wet_stuck_delta_c: f32,

    // --- Heater pulses ---
    /// Fixed heater on-time per pulse.
    pub pulse_duration_ms: u32,
    /// Settling time after the heater switches off.
    pub cooldown_ms: u32,
    /// Trailing window for the pulse ceiling and the hourly fault buckets.
    pub pulse_window_ms: u32,

    // --- Fault ---
    /// Per-bucket pulse count that must be exceeded in two consecutive
    /// windows before the condensation fault latches.
    pub condensation_fault_threshold: u32,

    // --- Bus ---
    pub primary_address: u8,
    pub fallback_address: u8,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 2_000,

            wet_stuck_rh_threshold: 99.5,
            wet_stuck_delta_c: 0.2,

            pulse_duration_ms: 500,
            cooldown_ms: 5_000,
            pulse_window_ms: 60 * 60 * 1_000,

            condensation_fault_threshold: MAX_PULSES_PER_HOUR as u32,

            primary_address: SHT3X_PRIMARY_ADDRESS,
            fallback_address: SHT3X_FALLBACK_ADDRESS,
        }
    }
}

impl HeaterConfig {
    /// Reject values the control loop cannot run with.
    ///
    /// Every duration must fit in [`MAX_INTERVAL_MS`] so wrap-safe
    /// comparisons stay unambiguous.
    pub fn validate(&self) -> Result<()> {
        if self.sample_interval_ms == 0 {
            return Err(Error::Config("sample_interval_ms must be > 0"));
        }
        if self.pulse_duration_ms == 0 {
            return Err(Error::Config("pulse_duration_ms must be > 0"));
        }
        if self.pulse_window_ms == 0 {
            return Err(Error::Config("pulse_window_ms must be > 0"));
        }
        let longest = self
            .sample_interval_ms
            .max(self.pulse_duration_ms)
            .max(self.cooldown_ms)
            .max(self.pulse_window_ms);
        if longest > MAX_INTERVAL_MS {
            return Err(Error::Config("durations must be below 2^31 ms"));
        }
        if !(self.wet_stuck_rh_threshold > 0.0 && self.wet_stuck_rh_threshold <= 100.0) {
            return Err(Error::Config("wet_stuck_rh_threshold must be in (0, 100]"));
        }
        if !(self.wet_stuck_delta_c >= 0.0 && self.wet_stuck_delta_c.is_finite()) {
            return Err(Error::Config("wet_stuck_delta_c must be finite and >= 0"));
        }
        if self.primary_address > 0x7F || self.fallback_address > 0x7F {
            return Err(Error::Config("I2C addresses must be 7-bit"));
        }
        Ok(())
    }
}
