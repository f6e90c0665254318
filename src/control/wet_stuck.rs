//! Wet-stuck detection.
//!
//! A condensation-pinned SHT3x reads flat on both axes: humidity pegged
//! near 100 % and temperature frozen.  A genuinely humid terrarium still
//! drifts a little sample-to-sample, so the detector requires *every* one
//! of the last [`WET_STUCK_SAMPLES`] readings to be trusted and saturated,
//! and their temperature spread to stay within a small delta.

use crate::config::{HeaterConfig, WET_STUCK_SAMPLES};
use crate::sensors::SampleHistory;

/// Pure predicate over the newest samples in a [`SampleHistory`].
#[derive(Debug, Clone, Copy)]
pub struct WetStuckDetector {
    rh_threshold: f32,
    delta_c: f32,
}

impl WetStuckDetector {
    pub fn new(rh_threshold: f32, delta_c: f32) -> Self {
        Self {
            rh_threshold,
            delta_c,
        }
    }

    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(config.wet_stuck_rh_threshold, config.wet_stuck_delta_c)
    }

    /// True only when the last [`WET_STUCK_SAMPLES`] entries are all
    /// trusted, all at or above the humidity threshold, and span no more
    /// than `delta_c` in temperature.
    pub fn evaluate(&self, history: &SampleHistory) -> bool {
        if history.len() < WET_STUCK_SAMPLES {
            return false;
        }

        let mut min_t = f32::INFINITY;
        let mut max_t = f32::NEG_INFINITY;
        for sample in history.newest(WET_STUCK_SAMPLES) {
            if !sample.is_trusted() || sample.humidity_pct < self.rh_threshold {
                return false;
            }
            min_t = min_t.min(sample.temperature_c);
            max_t = max_t.max(sample.temperature_c);
        }

        max_t - min_t <= self.delta_c
    }
}
