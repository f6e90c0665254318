//! Two-phase heater event bookkeeping.
//!
//! A pulse's outcome is only known one sample after the heater switches
//! off.  The state machine therefore carries at most one
//! [`PendingEvent`] (`Option<PendingEvent>`), which moves through:
//!
//! ```text
//!  start_pulse          heater off                next sample
//!  ──────────▶ Open ───────────────▶ AwaitingAfter ──────────▶ HeaterEvent
//! ```

use chrono::NaiveDateTime;

use crate::diagnostics::{HeaterEvent, PulseReason};
use crate::sensors::Reading;

/// Conditions captured at the instant a pulse starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseCapture {
    pub timestamp: NaiveDateTime,
    pub reason: PulseReason,
    pub rh_before: f32,
    pub temp_before_c: f32,
}

impl PulseCapture {
    /// Capture the triggering sample.
    pub fn from_reading(reading: &Reading, reason: PulseReason) -> Self {
        Self {
            timestamp: reading.timestamp,
            reason,
            rh_before: reading.humidity_pct,
            temp_before_c: reading.temperature_c,
        }
    }

    /// Close the event with the first post-pulse sample.  An invalid
    /// sample leaves the after-values empty.
    pub fn complete(self, duration_ms: u32, after: &Reading) -> HeaterEvent {
        HeaterEvent {
            timestamp: self.timestamp,
            duration_ms,
            reason: Some(self.reason),
            rh_before: self.rh_before,
            temp_before_c: self.temp_before_c,
            rh_after: after.humidity(),
            temp_after_c: after.temperature(),
        }
    }
}

/// The single in-flight heater event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingEvent {
    /// Heater is on.
    Open(PulseCapture),
    /// Heater is off; waiting for the next sample.
    AwaitingAfter {
        capture: PulseCapture,
        duration_ms: u32,
    },
}

impl PendingEvent {
    pub fn capture(&self) -> &PulseCapture {
        match self {
            Self::Open(capture) | Self::AwaitingAfter { capture, .. } => capture,
        }
    }

    pub fn is_awaiting_after(&self) -> bool {
        matches!(self, Self::AwaitingAfter { .. })
    }

    /// Heater switched off after `duration_ms`.
    pub fn heating_done(self, duration_ms: u32) -> Self {
        match self {
            Self::Open(capture) => Self::AwaitingAfter {
                capture,
                duration_ms,
            },
            awaiting => awaiting,
        }
    }
}
