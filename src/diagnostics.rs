//! Heater event log and runtime diagnostics.
//!
//! The event log keeps the last [`HEATER_EVENT_CAPACITY`] completed heater
//! pulses in RAM (no persistence) with the humidity/temperature seen just
//! before the pulse and on the first sample after it.  The display and
//! console read it by index, oldest first.
//!
//! [`Diagnostics`] is a derived snapshot assembled on demand from live
//! controller state; it is never stored.

use core::fmt;

use chrono::NaiveDateTime;
use heapless::HistoryBuffer;
use serde::Serialize;

use crate::config::HEATER_EVENT_CAPACITY;

/// Why a heater pulse was fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PulseReason {
    /// Saturated, flat readings: condensation on the sensing element.
    WetStuck,
}

impl PulseReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WetStuck => "wet/stuck",
        }
    }
}

impl fmt::Display for PulseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed heater pulse with before/after conditions.
///
/// `rh_after`/`temp_after_c` are `None` when the closing sample was
/// invalid.  The `Default` value is the zeroed sentinel returned for
/// out-of-range lookups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HeaterEvent {
    /// Wall-clock time the pulse started.
    pub timestamp: NaiveDateTime,
    pub duration_ms: u32,
    /// `None` only on the sentinel.
    pub reason: Option<PulseReason>,
    pub rh_before: f32,
    pub temp_before_c: f32,
    pub rh_after: Option<f32>,
    pub temp_after_c: Option<f32>,
}

impl HeaterEvent {
    /// Humidity change across the pulse (negative when it dried the
    /// sensor), if the after-sample was valid.
    pub fn rh_delta(&self) -> Option<f32> {
        self.rh_after.map(|after| after - self.rh_before)
    }
}

/// Bounded ring of completed heater events, oldest evicted silently.
pub struct HeaterEventLog {
    ring: HistoryBuffer<HeaterEvent, HEATER_EVENT_CAPACITY>,
}

impl HeaterEventLog {
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuffer::new(),
        }
    }

    pub fn record(&mut self, event: HeaterEvent) {
        self.ring.write(event);
    }

    /// Events currently retained (at most [`HEATER_EVENT_CAPACITY`]).
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    /// Event at `index`, 0 = oldest retained.
    pub fn get(&self, index: usize) -> Option<&HeaterEvent> {
        self.ring.oldest_ordered().nth(index)
    }

    /// Oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &HeaterEvent> + '_ {
        self.ring.oldest_ordered()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl Default for HeaterEventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time controller status for display/console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Diagnostics {
    /// A sensor answered at `begin`.
    pub present: bool,
    /// Bus address that answered, 0 when absent.
    pub address: u8,
    pub heater_enabled: bool,
    /// Monotonic ms of the last heater on/off switch, 0 if never.
    pub last_heater_ms: u32,
    pub wet_stuck: bool,
    pub pulses_last_hour: u32,
    /// Sticky; see [`crate::safety`].
    pub condensation_fault: bool,
}
