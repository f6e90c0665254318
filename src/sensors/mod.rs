//! Sensor subsystem: the SHT3x driver, the reading type, and the
//! sample history ring the detectors run over.

pub mod history;
pub mod sht3x;

use chrono::NaiveDateTime;
use serde::Serialize;

pub use history::SampleHistory;
pub use sht3x::Sht3x;

/// Raw result of one successful sensor transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Measurement {
    /// Both channels carry a real number.
    pub fn is_numeric(&self) -> bool {
        !(self.temperature_c.is_nan() || self.humidity_pct.is_nan())
    }
}

/// One classified sample, as stored in history.
///
/// An invalid reading keeps NaN in both numeric fields; consumers must
/// check `valid` (or use [`Reading::is_trusted`]) before using them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    /// The transaction succeeded and both values are numeric.
    pub valid: bool,
    /// Taken while a heater pulse was active.
    pub heater_influenced: bool,
    /// Taken during the post-pulse cooldown, heater already off.
    pub settling: bool,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub timestamp: NaiveDateTime,
}

impl Reading {
    /// "No trustworthy data yet": invalid, zeroed, stamped at the Unix epoch.
    pub fn sentinel() -> Self {
        Self {
            valid: false,
            heater_influenced: false,
            settling: false,
            temperature_c: 0.0,
            humidity_pct: 0.0,
            timestamp: NaiveDateTime::default(),
        }
    }

    /// Classify a sensor result.  Transaction errors and NaN values both
    /// yield an invalid reading.
    pub fn classify(
        measurement: Option<Measurement>,
        heater_influenced: bool,
        settling: bool,
        timestamp: NaiveDateTime,
    ) -> Self {
        match measurement.filter(Measurement::is_numeric) {
            Some(m) => Self {
                valid: true,
                heater_influenced,
                settling,
                temperature_c: m.temperature_c,
                humidity_pct: m.humidity_pct,
                timestamp,
            },
            None => Self {
                valid: false,
                heater_influenced,
                settling,
                temperature_c: f32::NAN,
                humidity_pct: f32::NAN,
                timestamp,
            },
        }
    }

    /// Valid and free of any heater disturbance.
    pub fn is_trusted(&self) -> bool {
        self.valid && !self.heater_influenced && !self.settling
    }

    /// Humidity, if this reading is valid.
    pub fn humidity(&self) -> Option<f32> {
        self.valid.then_some(self.humidity_pct)
    }

    /// Temperature, if this reading is valid.
    pub fn temperature(&self) -> Option<f32> {
        self.valid.then_some(self.temperature_c)
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::sentinel()
    }
}
