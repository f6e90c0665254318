//! Port traits: the boundary between the heater controller and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HeaterController (domain)
//! ```
//!
//! The [`Sht3x`](crate::sensors::Sht3x) driver implements
//! [`HumiditySensorPort`]; [`LogEventSink`](crate::adapters::log_sink::LogEventSink)
//! implements [`EventSink`].  Tests substitute mocks for both.

use crate::error::SensorError;
use crate::sensors::Measurement;

// ───────────────────────────────────────────────────────────────
// Humidity sensor port (driven adapter: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// A humidity/temperature sensor with an on-chip heater.
pub trait HumiditySensorPort {
    /// Try to talk to a device at `address`.  On `true` every later call
    /// goes to that address.
    fn probe(&mut self, address: u8) -> bool;

    /// One blocking measurement.
    fn read_measurement(&mut self) -> Result<Measurement, SensorError>;

    /// Switch the heater on or off.
    fn set_heater(&mut self, enabled: bool) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, display
/// status line, console history).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
