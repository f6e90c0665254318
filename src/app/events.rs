//! Outbound controller events.
//!
//! The [`HeaterController`](super::service::HeaterController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::diagnostics::{HeaterEvent, PulseReason};

/// Structured events emitted by the heater controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A sensor answered during `begin`.
    SensorDetected { address: u8 },

    /// Neither configured address answered.
    SensorMissing,

    /// A heater pulse started.
    HeaterEnabled {
        reason: PulseReason,
        rh_before: f32,
        temp_before_c: f32,
    },

    /// The heater switched off after its fixed pulse.
    HeaterDisabled { duration_ms: u32 },

    /// A pulse's before/after record was closed and logged.
    PulseCompleted(HeaterEvent),

    /// The sticky condensation fault latched.
    CondensationFault { current_hour: u32, previous_hour: u32 },
}
