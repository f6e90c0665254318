//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events through the
//! `log` facade (UART / USB-CDC in production; the host installs the
//! logger).  A display or console adapter would implement the same
//! trait.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::SensorDetected { address } => {
                info!("SHT3x: sensor ready at 0x{address:02X}");
            }
            AppEvent::SensorMissing => {
                warn!("SHT3x: sensor not found");
            }
            AppEvent::HeaterEnabled {
                reason,
                rh_before,
                temp_before_c,
            } => {
                info!(
                    "SHT3x: heater enabled ({reason}) | RH={rh_before:.1}% T={temp_before_c:.2}\u{00b0}C"
                );
            }
            AppEvent::HeaterDisabled { duration_ms } => {
                info!("SHT3x: heater disabled (cooldown) after {duration_ms} ms");
            }
            AppEvent::PulseCompleted(e) => match (e.rh_after, e.rh_delta(), e.temp_after_c) {
                (Some(rh), Some(delta), Some(t)) => info!(
                    "SHT3x: pulse logged | {}ms RH {:.1}% -> {rh:.1}% ({delta:+.1}) \
                     T {:.2} -> {t:.2}\u{00b0}C",
                    e.duration_ms, e.rh_before, e.temp_before_c
                ),
                _ => info!(
                    "SHT3x: pulse logged | {}ms RH {:.1}% -> n/a (invalid sample)",
                    e.duration_ms, e.rh_before
                ),
            },
            AppEvent::CondensationFault {
                current_hour,
                previous_hour,
            } => {
                error!(
                    "SHT3x: condensation fault detected | pulses this hour={current_hour} \
                     last hour={previous_hour}"
                );
            }
        }
    }
}
