//! Heater controller: the hexagonal core.
//!
//! [`HeaterController`] owns the sample history, the detectors, the pulse
//! state machine and the event log.  The host calls
//! [`tick`](HeaterController::tick) from its main loop with the current
//! wall-clock time and a wrapping millisecond counter; the controller
//! never reads a clock itself.
//!
//! ```text
//!  HumiditySensorPort ◀──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                          │       HeaterController       │
//!                          │ History · WetStuck · Limiter │
//!                          │ PulseFsm · Condensation      │
//!                          └──────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use log::{debug, error, info, warn};

use crate::config::HeaterConfig;
use crate::control::{PulseLimiter, WetStuckDetector};
use crate::diagnostics::{Diagnostics, HeaterEvent, HeaterEventLog, PulseReason};
use crate::error::Result;
use crate::fsm::pending::{PendingEvent, PulseCapture};
use crate::fsm::{HeaterFsm, HeaterState};
use crate::safety::CondensationMonitor;
use crate::sensors::{Reading, SampleHistory};
use crate::time::has_elapsed;

use super::events::AppEvent;
use super::ports::{EventSink, HumiditySensorPort};

// ───────────────────────────────────────────────────────────────
// HeaterController
// ───────────────────────────────────────────────────────────────

/// Anti-condensation controller for one humidity sensor.
pub struct HeaterController<S> {
    sensor: S,
    config: HeaterConfig,

    present: bool,
    /// Address that answered at `begin`, 0 when absent.
    address: u8,
    /// `None` forces a sample on the next tick.
    last_sample_ms: Option<u32>,
    last_reading: Reading,
    wet_stuck: bool,
    pulses_last_hour: u32,

    history: SampleHistory,
    detector: WetStuckDetector,
    limiter: PulseLimiter,
    monitor: CondensationMonitor,
    fsm: HeaterFsm,
    events: HeaterEventLog,
}

impl<S: HumiditySensorPort> HeaterController<S> {
    /// Build a controller around `sensor`.  Fails only on invalid config.
    ///
    /// Does **not** touch the bus; call [`begin`](Self::begin) next.
    pub fn new(sensor: S, config: HeaterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: WetStuckDetector::from_config(&config),
            limiter: PulseLimiter::from_config(&config),
            monitor: CondensationMonitor::from_config(&config),
            fsm: HeaterFsm::from_config(&config),
            sensor,
            config,
            present: false,
            address: 0,
            last_sample_ms: None,
            last_reading: Reading::sentinel(),
            wet_stuck: false,
            pulses_last_hour: 0,
            history: SampleHistory::new(),
            events: HeaterEventLog::new(),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reset all state, then probe the primary and fallback addresses.
    ///
    /// Everything is cleared, including the condensation fault latch and
    /// the event log.  Returns whether a sensor answered.
    pub fn begin(&mut self, sink: &mut impl EventSink) -> bool {
        self.reset_state();

        let primary = self.config.primary_address;
        let fallback = self.config.fallback_address;
        let found = if self.sensor.probe(primary) {
            Some(primary)
        } else if fallback != primary && self.sensor.probe(fallback) {
            Some(fallback)
        } else {
            None
        };

        let Some(address) = found else {
            warn!("SHT3x: no sensor at 0x{primary:02X} or 0x{fallback:02X}");
            sink.emit(&AppEvent::SensorMissing);
            return false;
        };

        self.present = true;
        self.address = address;
        if let Err(e) = self.sensor.set_heater(false) {
            warn!("SHT3x: heater disable at init failed: {e}");
        }
        info!("SHT3x: sensor detected at 0x{address:02X}");
        sink.emit(&AppEvent::SensorDetected { address });
        true
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle.
    ///
    /// A no-op while no sensor is present.  Between samples only the
    /// pulse timer and the fault epochs advance.
    pub fn tick(&mut self, now: NaiveDateTime, now_ms: u32, sink: &mut impl EventSink) {
        if !self.present {
            return;
        }

        // 1. End a finished pulse; roll fault epochs and the pulse ledger
        if let Some(duration_ms) = self.fsm.update(now_ms) {
            if let Err(e) = self.sensor.set_heater(false) {
                warn!("SHT3x: heater disable failed: {e}");
            }
            self.limiter.record_pulse_end(now_ms);
            info!("SHT3x: heater disabled (cooldown)");
            sink.emit(&AppEvent::HeaterDisabled { duration_ms });
        }
        self.monitor.roll(now_ms);
        self.limiter.prune(now_ms);

        // 2. Sample interval
        if let Some(last) = self.last_sample_ms {
            if !has_elapsed(now_ms, last, self.config.sample_interval_ms) {
                return;
            }
        }
        self.last_sample_ms = Some(now_ms);

        // 3. Read
        let measurement = match self.sensor.read_measurement() {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("SHT3x: read failed: {e}");
                None
            }
        };

        // 4. Classify
        let influence = self.fsm.classify(now_ms);
        let reading = Reading::classify(
            measurement,
            influence.heater_influenced,
            influence.settling,
            now,
        );
        if reading.valid {
            debug!(
                "SHT3x: T={:.2}C RH={:.2}% heater={} settling={}",
                reading.temperature_c,
                reading.humidity_pct,
                reading.heater_influenced,
                reading.settling
            );
        } else if measurement.is_some() {
            warn!("SHT3x: non-numeric sample discarded");
        }

        // 5. Record
        self.history.record(reading);
        self.last_reading = reading;

        // 6–7. Detect and maybe pulse
        self.wet_stuck = self.detector.evaluate(&self.history);
        if self.wet_stuck {
            self.try_start_pulse(&reading, now_ms, sink);
        }

        // 8. Window count
        self.pulses_last_hour = u32::try_from(self.limiter.pulses_in_window(now_ms))
            .unwrap_or(u32::MAX);

        // 9. Close the event awaiting this sample
        if let Some(event) = self.fsm.complete_pending(&reading) {
            self.events.record(event);
            sink.emit(&AppEvent::PulseCompleted(event));
        }

        // 10. Fault latch
        if self.monitor.evaluate(now_ms) {
            error!("SHT3x: condensation fault detected");
            sink.emit(&AppEvent::CondensationFault {
                current_hour: self.monitor.current_count(),
                previous_hour: self.monitor.previous_count(),
            });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// The most recent sample, valid or not.  Sentinel before the first.
    pub fn last_reading(&self) -> Reading {
        self.last_reading
    }

    /// Newest valid, heater-free, non-settling sample, else the sentinel.
    pub fn last_trusted_reading(&self) -> Reading {
        self.history.most_recent_trusted()
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            present: self.present,
            address: self.address,
            heater_enabled: self.fsm.is_heating(),
            last_heater_ms: self.fsm.last_heater_ms(),
            wet_stuck: self.wet_stuck,
            pulses_last_hour: self.pulses_last_hour,
            condensation_fault: self.monitor.is_latched(),
        }
    }

    pub fn heater_event_count(&self) -> usize {
        self.events.len()
    }

    /// Event at `index` (0 = oldest retained).  Out of range yields the
    /// zeroed sentinel.
    pub fn heater_event(&self, index: usize) -> HeaterEvent {
        self.events.get(index).copied().unwrap_or_default()
    }

    /// Retained events, oldest first.
    pub fn heater_events(&self) -> impl Iterator<Item = &HeaterEvent> + '_ {
        self.events.iter()
    }

    pub fn heater_state(&self) -> HeaterState {
        self.fsm.state()
    }

    /// The in-flight pulse record, if any.
    pub fn pending_event(&self) -> Option<&PendingEvent> {
        self.fsm.pending()
    }

    pub fn config(&self) -> &HeaterConfig {
        &self.config
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Tear down the controller and hand the sensor back.
    pub fn into_sensor(self) -> S {
        self.sensor
    }

    // ── Internal ──────────────────────────────────────────────

    fn try_start_pulse(&mut self, trigger: &Reading, now_ms: u32, sink: &mut impl EventSink) {
        if !self.fsm.is_ready(now_ms) || !self.limiter.allows(now_ms) {
            debug!("SHT3x: wet/stuck, pulse gated");
            return;
        }
        if let Err(e) = self.sensor.set_heater(true) {
            warn!("SHT3x: heater enable failed: {e}");
            return;
        }

        let reason = PulseReason::WetStuck;
        let capture = PulseCapture::from_reading(trigger, reason);
        if !self.fsm.start_pulse(now_ms, capture) {
            return;
        }
        self.limiter.record_pulse(now_ms);
        self.monitor.record_pulse(now_ms);

        info!("SHT3x: heater enabled ({reason})");
        sink.emit(&AppEvent::HeaterEnabled {
            reason,
            rh_before: capture.rh_before,
            temp_before_c: capture.temp_before_c,
        });
    }

    fn reset_state(&mut self) {
        self.present = false;
        self.address = 0;
        self.last_sample_ms = None;
        self.last_reading = Reading::sentinel();
        self.wet_stuck = false;
        self.pulses_last_hour = 0;
        self.history.clear();
        self.limiter.clear();
        self.monitor.clear();
        self.fsm.reset();
        self.events.clear();
    }
}
