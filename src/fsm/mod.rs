//! Heater pulse state machine.
//!
//! ```text
//!            wet-stuck && gate            pulse_ms elapsed
//!   ┌──────┐ ───────────────▶ ┌─────────┐ ───────────────▶ ┌──────────┐
//!   │ Idle │                  │ Pulsing │                  │ Cooldown │
//!   └──────┘                  └─────────┘                  └──────────┘
//!       ▲            first sample after cooldown_ms              │
//!       └────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine owns timing and the pending-event lifecycle.  It never
//! touches hardware: the controller switches the heater when
//! [`HeaterFsm::start_pulse`] succeeds or [`HeaterFsm::update`] reports
//! the end of a pulse.  A pulse cannot be cancelled; it always runs its
//! full duration.

pub mod pending;

use log::info;
use serde::Serialize;

use crate::config::HeaterConfig;
use crate::diagnostics::HeaterEvent;
use crate::sensors::Reading;
use crate::time::{elapsed_ms, has_elapsed};
use pending::{PendingEvent, PulseCapture};

/// Heater state.  Timestamps are caller monotonic ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaterState {
    Idle,
    Pulsing { started_ms: u32 },
    Cooldown { started_ms: u32 },
}

impl HeaterState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pulsing { .. } => "Pulsing",
            Self::Cooldown { .. } => "Cooldown",
        }
    }
}

/// How heater activity colours a sample taken now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleInfluence {
    pub heater_influenced: bool,
    pub settling: bool,
}

pub struct HeaterFsm {
    state: HeaterState,
    pending: Option<PendingEvent>,
    /// Last heater on/off switch, 0 if never.
    last_heater_ms: u32,
    pulse_ms: u32,
    cooldown_ms: u32,
}

impl HeaterFsm {
    pub fn new(pulse_ms: u32, cooldown_ms: u32) -> Self {
        Self {
            state: HeaterState::Idle,
            pending: None,
            last_heater_ms: 0,
            pulse_ms,
            cooldown_ms,
        }
    }

    pub fn from_config(config: &HeaterConfig) -> Self {
        Self::new(config.pulse_duration_ms, config.cooldown_ms)
    }

    pub fn state(&self) -> HeaterState {
        self.state
    }

    pub fn is_heating(&self) -> bool {
        matches!(self.state, HeaterState::Pulsing { .. })
    }

    pub fn pending(&self) -> Option<&PendingEvent> {
        self.pending.as_ref()
    }

    pub fn last_heater_ms(&self) -> u32 {
        self.last_heater_ms
    }

    /// End the pulse once its fixed duration has elapsed.
    ///
    /// Returns the measured on-time when the heater must be switched off
    /// now; the pending event moves to awaiting its after-sample.
    pub fn update(&mut self, now_ms: u32) -> Option<u32> {
        let HeaterState::Pulsing { started_ms } = self.state else {
            return None;
        };
        let duration_ms = elapsed_ms(now_ms, started_ms);
        if duration_ms < self.pulse_ms {
            return None;
        }

        self.transition(HeaterState::Cooldown { started_ms: now_ms });
        self.last_heater_ms = now_ms;
        self.pending = self.pending.map(|p| p.heating_done(duration_ms));
        Some(duration_ms)
    }

    /// Flag a sample taken at `now_ms`.  The first sample after the
    /// cooldown has run out returns the machine to `Idle`.
    pub fn classify(&mut self, now_ms: u32) -> SampleInfluence {
        match self.state {
            HeaterState::Idle => SampleInfluence::default(),
            HeaterState::Pulsing { .. } => SampleInfluence {
                heater_influenced: true,
                settling: false,
            },
            HeaterState::Cooldown { started_ms }
                if !has_elapsed(now_ms, started_ms, self.cooldown_ms) =>
            {
                SampleInfluence {
                    heater_influenced: false,
                    settling: true,
                }
            }
            HeaterState::Cooldown { .. } => {
                self.transition(HeaterState::Idle);
                SampleInfluence::default()
            }
        }
    }

    /// Heater off, cooldown over, and no event still waiting to close.
    pub fn is_ready(&self, now_ms: u32) -> bool {
        if self.pending.is_some() {
            return false;
        }
        match self.state {
            HeaterState::Idle => true,
            HeaterState::Pulsing { .. } => false,
            HeaterState::Cooldown { started_ms } => {
                has_elapsed(now_ms, started_ms, self.cooldown_ms)
            }
        }
    }

    /// Enter `Pulsing` and open the pending event.
    ///
    /// Returns `false` (and changes nothing) when not [`ready`](Self::is_ready).
    pub fn start_pulse(&mut self, now_ms: u32, capture: PulseCapture) -> bool {
        if !self.is_ready(now_ms) {
            return false;
        }
        self.transition(HeaterState::Pulsing { started_ms: now_ms });
        self.pending = Some(PendingEvent::Open(capture));
        self.last_heater_ms = now_ms;
        true
    }

    /// Close an awaiting event with the sample just taken.
    pub fn complete_pending(&mut self, after: &Reading) -> Option<HeaterEvent> {
        match self.pending {
            Some(PendingEvent::AwaitingAfter {
                capture,
                duration_ms,
            }) => {
                self.pending = None;
                Some(capture.complete(duration_ms, after))
            }
            _ => None,
        }
    }

    /// Back to `Idle` with nothing pending.
    pub fn reset(&mut self) {
        self.state = HeaterState::Idle;
        self.pending = None;
        self.last_heater_ms = 0;
    }

    fn transition(&mut self, next: HeaterState) {
        info!(
            "Heater FSM transition: {} -> {}",
            self.state.name(),
            next.name()
        );
        self.state = next;
    }
}
