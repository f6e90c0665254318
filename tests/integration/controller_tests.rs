//! Integration tests for the HeaterController → state machine → sensor
//! pipeline.
//!
//! These run on the host and drive the controller tick by tick with a
//! scripted sensor and a simulated clock.

use terralid::app::events::AppEvent;
use terralid::config::{HEATER_EVENT_CAPACITY, HeaterConfig, MAX_PULSES_PER_HOUR};
use terralid::diagnostics::PulseReason;
use terralid::fsm::HeaterState;
use terralid::fsm::pending::PendingEvent;
use terralid::sensors::Reading;
use terralid::HeaterController;

use super::mock_hw::{Clock, MockSensor, RecordingSink};

const HOUR: u32 = 3_600_000;

fn make_controller(
    sensor: MockSensor,
    config: HeaterConfig,
) -> (HeaterController<MockSensor>, RecordingSink) {
    let mut c = HeaterController::new(sensor, config).expect("valid config");
    let mut sink = RecordingSink::new();
    c.begin(&mut sink);
    (c, sink)
}

fn tick(c: &mut HeaterController<MockSensor>, clock: &Clock, sink: &mut RecordingSink) {
    c.tick(clock.wall, clock.ms, sink);
}

/// Tick every `step` ms until `duration` has passed.
fn run_for(
    c: &mut HeaterController<MockSensor>,
    clock: &mut Clock,
    sink: &mut RecordingSink,
    duration: u32,
    step: u32,
) {
    let mut elapsed = 0;
    while elapsed < duration {
        clock.advance(step);
        elapsed += step;
        tick(c, clock, sink);
    }
}

fn reads(c: &HeaterController<MockSensor>) -> usize {
    c.sensor()
        .calls
        .iter()
        .filter(|call| matches!(call, super::mock_hw::SensorCall::Read))
        .count()
}

// ── Wet-stuck pulse lifecycle ─────────────────────────────────

#[test]
fn wet_stuck_pulse_is_logged_with_before_and_after_values() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut()
        .push(99.8, 24.0)
        .push(99.8, 24.1)
        .push(93.0, 24.6);

    tick(&mut c, &clock, &mut sink);
    assert!(!c.diagnostics().wet_stuck, "one sample is not enough");

    clock.advance(2_000);
    let pulse_wall = clock.wall;
    tick(&mut c, &clock, &mut sink);
    let d = c.diagnostics();
    assert!(d.wet_stuck);
    assert!(d.heater_enabled);
    assert_eq!(d.last_heater_ms, 2_000);
    assert_eq!(d.pulses_last_hour, 1);
    assert!(c.sensor().heater_on);
    match c.pending_event() {
        Some(PendingEvent::Open(capture)) => {
            assert_eq!(capture.rh_before, 99.8);
            assert_eq!(capture.temp_before_c, 24.1);
            assert_eq!(capture.reason, PulseReason::WetStuck);
        }
        other => panic!("expected open pending event, got {other:?}"),
    }

    clock.advance(500);
    tick(&mut c, &clock, &mut sink);
    assert!(!c.sensor().heater_on, "heater must switch off after 500 ms");
    assert_eq!(c.heater_state(), HeaterState::Cooldown { started_ms: 2_500 });
    assert!(matches!(
        c.pending_event(),
        Some(PendingEvent::AwaitingAfter {
            duration_ms: 500,
            ..
        })
    ));
    assert_eq!(c.heater_event_count(), 0);
    assert_eq!(c.diagnostics().last_heater_ms, 2_500);

    clock.advance(1_500);
    tick(&mut c, &clock, &mut sink);
    let r = c.last_reading();
    assert!(r.valid);
    assert!(r.settling);
    assert!(c.pending_event().is_none());
    assert_eq!(c.heater_event_count(), 1);

    let e = c.heater_event(0);
    assert_eq!(e.timestamp, pulse_wall);
    assert_eq!(e.duration_ms, 500);
    assert_eq!(e.reason, Some(PulseReason::WetStuck));
    assert_eq!(e.rh_before, 99.8);
    assert_eq!(e.temp_before_c, 24.1);
    assert_eq!(e.rh_after, Some(93.0));
    assert_eq!(e.temp_after_c, Some(24.6));

    // The settling sample is not trusted.
    assert_eq!(c.last_trusted_reading().temperature_c, 24.1);

    assert!(matches!(sink.events[0], AppEvent::SensorDetected { address: 0x44 }));
    assert!(matches!(sink.events[1], AppEvent::HeaterEnabled { .. }));
    assert_eq!(sink.events[2], AppEvent::HeaterDisabled { duration_ms: 500 });
    assert_eq!(sink.events[3], AppEvent::PulseCompleted(e));
}

#[test]
fn samples_during_pulse_are_marked_heater_influenced() {
    let config = HeaterConfig {
        sample_interval_ms: 200,
        ..HeaterConfig::default()
    };
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), config);
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 23.0);

    tick(&mut c, &clock, &mut sink);
    clock.advance(200);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(c.heater_state(), HeaterState::Pulsing { started_ms: 200 });

    clock.advance(200);
    tick(&mut c, &clock, &mut sink);
    let r = c.last_reading();
    assert!(r.heater_influenced);
    assert!(!r.settling);
    assert!(c.heater_event_count() == 0, "event closes only after heater off");
}

#[test]
fn invalid_after_sample_leaves_after_values_empty() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().push(99.8, 24.0).push(99.8, 24.0).push_error();

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, 4_000, 500);

    assert_eq!(c.heater_event_count(), 1);
    let e = c.heater_event(0);
    assert_eq!(e.rh_before, 99.8);
    assert_eq!(e.rh_after, None);
    assert_eq!(e.temp_after_c, None);
}

// ── Rate limiting ─────────────────────────────────────────────

#[test]
fn sustained_wet_stuck_pulses_at_most_twelve_times_per_hour() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, HOUR, 500);

    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR);
    assert_eq!(c.diagnostics().pulses_last_hour, MAX_PULSES_PER_HOUR as u32);
    assert!(c.diagnostics().wet_stuck, "still wet, just gated");

    // First pulse at 2 s is exactly one hour old here: still counted.
    run_for(&mut c, &mut clock, &mut sink, 2_000, 500);
    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR);

    // Once it ages out the window admits one more.
    run_for(&mut c, &mut clock, &mut sink, 2_000, 500);
    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR + 1);
}

#[test]
fn pulses_are_spaced_by_at_least_the_sample_interval() {
    let config = HeaterConfig {
        cooldown_ms: 0,
        ..HeaterConfig::default()
    };
    let interval = config.sample_interval_ms;
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), config);
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);

    // Counter time of every heater-on and heater-off edge.
    let mut edges: Vec<(bool, u32)> = Vec::new();
    tick(&mut c, &clock, &mut sink);
    while clock.ms < 60_000 {
        clock.advance(100);
        let before = sink.events.len();
        tick(&mut c, &clock, &mut sink);
        for e in &sink.events[before..] {
            match e {
                AppEvent::HeaterEnabled { .. } => edges.push((true, clock.ms)),
                AppEvent::HeaterDisabled { .. } => edges.push((false, clock.ms)),
                _ => {}
            }
        }
    }

    // Without a cooldown the ceiling is reached within a minute.
    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR);
    let mut checked = 0;
    for w in edges.windows(2) {
        if let [(false, ended), (true, started)] = *w {
            assert!(
                started - ended >= interval,
                "pulse started {} ms after the previous one ended",
                started - ended
            );
            checked += 1;
        }
    }
    assert_eq!(checked, MAX_PULSES_PER_HOUR - 1);
}

/// A pulse ledger pruned every tick never aliases old pulses back into
/// the window after the millisecond counter has come full circle.
#[test]
fn pulse_ledger_forgets_old_pulses_across_a_full_counter_period() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, HOUR, 500);
    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR);

    // Dry and quiet for just over 2^32 ms in total.
    c.sensor_mut().set_steady(50.0, 24.0);
    let mut elapsed = u64::from(HOUR);
    while elapsed < (1u64 << 32) + 100_000 {
        clock.advance(60_000);
        elapsed += 60_000;
        tick(&mut c, &clock, &mut sink);
    }
    assert_eq!(c.diagnostics().pulses_last_hour, 0);

    c.sensor_mut().set_steady(99.9, 24.0);
    run_for(&mut c, &mut clock, &mut sink, 60_000, 500);
    assert_eq!(sink.heater_enabled_count(), MAX_PULSES_PER_HOUR + 1);
}

#[test]
fn event_log_keeps_newest_eight_in_order() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    let start_wall = clock.wall;
    c.sensor_mut().set_steady(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, HOUR, 500);

    assert_eq!(c.heater_event_count(), HEATER_EVENT_CAPACITY);
    let stamps: Vec<_> = c.heater_events().map(|e| e.timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));

    // Twelve pulses 8 s apart from t=2 s; the oldest four were evicted.
    let fifth = start_wall + chrono::TimeDelta::milliseconds(2_000 + 4 * 8_000);
    assert_eq!(c.heater_event(0).timestamp, fifth);
    assert_eq!(c.heater_event(HEATER_EVENT_CAPACITY).duration_ms, 0);
    assert_eq!(c.heater_event(HEATER_EVENT_CAPACITY).reason, None);
}

// ── Condensation fault ────────────────────────────────────────

#[test]
fn two_saturated_hours_latch_condensation_fault() {
    let config = HeaterConfig {
        condensation_fault_threshold: 3,
        ..HeaterConfig::default()
    };
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), config);
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, HOUR, 500);
    assert!(!c.diagnostics().condensation_fault, "one hour is not enough");

    run_for(&mut c, &mut clock, &mut sink, 400_000, 500);
    assert!(c.diagnostics().condensation_fault);
    assert_eq!(sink.fault_count(), 1);
    assert!(sink.events.contains(&AppEvent::CondensationFault {
        current_hour: 4,
        previous_hour: 12,
    }));

    // Dry for three hours: the fault stays.
    c.sensor_mut().set_steady(45.0, 22.0);
    run_for(&mut c, &mut clock, &mut sink, 3 * HOUR, 2_000);
    assert!(c.diagnostics().condensation_fault);
    assert_eq!(sink.fault_count(), 1, "edge reported once");

    // Only re-initialisation clears it.
    assert!(c.begin(&mut sink));
    assert!(!c.diagnostics().condensation_fault);
}

#[test]
fn default_ceiling_cannot_be_exceeded_by_rate_limited_pulses() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, 3 * HOUR, 500);
    assert!(!c.diagnostics().condensation_fault);
    assert_eq!(sink.fault_count(), 0);
}

// ── Timekeeping ───────────────────────────────────────────────

#[test]
fn pulse_across_counter_wrap_keeps_real_duration() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(u32::MAX - 2_999);
    c.sensor_mut()
        .push(99.8, 24.0)
        .push(99.8, 24.0)
        .push(90.0, 24.5);

    tick(&mut c, &clock, &mut sink);
    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);
    assert!(c.diagnostics().heater_enabled);

    clock.advance(500);
    tick(&mut c, &clock, &mut sink);
    assert!(!c.sensor().heater_on);

    clock.advance(1_500);
    assert!(clock.ms < 5_000, "counter should have wrapped");
    tick(&mut c, &clock, &mut sink);
    assert_eq!(c.heater_event_count(), 1);
    assert_eq!(c.heater_event(0).duration_ms, 500);

    // Sample interval still measured correctly after the wrap.
    let before = reads(&c);
    clock.advance(1_999);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(reads(&c), before);
    clock.advance(1);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(reads(&c), before + 1);
}

// ── Sensor presence ───────────────────────────────────────────

#[test]
fn absent_sensor_ticks_are_noops() {
    let (mut c, mut sink) = make_controller(MockSensor::absent(), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);

    assert!(!c.is_present());
    assert_eq!(c.sensor().probes(), vec![0x44, 0x45]);
    assert_eq!(sink.events, vec![AppEvent::SensorMissing]);

    run_for(&mut c, &mut clock, &mut sink, 10_000, 500);
    assert_eq!(reads(&c), 0);
    let d = c.diagnostics();
    assert!(!d.present);
    assert_eq!(d.address, 0);
    assert!(!c.last_reading().valid);
}

#[test]
fn fallback_address_is_used_when_primary_is_silent() {
    let (c, sink) = make_controller(MockSensor::at(0x45), HeaterConfig::default());
    assert!(c.is_present());
    assert_eq!(c.diagnostics().address, 0x45);
    assert_eq!(c.sensor().probes(), vec![0x44, 0x45]);
    assert_eq!(c.sensor().heater_commands(), vec![false]);
    assert_eq!(sink.events, vec![AppEvent::SensorDetected { address: 0x45 }]);
}

#[test]
fn identical_fallback_is_not_probed_twice() {
    let config = HeaterConfig {
        primary_address: 0x44,
        fallback_address: 0x44,
        ..HeaterConfig::default()
    };
    let (c, _sink) = make_controller(MockSensor::absent(), config);
    assert_eq!(c.sensor().probes(), vec![0x44]);
}

#[test]
fn begin_resets_everything() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut().set_steady(99.9, 24.0);
    tick(&mut c, &clock, &mut sink);
    run_for(&mut c, &mut clock, &mut sink, 30_000, 500);
    assert!(c.heater_event_count() > 0);

    assert!(c.begin(&mut sink));
    assert_eq!(c.heater_event_count(), 0);
    assert_eq!(c.heater_state(), HeaterState::Idle);
    assert!(c.pending_event().is_none());
    assert!(!c.last_reading().valid);
    let d = c.diagnostics();
    assert_eq!(d.pulses_last_hour, 0);
    assert_eq!(d.last_heater_ms, 0);
    assert!(!d.wet_stuck);

    // First tick after begin samples immediately.
    let before = reads(&c);
    clock.advance(1);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(reads(&c), before + 1);
}

// ── Invalid data ──────────────────────────────────────────────

#[test]
fn invalid_samples_break_the_wet_stuck_streak() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let mut clock = Clock::starting_at(0);
    c.sensor_mut()
        .push(99.9, 24.0)
        .push_error()
        .push(99.9, 24.0)
        .push(99.9, 24.0);

    tick(&mut c, &clock, &mut sink);
    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);
    assert!(!c.last_reading().valid);
    assert!(c.last_reading().humidity_pct.is_nan());
    assert_eq!(c.last_trusted_reading().humidity_pct, 99.9);

    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(sink.heater_enabled_count(), 0);

    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);
    assert_eq!(sink.heater_enabled_count(), 1);
}

#[test]
fn non_numeric_measurement_is_invalid() {
    let (mut c, mut sink) = make_controller(MockSensor::at(0x44), HeaterConfig::default());
    let clock = Clock::starting_at(0);
    c.sensor_mut().push(f32::NAN, 24.0);
    tick(&mut c, &clock, &mut sink);
    assert!(!c.last_reading().valid);
    assert_eq!(c.last_trusted_reading(), Reading::sentinel());
}

#[test]
fn failed_heater_enable_records_nothing() {
    let mut sensor = MockSensor::at(0x44);
    sensor.fail_heater_enable = true;
    sensor.set_steady(99.9, 24.0);
    let (mut c, mut sink) = make_controller(sensor, HeaterConfig::default());
    let mut clock = Clock::starting_at(0);

    tick(&mut c, &clock, &mut sink);
    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);

    let d = c.diagnostics();
    assert!(d.wet_stuck);
    assert!(!d.heater_enabled);
    assert_eq!(d.pulses_last_hour, 0);
    assert_eq!(d.last_heater_ms, 0);
    assert_eq!(c.heater_state(), HeaterState::Idle);
    assert!(c.pending_event().is_none());
    assert_eq!(sink.heater_enabled_count(), 0);

    // Retried on the next sample once the bus recovers.
    c.sensor_mut().fail_heater_enable = false;
    clock.advance(2_000);
    tick(&mut c, &clock, &mut sink);
    assert!(c.diagnostics().heater_enabled);
    assert_eq!(c.sensor().heater_commands(), vec![false, true, true]);
}
