//! End-to-end tests driving `Load` through its public surface with manually
//! filled accumulators and a deterministic clock.

use std::sync::Arc;

use eload_core::accumulator::AccumulatorBank;
use eload_core::config::{ChannelScale, CoreCfg, SamplingCfg, ScalingCfg};
use eload_core::mocks::{IdlePanel, NullDisplay, RecordingDisplay, RecordingSink, ScriptedPanel};
use eload_core::{Load, Readings};
use eload_traits::clock::ManualClock;
use eload_traits::{Channel, Field, InputEvent};
use rstest::rstest;

/// Identity channel transform so raw counts pass through as calibrated
/// values (multiples of 10 avoid the display rounding bump).
fn identity_scaling() -> ScalingCfg {
    let unity = ChannelScale {
        num: 1,
        den: 1,
        calib_permille: 1000,
    };
    ScalingCfg {
        voltage: unity,
        current: unity,
    }
}

fn identity_cfg(window: u32) -> CoreCfg {
    CoreCfg {
        sampling: SamplingCfg {
            window,
            rate_hz: 5_000,
        },
        scaling: identity_scaling(),
        ..CoreCfg::default()
    }
}

fn fill(bank: &AccumulatorBank, channel: Channel, raw: u16, n: u32) {
    for _ in 0..n {
        bank.channel(channel).record(raw);
    }
}

fn build(
    bank: Arc<AccumulatorBank>,
    cfg: CoreCfg,
    sink: RecordingSink,
    display: RecordingDisplay,
    clock: ManualClock,
) -> Load {
    Load::builder()
        .with_duty_sink(Box::new(sink))
        .with_display(Box::new(display))
        .with_input_panel(Box::new(IdlePanel))
        .with_accumulators(bank)
        .with_config(cfg)
        .with_clock(Box::new(clock))
        .try_build()
        .unwrap()
}

#[test]
fn disconnected_load_forces_zero_duty() {
    let bank = Arc::new(AccumulatorBank::new());
    let sink = RecordingSink::new();
    let mut load = build(
        bank.clone(),
        identity_cfg(1),
        sink.clone(),
        RecordingDisplay::new(),
        ManualClock::new(),
    );

    // Setpoint 1000 mA, calibrated current 0 mA: load disconnected.
    fill(&bank, Channel::Current, 0, 1);
    let report = load.service().unwrap();
    assert_eq!(report.duty, Some(0));
    assert_eq!(sink.last(), Some(0));
}

#[test]
fn unity_gains_converge_to_steady_duty() {
    let bank = Arc::new(AccumulatorBank::new());
    let sink = RecordingSink::new();
    let mut load = build(
        bank.clone(),
        identity_cfg(1),
        sink.clone(),
        RecordingDisplay::new(),
        ManualClock::new(),
    );

    // Load connects and current rises toward the 1000 mA setpoint.
    let trajectory = [300u16, 600, 900, 1000, 1000, 1000, 1000];
    let mut duties = Vec::new();
    for raw in trajectory {
        fill(&bank, Channel::Current, raw, 1);
        let report = load.service().unwrap();
        duties.push(report.duty.unwrap());
    }
    // Never negative (type-level) and under the actuator top.
    assert!(duties.iter().all(|&d| d <= 833));
    // Error is zero and history settled: the last two commands are equal.
    let n = duties.len();
    assert_eq!(duties[n - 1], duties[n - 2]);
    assert!(duties[n - 1] > 0);
    assert_eq!(load.readings().current_ma, 1000);
}

#[test]
fn refresh_divider_paces_paired_display_updates() {
    let bank = Arc::new(AccumulatorBank::new());
    let display = RecordingDisplay::new();
    let mut load = build(
        bank.clone(),
        identity_cfg(1),
        RecordingSink::new(),
        display.clone(),
        ManualClock::new(),
    );

    // Seven voltage windows: the divider (6) fires exactly once, pairing
    // voltage with power.
    for _ in 0..7 {
        fill(&bank, Channel::Voltage, 5500, 1);
        load.service().unwrap();
    }
    let writes = display.writes();
    let fields: Vec<Field> = writes.iter().map(|(f, _)| *f).collect();
    assert_eq!(fields, vec![Field::Voltage, Field::Power]);
}

#[test]
fn power_is_derived_from_both_channels() {
    let bank = Arc::new(AccumulatorBank::new());
    let mut load = build(
        bank.clone(),
        identity_cfg(1),
        RecordingSink::new(),
        RecordingDisplay::new(),
        ManualClock::new(),
    );

    fill(&bank, Channel::Voltage, 5000, 1);
    load.service().unwrap();
    fill(&bank, Channel::Current, 2000, 1);
    load.service().unwrap();

    // 5000 mV * 2000 mA = 10_000_000 uW = 10_000 mW
    assert_eq!(
        load.readings(),
        Readings {
            voltage_mv: 5000,
            current_ma: 2000,
            power_mw: 10_000,
        }
    );
}

#[test]
fn scripted_input_steps_setpoint_between_lockouts() {
    let bank = Arc::new(AccumulatorBank::new());
    let display = RecordingDisplay::new();
    let clock = ManualClock::new();
    let mut load = Load::builder()
        .with_duty_sink(Box::new(RecordingSink::new()))
        .with_display(Box::new(display.clone()))
        .with_input_panel(Box::new(ScriptedPanel::new([
            InputEvent::FineUp,
            InputEvent::FineUp,
            InputEvent::CoarseUp,
        ])))
        .with_accumulators(bank)
        .with_config(identity_cfg(1))
        .with_clock(Box::new(clock.clone()))
        .try_build()
        .unwrap();

    for _ in 0..3 {
        load.service().unwrap();
        clock.advance(std::time::Duration::from_millis(200));
    }
    // 1000 + 100 + 100 + 1000
    assert_eq!(load.setpoint_ma(), 2200);
    // Each accepted transition redraws the setpoint field only.
    let writes = display.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|(f, _)| *f == Field::Setpoint));
    assert_eq!(writes[2].1, vec![2, 2, 0]);
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(250)]
fn window_must_fill_before_a_reading(#[case] window: u32) {
    let bank = Arc::new(AccumulatorBank::new());
    let mut load = build(
        bank.clone(),
        identity_cfg(window),
        RecordingSink::new(),
        RecordingDisplay::new(),
        ManualClock::new(),
    );

    fill(&bank, Channel::Current, 500, window - 1);
    let report = load.service().unwrap();
    assert_eq!(report.current_window, None);
    assert_eq!(report.duty, None);

    fill(&bank, Channel::Current, 500, 1);
    let report = load.service().unwrap();
    assert_eq!(report.current_window, Some(500));
    assert!(report.duty.is_some());
}

#[test]
fn held_key_is_collapsed_by_lockout() {
    let bank = Arc::new(AccumulatorBank::new());
    let clock = ManualClock::new();
    let mut load = Load::builder()
        .with_duty_sink(Box::new(RecordingSink::new()))
        .with_display(Box::new(NullDisplay))
        .with_input_panel(Box::new(ScriptedPanel::new([InputEvent::FineUp; 5])))
        .with_accumulators(bank)
        .with_config(identity_cfg(1))
        .with_clock(Box::new(clock.clone()))
        .try_build()
        .unwrap();

    // Five repeats 10 ms apart: only the first lands inside the 150 ms lockout.
    for _ in 0..5 {
        load.service().unwrap();
        clock.advance(std::time::Duration::from_millis(10));
    }
    assert_eq!(load.setpoint_ma(), 1100);
}
