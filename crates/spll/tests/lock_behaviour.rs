//! Closed-loop behaviour: lock, tracking, capture range, fault recovery.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use std::f64::consts::TAU;

use spll::{NumericFault, Pipeline, Spll, SpllConfig, Stage};

const PERIOD: f64 = 2.0e-5;
const ONE_SECOND: u32 = 50_000;

/// Input phase in radians of a sine whose frequency steps at `step_at`.
fn stepped_phase(n: u32, f1: f64, f2: f64, step_at: u32, offset: f64) -> f64 {
    let n = f64::from(n);
    let step_at = f64::from(step_at);
    if n < step_at {
        offset + TAU * f1 * n * PERIOD
    } else {
        offset + TAU * f1 * step_at * PERIOD + TAU * f2 * (n - step_at) * PERIOD
    }
}

fn wrap_pi(angle: f64) -> f64 {
    (angle + std::f64::consts::PI).rem_euclid(TAU) - std::f64::consts::PI
}

/// Phase error of the loop's prediction for sample `n + 1`.
fn prediction_error(pll: &Spll, true_next_phase: f64) -> f64 {
    wrap_pi(true_next_phase - TAU * f64::from(pll.state().phase)).abs()
}

#[test]
fn phase_error_converges_below_005_rad() {
    let mut pll = Spll::new(&SpllConfig::grid_50hz()).unwrap();
    let phase_at = |n: u32| 1.0 + TAU * 50.0 * f64::from(n) * PERIOD;

    let mut early = 0.0f64;
    let mut late = 0.0f64;
    for n in 0..3 * ONE_SECOND / 2 {
        pll.update(phase_at(n).sin() as f32).unwrap();
        let error = prediction_error(&pll, phase_at(n + 1));
        if n == ONE_SECOND / 10 {
            early = error;
        }
        if n >= ONE_SECOND {
            late = late.max(error);
        }
    }
    assert!(late < 0.05, "residual phase error {late} rad");
    assert!(late < early, "error did not shrink: {early} -> {late}");
    assert!(pll.is_locked());
    assert!((pll.state().frequency_hz - 50.0).abs() < 0.01);
}

#[test]
fn tracks_frequency_step() {
    let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
    let mut worst = 0.0f64;
    for n in 0..3 * ONE_SECOND {
        let x = stepped_phase(n, 50.0, 51.0, ONE_SECOND, 0.0).sin() as f32;
        let output = pipeline.process(x).unwrap();
        if n >= 2 * ONE_SECOND {
            worst = worst.max((f64::from(output.frequency_hz) - 51.0).abs());
        }
    }
    assert!(worst < 0.05, "frequency off by up to {worst} Hz");
    assert!(pipeline.output().locked);
    assert_eq!(pipeline.stats().lock_losses, 0);
}

#[test]
fn off_nominal_estimate_is_ripple_free() {
    for input_hz in [45.0, 48.0, 52.0, 55.0] {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for n in 0..3 * ONE_SECOND {
            let x = stepped_phase(n, input_hz, input_hz, 0, 0.0).sin() as f32;
            let output = pipeline.process(x).unwrap();
            if n >= 2 * ONE_SECOND {
                lowest = lowest.min(f64::from(output.frequency_hz));
                highest = highest.max(f64::from(output.frequency_hz));
            }
        }
        assert!(
            (lowest - input_hz).abs() < 0.05 && (highest - input_hz).abs() < 0.05,
            "{input_hz} Hz input: estimate spans [{lowest}, {highest}]"
        );
        assert!(pipeline.output().locked, "{input_hz} Hz input not locked");
    }
}

#[test]
fn pipeline_output_aligns_with_raw_input() {
    for input_hz in [45.0, 50.0, 55.0] {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        let mut worst = 0.0f64;
        for n in 0..3 * ONE_SECOND {
            let x = stepped_phase(n, input_hz, input_hz, 0, 0.0).sin() as f32;
            let output = pipeline.process(x).unwrap();
            if n >= 2 * ONE_SECOND {
                let next = stepped_phase(n + 1, input_hz, input_hz, 0, 0.0);
                worst = worst.max(wrap_pi(next - TAU * f64::from(output.phase)).abs());
            }
        }
        assert!(worst < 0.02, "{input_hz} Hz input: phase off by up to {worst} rad");
        assert!(pipeline.output().locked);
    }
}

#[test]
fn locks_on_60_hz_grid() {
    let mut pipeline = Pipeline::new(SpllConfig::grid_60hz()).unwrap();
    for n in 0..2 * ONE_SECOND {
        let x = stepped_phase(n, 60.0, 60.0, 0, 0.3).sin() as f32;
        pipeline.process(x).unwrap();
    }
    let output = pipeline.output();
    assert!(output.locked);
    assert!((output.frequency_hz - 60.0).abs() < 0.5);
}

#[test]
fn rejects_second_harmonic_distortion() {
    let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
    for n in 0..2 * ONE_SECOND {
        let theta = stepped_phase(n, 50.0, 50.0, 0, 0.0);
        let x = (0.8 * theta.sin() + 0.15 * (2.0 * theta).sin()) as f32;
        pipeline.process(x).unwrap();
    }
    let output = pipeline.output();
    assert!(output.locked);
    assert!((output.frequency_hz - 50.0).abs() < 0.5);
}

#[test]
fn out_of_range_input_never_locks() {
    let config = SpllConfig::grid_50hz();
    let mut pipeline = Pipeline::new(config).unwrap();
    for n in 0..3 * ONE_SECOND {
        let x = stepped_phase(n, 80.0, 80.0, 0, 0.0).sin() as f32;
        let output = pipeline.process(x).unwrap();
        assert!(!output.locked);
        assert!(output.frequency_hz >= config.frequency_limits.min_hz);
        assert!(output.frequency_hz <= config.frequency_limits.max_hz);
    }
}

#[test]
fn silence_never_locks() {
    let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
    for _ in 0..ONE_SECOND {
        assert!(!pipeline.process(0.0).unwrap().locked);
    }
}

#[test]
fn nan_reset_behaves_like_fresh_pll() {
    let config = SpllConfig::grid_50hz();
    let mut faulted = Spll::new(&config).unwrap();
    for n in 0..ONE_SECOND / 2 {
        faulted.update(stepped_phase(n, 50.0, 50.0, 0, 0.7).sin() as f32).unwrap();
    }
    assert_eq!(
        faulted.update(f32::NAN),
        Err(NumericFault::NonFiniteInput(Stage::Pll))
    );

    let mut fresh = Spll::new(&config).unwrap();
    assert_eq!(faulted.state(), fresh.state());
    for n in 0..ONE_SECOND {
        let x = stepped_phase(n, 50.0, 50.0, 0, 2.0).sin() as f32;
        assert_eq!(faulted.update(x).unwrap(), fresh.update(x).unwrap());
    }
    assert!(faulted.is_locked());
}

#[test]
fn pipeline_relocks_after_nan() {
    let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
    let fault_at = ONE_SECOND;
    let mut fault_seen = false;
    for n in 0..3 * ONE_SECOND {
        let x = if n == fault_at {
            f32::NAN
        } else {
            stepped_phase(n, 50.0, 50.0, 0, 0.0).sin() as f32
        };
        match pipeline.process(x) {
            Ok(_) => {}
            Err(fault) => {
                assert_eq!(n, fault_at);
                assert_eq!(fault.stage(), Stage::Notch);
                fault_seen = true;
            }
        }
    }
    assert!(fault_seen);
    let output = pipeline.output();
    assert!(output.locked);
    assert!((output.frequency_hz - 50.0).abs() < 0.5);
    assert_eq!(pipeline.stats().notch_faults, 1);
}
