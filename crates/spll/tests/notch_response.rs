//! Steady-state response of the notch pre-filter, measured by filtering
//! sines rather than from the coefficients.

#![allow(clippy::unwrap_used)]

use spll::{NotchConfig, NotchFilter, SpllConfig};

const PERIOD: f32 = 2.0e-5;

/// Peak output over 0.2 s after a 1 s settle.
fn steady_state_peak(filter: &mut NotchFilter, frequency_hz: f64) -> f32 {
    let settle = 50_000u32;
    let window = 10_000u32;
    let mut peak = 0.0f32;
    for n in 0..settle + window {
        let t = f64::from(n) * f64::from(PERIOD);
        #[allow(clippy::cast_possible_truncation)]
        let x = (core::f64::consts::TAU * frequency_hz * t).sin() as f32;
        let y = filter.update(x).unwrap();
        if n >= settle {
            peak = peak.max(y.abs());
        }
    }
    peak
}

fn filter_for(nominal_hz: f32) -> NotchFilter {
    NotchFilter::design(PERIOD, &NotchConfig::second_harmonic(nominal_hz)).unwrap()
}

#[test]
fn rejects_second_harmonic_by_20_db() {
    let mut notch = filter_for(50.0);
    let rejected = steady_state_peak(&mut notch, 100.0);
    let mut notch = filter_for(50.0);
    let passed = steady_state_peak(&mut notch, 1_000.0);
    let depth_db = 20.0 * (passed / rejected).log10();
    assert!(depth_db >= 20.0, "notch depth only {depth_db} dB");
}

#[test]
fn rejects_120_hz_on_60_hz_grid() {
    let config = SpllConfig::grid_60hz();
    let mut notch = NotchFilter::design(config.sample_period_s, &config.notch).unwrap();
    assert!(steady_state_peak(&mut notch, 120.0) < 0.1);
}

#[test]
fn passes_frequencies_away_from_notch() {
    for frequency in [10.0, 50.0, 500.0, 1_000.0] {
        let mut notch = filter_for(50.0);
        let gain = steady_state_peak(&mut notch, frequency);
        assert!((gain - 1.0).abs() < 0.05, "gain {gain} at {frequency} Hz");
    }
}

#[test]
fn retune_moves_the_notch() {
    let mut notch = filter_for(50.0);
    notch.retune(filter_for(60.0).coefficients());
    assert!(steady_state_peak(&mut notch, 120.0) < 0.1);
    let mut notch = filter_for(50.0);
    notch.retune(filter_for(60.0).coefficients());
    assert!((steady_state_peak(&mut notch, 100.0) - 1.0).abs() > 0.05);
}
