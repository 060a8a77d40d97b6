//! Second-order notch filter.
//!
//! Analog prototype
//!
//! ```text
//!         s² + 2·ζz·ω0·s + ω0²
//! H(s) = ──────────────────────      ζz = damping, ζp = bandwidth
//!         s² + 2·ζp·ω0·s + ω0²
//! ```
//!
//! discretized with a Tustin transform pre-warped at `ω0`, so the notch sits
//! exactly at the configured center regardless of the sample rate. The gain
//! is unity at DC and Nyquist and `ζz/ζp` at the center. Coefficients are
//! computed in `f64` and stored as `f32`; the section itself runs in
//! `biquad::DirectForm1`.

use biquad::{Biquad, Coefficients, DirectForm1};

use crate::config::{validate_notch, NotchConfig};
use crate::error::{ConfigError, NumericFault, Stage};

/// Normalized difference-equation coefficients (`a0 = 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotchCoefficients {
    /// Feed-forward, current input.
    pub b0: f32,
    /// Feed-forward, one sample back.
    pub b1: f32,
    /// Feed-forward, two samples back.
    pub b2: f32,
    /// Feedback, one sample back.
    pub a1: f32,
    /// Feedback, two samples back.
    pub a2: f32,
}

impl NotchCoefficients {
    /// Design a notch for the given sample period.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when the period is not positive, the shape parameters
    /// are out of range, or the center is not below Nyquist.
    pub fn design(sample_period_s: f32, notch: &NotchConfig) -> Result<Self, ConfigError> {
        validate_notch(notch, sample_period_s)?;

        let period = f64::from(sample_period_s);
        let w0 = f64::from(notch.center_rad_s);
        let zeta_z = f64::from(notch.damping);
        let zeta_p = f64::from(notch.bandwidth);

        // Pre-warp: the bilinear map sends analog ω0 to digital ω0 exactly.
        let k = w0 / libm::tan(w0 * period / 2.0);
        let k2 = k * k;
        let w02 = w0 * w0;
        let zero_term = 2.0 * zeta_z * w0 * k;
        let pole_term = 2.0 * zeta_p * w0 * k;
        let a0 = k2 + pole_term + w02;
        let middle = 2.0 * (w02 - k2) / a0;

        #[allow(clippy::cast_possible_truncation)]
        let coefficients = Self {
            b0: ((k2 + zero_term + w02) / a0) as f32,
            b1: middle as f32,
            b2: ((k2 - zero_term + w02) / a0) as f32,
            a1: middle as f32,
            a2: ((k2 - pole_term + w02) / a0) as f32,
        };
        Ok(coefficients)
    }

    /// Magnitude response at `frequency_hz`, evaluated analytically in `f64`.
    #[must_use]
    pub fn gain_at(&self, frequency_hz: f32, sample_period_s: f32) -> f32 {
        let ((num_re, num_im), (den_re, den_im)) = self.response_at(frequency_hz, sample_period_s);
        let num = libm::sqrt(num_re * num_re + num_im * num_im);
        let den = libm::sqrt(den_re * den_re + den_im * den_im);
        #[allow(clippy::cast_possible_truncation)]
        let gain = (num / den) as f32;
        gain
    }

    /// Phase response at `frequency_hz` in radians, `arg H(e^jωT)`.
    ///
    /// Negative below the center, where the section delays a sine.
    #[must_use]
    pub fn phase_at(&self, frequency_hz: f32, sample_period_s: f32) -> f32 {
        let ((num_re, num_im), (den_re, den_im)) = self.response_at(frequency_hz, sample_period_s);
        let phase = libm::atan2(num_im, num_re) - libm::atan2(den_im, den_re);
        #[allow(clippy::cast_possible_truncation)]
        let phase = crate::phase::wrap_radians(phase as f32);
        phase
    }

    /// Numerator and denominator of
    /// `H(e^jw) = (b0 + b1 e^-jw + b2 e^-2jw) / (1 + a1 e^-jw + a2 e^-2jw)`
    /// as `(re, im)` pairs.
    fn response_at(&self, frequency_hz: f32, sample_period_s: f32) -> ((f64, f64), (f64, f64)) {
        let w = core::f64::consts::TAU * f64::from(frequency_hz) * f64::from(sample_period_s);
        let (s1, c1) = (libm::sin(w), libm::cos(w));
        let (s2, c2) = (libm::sin(2.0 * w), libm::cos(2.0 * w));
        let [b0, b1, b2, a1, a2] =
            [self.b0, self.b1, self.b2, self.a1, self.a2].map(f64::from);
        (
            (b0 + b1 * c1 + b2 * c2, -(b1 * s1 + b2 * s2)),
            (1.0 + a1 * c1 + a2 * c2, -(a1 * s1 + a2 * s2)),
        )
    }
}

impl From<NotchCoefficients> for Coefficients<f32> {
    fn from(c: NotchCoefficients) -> Self {
        Coefficients {
            a1: c.a1,
            a2: c.a2,
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
        }
    }
}

/// Stateful notch section.
pub struct NotchFilter {
    coefficients: NotchCoefficients,
    section: DirectForm1<f32>,
}

impl NotchFilter {
    /// Filter with cleared history.
    #[must_use]
    pub fn new(coefficients: NotchCoefficients) -> Self {
        Self {
            coefficients,
            section: DirectForm1::<f32>::new(coefficients.into()),
        }
    }

    /// Design and build in one step.
    ///
    /// # Errors
    ///
    /// See [`NotchCoefficients::design`].
    pub fn design(sample_period_s: f32, notch: &NotchConfig) -> Result<Self, ConfigError> {
        NotchCoefficients::design(sample_period_s, notch).map(Self::new)
    }

    /// Filter one sample.
    ///
    /// # Errors
    ///
    /// [`NumericFault`] if the input or the output is not finite. The
    /// history has been cleared when this returns.
    pub fn update(&mut self, input: f32) -> Result<f32, NumericFault> {
        if !input.is_finite() {
            self.reset();
            return Err(NumericFault::NonFiniteInput(Stage::Notch));
        }
        let output = self.section.run(input);
        if !output.is_finite() {
            self.reset();
            return Err(NumericFault::Diverged(Stage::Notch));
        }
        Ok(output)
    }

    /// Clear the history.
    pub fn reset(&mut self) {
        self.section = DirectForm1::<f32>::new(self.coefficients.into());
    }

    /// Swap in new coefficients. History is cleared.
    pub fn retune(&mut self, coefficients: NotchCoefficients) {
        self.coefficients = coefficients;
        self.reset();
    }

    /// Swap in new coefficients and keep filtering from the current history.
    ///
    /// For small center moves while the section is running; a large jump
    /// should go through [`NotchFilter::retune`] instead.
    pub fn slide(&mut self, coefficients: NotchCoefficients) {
        self.coefficients = coefficients;
        self.section.update_coefficients(coefficients.into());
    }

    /// Active coefficients.
    #[must_use]
    pub fn coefficients(&self) -> NotchCoefficients {
        self.coefficients
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PERIOD: f32 = 2.0e-5;

    fn hundred_hz() -> NotchCoefficients {
        NotchCoefficients::design(PERIOD, &NotchConfig::second_harmonic(50.0)).unwrap()
    }

    #[test]
    fn unity_gain_at_dc() {
        let c = hundred_hz();
        let dc = (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2);
        assert!((dc - 1.0).abs() < 1e-2);
    }

    #[test]
    fn analytic_response_shape() {
        let c = hundred_hz();
        assert!(c.gain_at(100.0, PERIOD) < 1e-2);
        assert!((c.gain_at(50.0, PERIOD) - 0.991).abs() < 0.01);
        assert!((c.gain_at(1_000.0, PERIOD) - 1.0).abs() < 0.01);
    }

    #[test]
    fn phase_lags_below_center_and_leads_above() {
        let c = hundred_hz();
        let at_fifty = c.phase_at(50.0, PERIOD);
        // atan(ζp·2·(f/f0) / (1 - (f/f0)²)) with f/f0 = 0.5.
        assert!((at_fifty + 0.1326).abs() < 2e-3, "phase {at_fifty}");
        assert!(c.phase_at(45.0, PERIOD) > at_fifty);
        assert!(c.phase_at(55.0, PERIOD) < at_fifty);
        assert!(c.phase_at(150.0, PERIOD) > 0.0);
    }

    #[test]
    fn slide_keeps_history() {
        let mut slid = NotchFilter::new(hundred_hz());
        let mut restarted = NotchFilter::new(hundred_hz());
        for _ in 0..20_000 {
            slid.update(0.5).unwrap();
            restarted.update(0.5).unwrap();
        }
        let moved = NotchCoefficients::design(PERIOD, &NotchConfig::second_harmonic(50.5)).unwrap();
        slid.slide(moved);
        restarted.retune(moved);
        assert_eq!(slid.coefficients(), moved);
        // Settled on DC, a slid section carries on; a restarted one rings
        // while its history charges up again.
        let mut slid_worst = 0.0f32;
        let mut restarted_worst = 0.0f32;
        for _ in 0..200 {
            slid_worst = slid_worst.max((slid.update(0.5).unwrap() - 0.5).abs());
            restarted_worst = restarted_worst.max((restarted.update(0.5).unwrap() - 0.5).abs());
        }
        assert!(slid_worst < 1e-2, "slid {slid_worst}");
        assert!(restarted_worst > 0.05, "restarted {restarted_worst}");
    }

    #[test]
    fn constant_input_settles_to_itself() {
        let mut filter = NotchFilter::new(hundred_hz());
        let mut y = 0.0;
        for _ in 0..20_000 {
            y = filter.update(0.5).unwrap();
        }
        assert!((y - 0.5).abs() < 1e-2);
    }

    #[test]
    fn nan_input_resets_history() {
        let mut filter = NotchFilter::new(hundred_hz());
        let mut fresh = NotchFilter::new(hundred_hz());
        for _ in 0..100 {
            filter.update(0.7).unwrap();
        }
        assert_eq!(
            filter.update(f32::NAN),
            Err(NumericFault::NonFiniteInput(Stage::Notch))
        );
        for x in [0.1, -0.3, 0.9] {
            assert_eq!(filter.update(x).unwrap(), fresh.update(x).unwrap());
        }
    }

    #[test]
    fn infinite_input_is_rejected() {
        let mut filter = NotchFilter::new(hundred_hz());
        assert!(filter.update(f32::INFINITY).is_err());
        assert!(filter.update(f32::NEG_INFINITY).is_err());
    }

    #[test]
    fn design_rejects_center_above_nyquist() {
        let notch = NotchConfig::second_harmonic(50.0);
        assert!(matches!(
            NotchCoefficients::design(1.0 / 150.0, &notch),
            Err(ConfigError::NotchAboveNyquist { .. })
        ));
    }
}
