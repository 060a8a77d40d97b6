//! Single-phase software PLL.
//!
//! Per sample:
//!
//! 1. phase detector `pd = x · cos(φ)`, its 2ω ripple removed by a notch at
//!    twice the integrator's frequency `f_nom + ∫ki·e`,
//! 2. PI loop filter `f = f_nom + kp·e + ∫ki·e`, integrator and output both
//!    clamped to the frequency limits,
//! 3. phase accumulator `φ = wrap(φ + f·T)` in cycles,
//! 4. reference `sin(2πφ)`, `cos(2πφ)`.
//!
//! After the update with sample `n`, `phase` predicts the input phase at
//! sample `n + 1`; the reference written out in the same period is therefore
//! aligned with the next sample the converter takes.
//!
//! The detector notch starts at `2·f_nom` and slides after the integrator
//! whenever it has moved by [`DETECTOR_RETUNE_STEP_HZ`]. Sliding keeps the
//! section's history, so the loop sees no transient from the move.

use crate::config::{FrequencyLimits, LoopFilterConfig, NotchConfig, SpllConfig};
use crate::error::{ConfigError, NumericFault, Stage};
use crate::lock::LockDetector;
use crate::notch::{NotchCoefficients, NotchFilter};
use crate::phase;

/// How far the integrator frequency may drift from the detector notch's
/// center, in Hz, before the notch is redesigned.
pub const DETECTOR_RETUNE_STEP_HZ: f32 = 0.01;

/// SPLL state after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllState {
    /// Phase in cycles, `[0, 1)`.
    pub phase: f32,
    /// Frequency estimate in Hz, within the configured limits.
    pub frequency_hz: f32,
    /// Integrator, the frequency offset from nominal in Hz.
    pub integrator_hz: f32,
    /// `sin(2π·phase)`.
    pub sin: f32,
    /// `cos(2π·phase)`.
    pub cos: f32,
    /// Last input sample.
    pub ac_input: f32,
    /// Last phase error estimate in radians.
    pub phase_error_rad: f32,
    /// Input amplitude estimate.
    pub amplitude: f32,
}

impl PllState {
    fn initial(nominal_hz: f32) -> Self {
        Self {
            phase: 0.0,
            frequency_hz: nominal_hz,
            integrator_hz: 0.0,
            sin: 0.0,
            cos: 1.0,
            ac_input: 0.0,
            phase_error_rad: 0.0,
            amplitude: 0.0,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.phase,
            self.frequency_hz,
            self.integrator_hz,
            self.sin,
            self.cos,
            self.phase_error_rad,
            self.amplitude,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// What a caller gets back from one update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockedOutput {
    /// Locked sine reference.
    pub sin: f32,
    /// Locked cosine reference.
    pub cos: f32,
    /// Phase in cycles.
    pub phase: f32,
    /// Frequency estimate in Hz.
    pub frequency_hz: f32,
    /// Phase error estimate in radians.
    pub phase_error_rad: f32,
    /// Lock detector verdict.
    pub locked: bool,
}

/// Software PLL.
pub struct Spll {
    nominal_hz: f32,
    sample_period_s: f32,
    gains: LoopFilterConfig,
    limits: FrequencyLimits,
    notch_shape: NotchConfig,
    nominal_detector: NotchCoefficients,
    detector_notch: NotchFilter,
    detector_center_hz: f32,
    lock: LockDetector,
    state: PllState,
}

impl Spll {
    /// Build from a configuration.
    ///
    /// The phase-detector notch starts at twice the nominal frequency with
    /// the shape of the configured pre-filter.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] from [`SpllConfig::validate`].
    pub fn new(config: &SpllConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let nominal_detector = NotchCoefficients::design(
            config.sample_period_s,
            &detector_notch_config(&config.notch, config.nominal_frequency_hz),
        )?;
        Ok(Self {
            nominal_hz: config.nominal_frequency_hz,
            sample_period_s: config.sample_period_s,
            gains: config.loop_filter,
            limits: config.frequency_limits,
            notch_shape: config.notch,
            nominal_detector,
            detector_notch: NotchFilter::new(nominal_detector),
            detector_center_hz: config.nominal_frequency_hz,
            lock: LockDetector::new(&config.lock, config.sample_period_s),
            state: PllState::initial(config.nominal_frequency_hz),
        })
    }

    /// Run one sample through the loop.
    ///
    /// # Errors
    ///
    /// [`NumericFault`] for a non-finite input or a non-finite result. The
    /// PLL is back in its initial state when this returns.
    pub fn update(&mut self, input: f32) -> Result<LockedOutput, NumericFault> {
        if !input.is_finite() {
            self.reset();
            return Err(NumericFault::NonFiniteInput(Stage::Pll));
        }

        let Ok(error) = self.detector_notch.update(input * self.state.cos) else {
            self.reset();
            return Err(NumericFault::Diverged(Stage::Pll));
        };

        let period = self.sample_period_s;
        let integrator_hz = (self.state.integrator_hz + self.gains.ki * period * error).clamp(
            self.limits.min_hz - self.nominal_hz,
            self.limits.max_hz - self.nominal_hz,
        );
        let frequency_hz = (self.nominal_hz + self.gains.kp * error + integrator_hz)
            .clamp(self.limits.min_hz, self.limits.max_hz);
        let phase = phase::wrap(self.state.phase + frequency_hz * period);
        let (sin, cos) = phase::sin_cos(phase);
        let estimate = self.lock.update(input, error);

        let next = PllState {
            phase,
            frequency_hz,
            integrator_hz,
            sin,
            cos,
            ac_input: input,
            phase_error_rad: estimate.phase_error_rad,
            amplitude: estimate.amplitude,
        };
        if !next.is_finite() {
            self.reset();
            return Err(NumericFault::Diverged(Stage::Pll));
        }
        self.state = next;
        self.follow_integrator(integrator_hz);
        Ok(self.output())
    }

    /// Slide the detector notch to twice the integrator frequency once it
    /// has drifted far enough.
    fn follow_integrator(&mut self, integrator_hz: f32) {
        let center_hz = self.nominal_hz + integrator_hz;
        if (center_hz - self.detector_center_hz).abs() < DETECTOR_RETUNE_STEP_HZ {
            return;
        }
        let notch = detector_notch_config(&self.notch_shape, center_hz);
        // 2·max_hz is validated below Nyquist, so this only fails on a
        // corrupted state; the old center then stays.
        if let Ok(coefficients) = NotchCoefficients::design(self.sample_period_s, &notch) {
            self.detector_notch.slide(coefficients);
            self.detector_center_hz = center_hz;
        }
    }

    /// Zero phase, zero integrator, nominal frequency, cleared history, no lock.
    pub fn reset(&mut self) {
        self.state = PllState::initial(self.nominal_hz);
        self.detector_notch.retune(self.nominal_detector);
        self.detector_center_hz = self.nominal_hz;
        self.lock.reset();
    }

    /// Apply a new configuration without losing track.
    ///
    /// Phase is kept; integrator and frequency are clamped into the new
    /// limits; the detector notch restarts at twice the clamped frequency;
    /// notch history and lock state restart.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the configuration is invalid. Nothing changes then.
    pub fn retune(&mut self, config: &SpllConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let nominal_hz = config.nominal_frequency_hz;
        let limits = config.frequency_limits;
        let integrator_hz = self
            .state
            .integrator_hz
            .clamp(limits.min_hz - nominal_hz, limits.max_hz - nominal_hz);
        let center_hz = (nominal_hz + integrator_hz).clamp(limits.min_hz, limits.max_hz);
        let nominal_detector = NotchCoefficients::design(
            config.sample_period_s,
            &detector_notch_config(&config.notch, nominal_hz),
        )?;
        let detector = NotchCoefficients::design(
            config.sample_period_s,
            &detector_notch_config(&config.notch, center_hz),
        )?;

        self.nominal_hz = nominal_hz;
        self.sample_period_s = config.sample_period_s;
        self.gains = config.loop_filter;
        self.limits = limits;
        self.notch_shape = config.notch;
        self.nominal_detector = nominal_detector;
        self.detector_notch = NotchFilter::new(detector);
        self.detector_center_hz = center_hz;
        self.lock = LockDetector::new(&config.lock, config.sample_period_s);
        self.state.integrator_hz = integrator_hz;
        self.state.frequency_hz = center_hz;
        debug!(
            "SPLL loop: kp {}, ki {}, limits {}..{} Hz, detector notch {} Hz",
            self.gains.kp,
            self.gains.ki,
            limits.min_hz,
            limits.max_hz,
            2.0 * center_hz
        );
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &PllState {
        &self.state
    }

    /// Output view of the current state.
    #[must_use]
    pub fn output(&self) -> LockedOutput {
        LockedOutput {
            sin: self.state.sin,
            cos: self.state.cos,
            phase: self.state.phase,
            frequency_hz: self.state.frequency_hz,
            phase_error_rad: self.state.phase_error_rad,
            locked: self.lock.is_locked(),
        }
    }

    /// Lock detector verdict.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Nominal frequency in Hz.
    #[must_use]
    pub fn nominal_hz(&self) -> f32 {
        self.nominal_hz
    }

    /// Where the phase-detector notch currently rejects, in Hz.
    #[must_use]
    pub fn detector_notch_hz(&self) -> f32 {
        2.0 * self.detector_center_hz
    }
}

fn detector_notch_config(shape: &NotchConfig, frequency_hz: f32) -> NotchConfig {
    NotchConfig {
        center_rad_s: core::f32::consts::TAU * 2.0 * frequency_hz,
        ..*shape
    }
}
