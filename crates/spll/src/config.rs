//! SPLL configuration.
//!
//! All tunables live in [`SpllConfig`]; nothing is hard-coded in the update
//! path. The presets reproduce the bench setup (50 kHz trigger, 12-bit
//! converters) for 50 Hz and 60 Hz grids. Every constructor that consumes a
//! configuration calls [`SpllConfig::validate`] first.

use core::f32::consts::TAU;

use crate::error::ConfigError;

/// Bench trigger rate in Hz.
#[allow(clippy::cast_precision_loss)]
pub const DEFAULT_SAMPLE_RATE_HZ: f32 = platform::config::REFERENCE_SAMPLE_RATE_HZ as f32;

/// Notch damping (zero damping ratio) used by the presets.
pub const DEFAULT_NOTCH_DAMPING: f32 = 1.0e-5;

/// Notch bandwidth (pole damping ratio) used by the presets.
pub const DEFAULT_NOTCH_BANDWIDTH: f32 = 0.1;

/// Loop natural frequency used by the presets, in Hz.
pub const DEFAULT_LOOP_NATURAL_HZ: f32 = 5.0;

/// Loop damping ratio used by the presets.
pub const DEFAULT_LOOP_DAMPING: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// Tracking range used by the presets, as a fraction of nominal.
pub const DEFAULT_FREQUENCY_SPAN: f32 = 0.2;

/// Second-order notch parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotchConfig {
    /// Center (rejected) frequency in rad/s.
    pub center_rad_s: f32,
    /// Zero damping ratio. Smaller means a deeper notch.
    pub damping: f32,
    /// Pole damping ratio. Larger means a wider notch.
    pub bandwidth: f32,
}

impl NotchConfig {
    /// Notch at twice `nominal_hz` with the default shape.
    #[must_use]
    pub fn second_harmonic(nominal_hz: f32) -> Self {
        Self {
            center_rad_s: TAU * 2.0 * nominal_hz,
            damping: DEFAULT_NOTCH_DAMPING,
            bandwidth: DEFAULT_NOTCH_BANDWIDTH,
        }
    }

    /// Center frequency in Hz.
    #[must_use]
    pub fn center_hz(&self) -> f32 {
        self.center_rad_s / TAU
    }
}

/// PI loop filter gains.
///
/// The integrator gain is continuous-time; the update multiplies it by the
/// sample period.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopFilterConfig {
    /// Proportional gain, Hz per unit of phase-detector output.
    pub kp: f32,
    /// Integral gain, Hz/s per unit of phase-detector output.
    pub ki: f32,
}

impl LoopFilterConfig {
    /// Gains placing the linearized loop at `natural_hz` with `damping`.
    ///
    /// The phase detector has slope `A/2` per radian and the accumulator
    /// integrates Hz into cycles, so for a unit-amplitude input
    /// `kp = 2·ζ·ωn/π` and `ki = ωn²/π`.
    #[must_use]
    pub fn from_natural_frequency(natural_hz: f32, damping: f32) -> Self {
        let wn = TAU * natural_hz;
        Self {
            kp: 2.0 * damping * wn / core::f32::consts::PI,
            ki: wn * wn / core::f32::consts::PI,
        }
    }
}

/// Frequency estimate bounds in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrequencyLimits {
    /// Lowest frequency the estimate may report.
    pub min_hz: f32,
    /// Highest frequency the estimate may report.
    pub max_hz: f32,
}

impl FrequencyLimits {
    /// `nominal_hz ± span·nominal_hz`.
    ///
    /// The offset is formed once and added to nominal, so round presets
    /// land on round bounds (`1.0 + 0.2` is not exact in `f32`).
    #[must_use]
    pub fn around(nominal_hz: f32, span: f32) -> Self {
        let offset = nominal_hz * span;
        Self {
            min_hz: nominal_hz - offset,
            max_hz: nominal_hz + offset,
        }
    }
}

/// Lock detector tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LockConfig {
    /// Averaged phase error below which the loop counts as locked, radians.
    pub threshold_rad: f32,
    /// Time constant of the error and amplitude averages, seconds.
    pub time_constant_s: f32,
    /// How long the error must stay below threshold before lock, seconds.
    pub hold_s: f32,
    /// Input amplitude below which lock is never reported.
    pub min_amplitude: f32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            threshold_rad: 0.1,
            time_constant_s: 0.02,
            hold_s: 0.05,
            min_amplitude: 0.1,
        }
    }
}

/// Complete SPLL configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpllConfig {
    /// Expected grid frequency in Hz. The loop starts here.
    pub nominal_frequency_hz: f32,
    /// Seconds between samples.
    pub sample_period_s: f32,
    /// Notch used both as pre-filter and on the phase-detector output.
    pub notch: NotchConfig,
    /// PI gains.
    pub loop_filter: LoopFilterConfig,
    /// Bounds of the frequency estimate. Twice the upper bound must stay
    /// below Nyquist, since the phase-detector notch follows `2·f`.
    pub frequency_limits: FrequencyLimits,
    /// Lock detector.
    #[cfg_attr(feature = "serde", serde(default))]
    pub lock: LockConfig,
}

impl SpllConfig {
    /// Preset for a grid of `nominal_hz` sampled at `sample_rate_hz`.
    #[must_use]
    pub fn for_grid(nominal_hz: f32, sample_rate_hz: f32) -> Self {
        Self {
            nominal_frequency_hz: nominal_hz,
            sample_period_s: 1.0 / sample_rate_hz,
            notch: NotchConfig::second_harmonic(nominal_hz),
            loop_filter: LoopFilterConfig::from_natural_frequency(
                DEFAULT_LOOP_NATURAL_HZ,
                DEFAULT_LOOP_DAMPING,
            ),
            frequency_limits: FrequencyLimits::around(nominal_hz, DEFAULT_FREQUENCY_SPAN),
            lock: LockConfig::default(),
        }
    }

    /// 50 Hz grid, 50 kHz sampling.
    #[must_use]
    pub fn grid_50hz() -> Self {
        Self::for_grid(50.0, DEFAULT_SAMPLE_RATE_HZ)
    }

    /// 60 Hz grid, 50 kHz sampling.
    #[must_use]
    pub fn grid_60hz() -> Self {
        Self::for_grid(60.0, DEFAULT_SAMPLE_RATE_HZ)
    }

    /// Half the sample rate, in Hz.
    #[must_use]
    pub fn nyquist_hz(&self) -> f32 {
        0.5 / self.sample_period_s
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, checking the sample period
    /// first since every other bound depends on it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let period = self.sample_period_s;
        if !(period.is_finite() && period > 0.0) {
            return Err(ConfigError::SamplePeriod(period));
        }
        let nominal = self.nominal_frequency_hz;
        if !(nominal.is_finite() && nominal > 0.0) {
            return Err(ConfigError::NominalFrequency(nominal));
        }
        validate_notch(&self.notch, period)?;

        let gains = self.loop_filter;
        if !(gains.kp.is_finite() && gains.ki.is_finite() && gains.kp >= 0.0 && gains.ki >= 0.0) {
            return Err(ConfigError::LoopGains);
        }

        let limits = self.frequency_limits;
        let ordered = limits.min_hz > 0.0
            && limits.min_hz <= nominal
            && nominal <= limits.max_hz
            && 2.0 * limits.max_hz < self.nyquist_hz();
        // NaN fails every comparison above.
        if !ordered || !limits.max_hz.is_finite() {
            return Err(ConfigError::FrequencyLimits);
        }

        let lock = self.lock;
        let lock_ok = lock.threshold_rad.is_finite()
            && lock.threshold_rad > 0.0
            && lock.time_constant_s.is_finite()
            && lock.time_constant_s >= period
            && lock.hold_s.is_finite()
            && lock.hold_s >= 0.0
            && lock.min_amplitude.is_finite()
            && lock.min_amplitude >= 0.0;
        if !lock_ok {
            return Err(ConfigError::LockDetector);
        }
        Ok(())
    }
}

impl Default for SpllConfig {
    fn default() -> Self {
        Self::grid_50hz()
    }
}

/// Check a notch against a sample period.
pub(crate) fn validate_notch(notch: &NotchConfig, sample_period_s: f32) -> Result<(), ConfigError> {
    if !(sample_period_s.is_finite() && sample_period_s > 0.0) {
        return Err(ConfigError::SamplePeriod(sample_period_s));
    }
    let shape_ok = notch.damping.is_finite()
        && notch.damping >= 0.0
        && notch.bandwidth.is_finite()
        && notch.bandwidth > 0.0;
    if !shape_ok {
        return Err(ConfigError::NotchShape);
    }
    let center_hz = notch.center_hz();
    let nyquist_hz = 0.5 / sample_period_s;
    if !(center_hz.is_finite() && center_hz > 0.0 && center_hz < nyquist_hz) {
        return Err(ConfigError::NotchAboveNyquist {
            center_hz,
            nyquist_hz,
        });
    }
    Ok(())
}
