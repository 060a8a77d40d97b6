//! Error types.
//!
//! Two families: [`ConfigError`] rejects a configuration before any state is
//! built, [`NumericFault`] reports a non-finite value caught during an update.
//! A fault never escapes as a panic; the faulted component has already been
//! reset to its initial state when the error is returned.

use core::fmt;

use thiserror_no_std::Error;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample period is zero, negative or not finite.
    #[error("sample period must be positive and finite (got {0} s)")]
    SamplePeriod(f32),
    /// Nominal grid frequency is zero, negative or not finite.
    #[error("nominal frequency must be positive and finite (got {0} Hz)")]
    NominalFrequency(f32),
    /// Notch center at or above the Nyquist frequency.
    #[error("notch center {center_hz} Hz is not below Nyquist ({nyquist_hz} Hz)")]
    NotchAboveNyquist {
        /// Requested center frequency in Hz.
        center_hz: f32,
        /// Half the sample rate.
        nyquist_hz: f32,
    },
    /// Notch damping negative, bandwidth not positive, or either not finite.
    #[error("notch damping must be >= 0 and bandwidth > 0")]
    NotchShape,
    /// A loop gain is negative or not finite.
    #[error("loop gains must be finite and non-negative")]
    LoopGains,
    /// Frequency limits do not bracket the nominal frequency, or exceed Nyquist.
    #[error("frequency limits must satisfy 0 < min <= nominal <= max < Nyquist")]
    FrequencyLimits,
    /// Lock detector threshold, time constant, hold time or amplitude invalid.
    #[error("lock detector settings out of range")]
    LockDetector,
}

/// Processing stage where a numeric fault was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Pre-filter notch.
    Notch,
    /// SPLL: phase detector notch, loop filter or phase accumulator.
    Pll,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Notch => "notch filter",
            Stage::Pll => "SPLL",
        })
    }
}

/// Non-finite value detected during an update.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NumericFault {
    /// The input sample was NaN or infinite.
    #[error("non-finite input reached the {0}")]
    NonFiniteInput(Stage),
    /// Internal state became NaN or infinite from a finite input.
    #[error("{0} state diverged")]
    Diverged(Stage),
}

impl NumericFault {
    /// Stage that raised the fault.
    #[must_use]
    pub fn stage(self) -> Stage {
        match self {
            NumericFault::NonFiniteInput(stage) | NumericFault::Diverged(stage) => stage,
        }
    }
}
