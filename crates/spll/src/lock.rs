//! Lock detector.
//!
//! Estimates the input amplitude from a running mean square and converts the
//! filtered phase-detector output into a phase error in radians
//! (`asin(2·e/A)`). Lock is declared once the averaged error has stayed below
//! the threshold for the hold time, and dropped as soon as it exceeds twice
//! the threshold or the amplitude falls below the minimum.

use crate::config::LockConfig;

/// Hysteresis factor between the lock and unlock thresholds.
const UNLOCK_FACTOR: f32 = 2.0;

/// One lock detector update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockEstimate {
    /// Estimated input amplitude.
    pub amplitude: f32,
    /// Instantaneous phase error estimate, radians.
    pub phase_error_rad: f32,
    /// Averaged phase error, radians.
    pub average_error_rad: f32,
    /// Lock flag after this update.
    pub locked: bool,
}

/// Phase error and lock tracking.
#[derive(Debug, Clone)]
pub struct LockDetector {
    alpha: f32,
    threshold_rad: f32,
    hold_samples: u32,
    min_amplitude: f32,
    mean_square: f32,
    average_error: f32,
    below_count: u32,
    locked: bool,
}

impl LockDetector {
    /// Detector for a validated configuration.
    #[must_use]
    pub fn new(config: &LockConfig, sample_period_s: f32) -> Self {
        let hold = libm::ceilf(config.hold_s / sample_period_s);
        // hold is non-negative and finite for a validated configuration.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let hold_samples = hold.clamp(0.0, u32::MAX as f32) as u32;
        Self {
            alpha: (sample_period_s / config.time_constant_s).min(1.0),
            threshold_rad: config.threshold_rad,
            hold_samples,
            min_amplitude: config.min_amplitude,
            mean_square: 0.0,
            average_error: 0.0,
            below_count: 0,
            locked: false,
        }
    }

    /// Feed the loop input and the filtered phase-detector output.
    pub fn update(&mut self, input: f32, detector_output: f32) -> LockEstimate {
        self.mean_square += self.alpha * (input * input - self.mean_square);
        let amplitude = libm::sqrtf(2.0 * self.mean_square.max(0.0));

        let phase_error_rad = if amplitude > self.min_amplitude {
            libm::asinf((2.0 * detector_output / amplitude).clamp(-1.0, 1.0))
        } else {
            0.0
        };
        self.average_error += self.alpha * (phase_error_rad - self.average_error);

        let magnitude = libm::fabsf(self.average_error);
        if amplitude < self.min_amplitude || !(magnitude <= self.threshold_rad * UNLOCK_FACTOR) {
            self.locked = false;
            self.below_count = 0;
        } else if magnitude < self.threshold_rad {
            self.below_count = self.below_count.saturating_add(1);
            if self.below_count >= self.hold_samples {
                self.locked = true;
            }
        } else if !self.locked {
            self.below_count = 0;
        }

        LockEstimate {
            amplitude,
            phase_error_rad,
            average_error_rad: self.average_error,
            locked: self.locked,
        }
    }

    /// Current lock flag.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Back to the power-on state: no amplitude, no lock.
    pub fn reset(&mut self) {
        self.mean_square = 0.0;
        self.average_error = 0.0;
        self.below_count = 0;
        self.locked = false;
    }
}
