//! Reference sine generator.
//!
//! Phase-accumulator oscillator used as a loopback stimulus: one sample per
//! call, phase wrapped once per cycle. Changing the frequency keeps the phase
//! continuous, so a frequency step has no phase jump.

use crate::phase;

/// Phase-accumulator sine oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineGenerator {
    frequency_hz: f32,
    amplitude: f32,
    sample_period_s: f32,
    phase: f32,
}

impl SineGenerator {
    /// Unit-amplitude generator starting at zero phase.
    #[must_use]
    pub fn new(frequency_hz: f32, sample_period_s: f32) -> Self {
        Self {
            frequency_hz,
            amplitude: 1.0,
            sample_period_s,
            phase: 0.0,
        }
    }

    /// Set the peak amplitude.
    #[must_use]
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Start at `offset_rad` instead of zero.
    #[must_use]
    pub fn with_phase_offset(mut self, offset_rad: f32) -> Self {
        self.phase = phase::wrap(offset_rad / core::f32::consts::TAU);
        self
    }

    /// Produce the current sample and advance one period.
    pub fn next_sample(&mut self) -> f32 {
        let (sin, _) = phase::sin_cos(self.phase);
        self.phase = phase::wrap(self.phase + self.frequency_hz * self.sample_period_s);
        self.amplitude * sin
    }

    /// Change frequency from the next sample on.
    pub fn set_frequency(&mut self, frequency_hz: f32) {
        self.frequency_hz = frequency_hz;
    }

    /// Current frequency in Hz.
    #[must_use]
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Phase of the next sample, in cycles.
    #[must_use]
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Iterator for SineGenerator {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        Some(self.next_sample())
    }
}
