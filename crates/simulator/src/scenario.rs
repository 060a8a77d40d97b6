//! Synthetic bench signal.
//!
//! Reproduces the loopback wiring of the bench: a reference sine is written
//! to a DAC whose output is wired to the ADC input. The DAC code is handed
//! straight to the ADC, so the PLL sees the signal with converter
//! quantization applied.

use platform::{DacScaling, RawAdc, SampleSource};
use spll::SineGenerator;

/// What to feed the PLL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    /// Input frequency before any step, Hz.
    pub frequency_hz: f32,
    /// Peak amplitude, normalized.
    pub amplitude: f32,
    /// Initial phase, radians.
    pub phase_rad: f32,
    /// Second-harmonic amplitude relative to the fundamental.
    pub harmonic: f32,
    /// `(sample index, new frequency)` of an optional frequency step.
    pub step: Option<(u32, f32)>,
}

/// [`RawAdc`] reading a DAC driven by a [`SineGenerator`].
pub struct LoopbackAdc {
    scenario: Scenario,
    fundamental: SineGenerator,
    harmonic: SineGenerator,
    dac: DacScaling,
    index: u32,
}

impl LoopbackAdc {
    pub fn new(scenario: Scenario, sample_period_s: f32, dac: DacScaling) -> Self {
        let fundamental = SineGenerator::new(scenario.frequency_hz, sample_period_s)
            .with_amplitude(scenario.amplitude)
            .with_phase_offset(scenario.phase_rad);
        let harmonic = SineGenerator::new(2.0 * scenario.frequency_hz, sample_period_s)
            .with_amplitude(scenario.amplitude * scenario.harmonic)
            .with_phase_offset(2.0 * scenario.phase_rad);
        Self {
            scenario,
            fundamental,
            harmonic,
            dac,
            index: 0,
        }
    }

    /// Frequency of the fundamental currently generated.
    pub fn frequency_hz(&self) -> f32 {
        self.fundamental.frequency_hz()
    }

    /// Next analog value before quantization.
    fn next_value(&mut self) -> f32 {
        if let Some((at, frequency_hz)) = self.scenario.step {
            if self.index == at {
                self.fundamental.set_frequency(frequency_hz);
                self.harmonic.set_frequency(2.0 * frequency_hz);
            }
        }
        self.index = self.index.saturating_add(1);
        self.fundamental.next_sample() + self.harmonic.next_sample()
    }
}

impl RawAdc for LoopbackAdc {
    type Error = core::convert::Infallible;

    fn read_code(&mut self) -> Result<u16, Self::Error> {
        let value = self.next_value();
        Ok(self.dac.from_normalized(value))
    }
}

/// Replaces one sample by NaN, as a corrupted conversion would.
pub struct FaultInjector<S> {
    inner: S,
    nan_at: Option<u32>,
    index: u32,
}

impl<S> FaultInjector<S> {
    pub fn new(inner: S, nan_at: Option<u32>) -> Self {
        Self {
            inner,
            nan_at,
            index: 0,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SampleSource> SampleSource for FaultInjector<S> {
    type Error = S::Error;

    fn acquire_sample(&mut self) -> Result<f32, Self::Error> {
        let sample = self.inner.acquire_sample()?;
        let index = self.index;
        self.index = self.index.saturating_add(1);
        if self.nan_at == Some(index) {
            return Ok(f32::NAN);
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::{AdcScaling, ScaledAdc};

    fn scenario() -> Scenario {
        Scenario {
            frequency_hz: 50.0,
            amplitude: 0.5,
            phase_rad: core::f32::consts::FRAC_PI_2,
            harmonic: 0.0,
            step: Some((3, 60.0)),
        }
    }

    #[test]
    fn loopback_quantizes_through_converters() {
        let adc = LoopbackAdc::new(scenario(), 2.0e-5, DacScaling::default());
        let mut source = ScaledAdc::new(adc, AdcScaling::default());
        let first = source.acquire_sample().unwrap();
        // 0.5 → DAC 3071 → ADC (3071 - 2048) / 2048.
        assert!((first - 1023.0 / 2048.0).abs() < 1e-6);
    }

    #[test]
    fn step_applies_at_index() {
        let mut adc = LoopbackAdc::new(scenario(), 2.0e-5, DacScaling::default());
        for _ in 0..3 {
            adc.read_code().unwrap();
        }
        assert_eq!(adc.frequency_hz(), 50.0);
        adc.read_code().unwrap();
        assert_eq!(adc.frequency_hz(), 60.0);
    }

    #[test]
    fn injector_replaces_one_sample() {
        let adc = LoopbackAdc::new(scenario(), 2.0e-5, DacScaling::default());
        let mut source = FaultInjector::new(ScaledAdc::new(adc, AdcScaling::default()), Some(1));
        assert!(source.acquire_sample().unwrap().is_finite());
        assert!(source.acquire_sample().unwrap().is_nan());
        assert!(source.acquire_sample().unwrap().is_finite());
    }
}
