//! Adapters from raw converters to the normalized analog traits.
//!
//! A board support package implements [`RawAdc`]/[`RawDac`] over its result
//! and value registers; these wrappers apply the resolution-dependent scaling
//! so the PLL core only ever sees `[-1, 1]`.

use crate::analog::{OutputSink, RawAdc, RawDac, SampleSource};
use crate::analog_types::{AdcScaling, DacScaling};

/// [`SampleSource`] over a [`RawAdc`].
pub struct ScaledAdc<A> {
    adc: A,
    scaling: AdcScaling,
}

impl<A: RawAdc> ScaledAdc<A> {
    /// Wrap a raw converter.
    pub fn new(adc: A, scaling: AdcScaling) -> Self {
        Self { adc, scaling }
    }

    /// Borrow the wrapped converter.
    pub fn inner(&self) -> &A {
        &self.adc
    }

    /// Mutably borrow the wrapped converter.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Unwrap the converter.
    pub fn into_inner(self) -> A {
        self.adc
    }
}

impl<A: RawAdc> SampleSource for ScaledAdc<A> {
    type Error = A::Error;

    fn acquire_sample(&mut self) -> Result<f32, Self::Error> {
        let code = self.adc.read_code()?;
        Ok(self.scaling.to_normalized(code))
    }
}

/// [`OutputSink`] over a [`RawDac`].
pub struct ScaledDac<D> {
    dac: D,
    scaling: DacScaling,
}

impl<D: RawDac> ScaledDac<D> {
    /// Wrap a raw converter.
    pub fn new(dac: D, scaling: DacScaling) -> Self {
        Self { dac, scaling }
    }

    /// Borrow the wrapped converter.
    pub fn inner(&self) -> &D {
        &self.dac
    }

    /// Unwrap the converter.
    pub fn into_inner(self) -> D {
        self.dac
    }
}

impl<D: RawDac> OutputSink for ScaledDac<D> {
    type Error = D::Error;

    fn emit_output(&mut self, value: f32) -> Result<(), Self::Error> {
        self.dac.write_code(self.scaling.from_normalized(value))
    }
}
