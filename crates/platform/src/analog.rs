//! Analog front-end abstraction
//!
//! The PLL core sees the converters only through two narrow, synchronous
//! traits: one normalized sample in per period, one normalized value out per
//! period. Both are called from the sampling interrupt, so implementations
//! must never block.
//!
//! ```text
//! timer trigger ──► SampleSource::acquire_sample() ──► pipeline
//!                                                        │
//!                   OutputSink::emit_output(value)  ◄────┘
//! ```

/// Source of normalized input samples (ADC side).
pub trait SampleSource {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read the sample converted for the current period.
    ///
    /// The value is normalized to `[-1.0, 1.0]` by the adapter. Called exactly
    /// once per trigger, including triggers whose sample is dropped.
    fn acquire_sample(&mut self) -> Result<f32, Self::Error>;
}

/// Sink for normalized output values (DAC or log side).
pub trait OutputSink {
    /// Error type
    type Error: core::fmt::Debug;

    /// Write one output value in `[-1.0, 1.0]`.
    fn emit_output(&mut self, value: f32) -> Result<(), Self::Error>;
}

/// Raw analog-to-digital converter returning unsigned result codes.
pub trait RawAdc {
    /// Error type
    type Error: core::fmt::Debug;

    /// Return the latest conversion result.
    fn read_code(&mut self) -> Result<u16, Self::Error>;
}

/// Raw digital-to-analog converter taking unsigned codes.
pub trait RawDac {
    /// Error type
    type Error: core::fmt::Debug;

    /// Latch a new output code.
    fn write_code(&mut self, code: u16) -> Result<(), Self::Error>;
}

impl<T: SampleSource + ?Sized> SampleSource for &mut T {
    type Error = T::Error;

    fn acquire_sample(&mut self) -> Result<f32, Self::Error> {
        (**self).acquire_sample()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    type Error = T::Error;

    fn emit_output(&mut self, value: f32) -> Result<(), Self::Error> {
        (**self).emit_output(value)
    }
}
