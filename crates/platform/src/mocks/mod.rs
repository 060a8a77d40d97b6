//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests and in the desktop simulator.

#![cfg(any(test, feature = "std"))]

use crate::analog::{OutputSink, RawAdc, RawDac, SampleSource};

/// Error raised by the mocks when a failure is injected or data runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// The scripted sample queue is empty.
    Exhausted,
    /// A failure was requested through `fail_next`.
    Injected,
}

/// Sample source computing each sample from its index.
///
/// `signal(n)` is called for the n-th acquired sample, counting from zero.
/// Dropped samples still advance the index, as a real converter keeps
/// converting.
pub struct SignalSource<F> {
    signal: F,
    reads: u32,
    fail_next: bool,
}

impl<F: FnMut(u32) -> f32> SignalSource<F> {
    /// Create a source from a signal function.
    pub fn new(signal: F) -> Self {
        Self {
            signal,
            reads: 0,
            fail_next: false,
        }
    }

    /// Number of samples acquired so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Make the next acquisition fail without consuming a sample.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl<F: FnMut(u32) -> f32> SampleSource for SignalSource<F> {
    type Error = MockError;

    fn acquire_sample(&mut self) -> Result<f32, Self::Error> {
        if core::mem::take(&mut self.fail_next) {
            return Err(MockError::Injected);
        }
        let value = (self.signal)(self.reads);
        self.reads = self.reads.saturating_add(1);
        Ok(value)
    }
}

/// Output sink remembering the most recent `N` values.
pub struct RecordingSink<const N: usize> {
    history: heapless::Deque<f32, N>,
    count: u32,
    fail_next: bool,
}

impl<const N: usize> RecordingSink<N> {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            history: heapless::Deque::new(),
            count: 0,
            fail_next: false,
        }
    }

    /// Total number of values emitted.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Most recent value, if any.
    pub fn last(&self) -> Option<f32> {
        self.history.back().copied()
    }

    /// Recorded values, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    /// Make the next emit fail.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl<const N: usize> Default for RecordingSink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> OutputSink for RecordingSink<N> {
    type Error = MockError;

    fn emit_output(&mut self, value: f32) -> Result<(), Self::Error> {
        if core::mem::take(&mut self.fail_next) {
            return Err(MockError::Injected);
        }
        if self.history.is_full() {
            self.history.pop_front();
        }
        // Capacity was just ensured; a zero-capacity sink only counts.
        let _ = self.history.push_back(value);
        self.count = self.count.saturating_add(1);
        Ok(())
    }
}

/// Mock ADC replaying scripted result codes.
pub struct MockAdc {
    codes: heapless::Deque<u16, 64>,
}

impl MockAdc {
    /// Create an ADC with an empty script.
    pub fn new() -> Self {
        Self {
            codes: heapless::Deque::new(),
        }
    }

    /// Queue a result code. Returns the code back if the script is full.
    pub fn push_code(&mut self, code: u16) -> Result<(), u16> {
        self.codes.push_back(code)
    }

    /// Codes still queued.
    pub fn pending(&self) -> usize {
        self.codes.len()
    }
}

impl Default for MockAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl RawAdc for MockAdc {
    type Error = MockError;

    fn read_code(&mut self) -> Result<u16, Self::Error> {
        self.codes.pop_front().ok_or(MockError::Exhausted)
    }
}

/// Mock DAC recording written codes.
pub struct MockDac {
    codes: heapless::Vec<u16, 256>,
    writes: u32,
}

impl MockDac {
    /// Create a DAC with no recorded writes.
    pub fn new() -> Self {
        Self {
            codes: heapless::Vec::new(),
            writes: 0,
        }
    }

    /// The first 256 codes written.
    pub fn codes(&self) -> &[u16] {
        &self.codes
    }

    /// Total number of writes.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl Default for MockDac {
    fn default() -> Self {
        Self::new()
    }
}

impl RawDac for MockDac {
    type Error = core::convert::Infallible;

    fn write_code(&mut self, code: u16) -> Result<(), Self::Error> {
        // Recording stops when full; the write itself always succeeds.
        let _ = self.codes.push(code);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analog_types::{AdcScaling, DacScaling};
    use crate::scaled::{ScaledAdc, ScaledDac};

    #[test]
    fn signal_source_counts_reads() {
        let mut source = SignalSource::new(|n| n as f32);
        assert_eq!(source.acquire_sample().unwrap(), 0.0);
        assert_eq!(source.acquire_sample().unwrap(), 1.0);
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn injected_source_failure_does_not_consume() {
        let mut source = SignalSource::new(|n| n as f32);
        source.fail_next();
        assert_eq!(source.acquire_sample(), Err(MockError::Injected));
        assert_eq!(source.acquire_sample().unwrap(), 0.0);
    }

    #[test]
    fn recording_sink_keeps_latest() {
        let mut sink: RecordingSink<2> = RecordingSink::new();
        for v in [0.1, 0.2, 0.3] {
            sink.emit_output(v).unwrap();
        }
        assert_eq!(sink.count(), 3);
        assert_eq!(sink.last(), Some(0.3));
        let values: Vec<f32> = sink.values().collect();
        assert_eq!(values, vec![0.2, 0.3]);
    }

    #[test]
    fn scaled_adc_reads_original_bench_scaling() {
        let mut adc = MockAdc::new();
        adc.push_code(0).unwrap();
        adc.push_code(2048).unwrap();
        let mut source = ScaledAdc::new(adc, AdcScaling::default());
        assert_eq!(source.acquire_sample().unwrap(), -1.0);
        assert_eq!(source.acquire_sample().unwrap(), 0.0);
        assert_eq!(source.acquire_sample(), Err(MockError::Exhausted));
    }

    #[test]
    fn scaled_dac_writes_codes() {
        let mut sink = ScaledDac::new(MockDac::new(), DacScaling::default());
        sink.emit_output(-1.0).unwrap();
        sink.emit_output(1.0).unwrap();
        assert_eq!(sink.inner().codes(), &[0, 4095]);
        assert_eq!(sink.inner().writes(), 2);
    }
}
