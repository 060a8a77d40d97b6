//! Real-time sample scheduler.
//!
//! A periodic trigger (timer/PWM event, ADC end-of-conversion interrupt)
//! calls [`SampleScheduler::on_trigger`] once per period. The trigger context
//! and the processing context share only a [`TriggerGate`]:
//!
//! ```text
//!            try_enter() ok                   guard dropped
//!   Idle ─────────────────────► Sampling ─────────────────────► Idle
//!                                  │
//!                                  │ trigger while Sampling
//!                                  ▼
//!                    sample read and dropped, overruns += 1
//! ```
//!
//! Missed triggers are never queued. The gate is lock-free so it can be
//! entered from an interrupt handler.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use platform::{OutputSink, SampleSource};
use thiserror_no_std::Error;

use crate::error::NumericFault;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::pll::LockedOutput;

/// Scheduler state as seen through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Waiting for the next trigger.
    Idle,
    /// One pipeline update in progress.
    Sampling,
}

/// Busy flag plus trigger and overrun counters.
#[derive(Debug, Default)]
pub struct TriggerGate {
    busy: AtomicBool,
    triggers: AtomicU32,
    overruns: AtomicU32,
}

impl TriggerGate {
    /// Idle gate with zeroed counters. `const` so it can live in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            triggers: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Register a trigger and move Idle → Sampling.
    ///
    /// Returns `None` and counts an overrun if an update is already in
    /// progress. The returned guard moves the gate back to Idle when dropped.
    pub fn try_enter(&self) -> Option<SamplingGuard<'_>> {
        saturating_increment(&self.triggers);
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SamplingGuard { gate: self })
        } else {
            saturating_increment(&self.overruns);
            None
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.busy.load(Ordering::Acquire) {
            SchedulerState::Sampling
        } else {
            SchedulerState::Idle
        }
    }

    /// Triggers seen, processed or dropped.
    #[must_use]
    pub fn triggers(&self) -> u32 {
        self.triggers.load(Ordering::Relaxed)
    }

    /// Triggers that arrived while Sampling.
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }
}

fn saturating_increment(counter: &AtomicU32) {
    // Err only when already saturated.
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
}

/// Proof of being in the Sampling state. Dropping it returns to Idle.
#[derive(Debug)]
pub struct SamplingGuard<'a> {
    gate: &'a TriggerGate,
}

impl Drop for SamplingGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Sample processed, locked sine emitted.
    Processed(LockedOutput),
    /// Numeric fault; the faulted component was reset and its reset-state
    /// output emitted.
    Recovered(NumericFault),
    /// Overrun; the sample was read and discarded, nothing emitted.
    Dropped,
}

/// I/O failure during a trigger.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickError<S, K> {
    /// Sample acquisition failed. Nothing was processed.
    #[error("sample source failed: {0:?}")]
    Source(S),
    /// The sample was processed but the output could not be written.
    #[error("output sink failed: {0:?}")]
    Sink(K),
}

/// Counters gathered from the gate, the scheduler and the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerDiagnostics {
    /// Triggers seen by the gate.
    pub triggers: u32,
    /// Triggers dropped because an update was in progress.
    pub overruns: u32,
    /// Failed acquisitions.
    pub source_errors: u32,
    /// Failed output writes.
    pub sink_errors: u32,
    /// Pipeline counters.
    pub pipeline: PipelineStats,
}

/// Drives a [`Pipeline`] from a sample source to an output sink.
pub struct SampleScheduler<'g, S, K> {
    gate: &'g TriggerGate,
    pipeline: Pipeline,
    source: S,
    sink: K,
    source_errors: u32,
    sink_errors: u32,
}

impl<'g, S, K> SampleScheduler<'g, S, K>
where
    S: SampleSource,
    K: OutputSink,
{
    /// Assemble a scheduler. The gate may be shared with the trigger context.
    pub fn new(gate: &'g TriggerGate, pipeline: Pipeline, source: S, sink: K) -> Self {
        Self {
            gate,
            pipeline,
            source,
            sink,
            source_errors: 0,
            sink_errors: 0,
        }
    }

    /// Handle one trigger: acquire, process, emit.
    ///
    /// The sample is always acquired, even on overrun, so the converter is
    /// serviced every period.
    ///
    /// # Errors
    ///
    /// [`TickError`] when the source or the sink fails. Both are counted and
    /// leave the pipeline consistent.
    pub fn on_trigger(&mut self) -> Result<TickOutcome, TickError<S::Error, K::Error>> {
        let gate = self.gate;
        let Some(_guard) = gate.try_enter() else {
            return match self.source.acquire_sample() {
                Ok(_) => Ok(TickOutcome::Dropped),
                Err(err) => {
                    self.source_errors = self.source_errors.saturating_add(1);
                    Err(TickError::Source(err))
                }
            };
        };

        let raw = match self.source.acquire_sample() {
            Ok(raw) => raw,
            Err(err) => {
                self.source_errors = self.source_errors.saturating_add(1);
                return Err(TickError::Source(err));
            }
        };

        let (outcome, value) = match self.pipeline.process(raw) {
            Ok(output) => (TickOutcome::Processed(output), output.sin),
            Err(fault) => (TickOutcome::Recovered(fault), self.pipeline.output().sin),
        };

        if let Err(err) = self.sink.emit_output(value) {
            self.sink_errors = self.sink_errors.saturating_add(1);
            return Err(TickError::Sink(err));
        }
        Ok(outcome)
    }

    /// Snapshot of all counters.
    #[must_use]
    pub fn diagnostics(&self) -> SchedulerDiagnostics {
        SchedulerDiagnostics {
            triggers: self.gate.triggers(),
            overruns: self.gate.overruns(),
            source_errors: self.source_errors,
            sink_errors: self.sink_errors,
            pipeline: self.pipeline.stats(),
        }
    }

    /// The pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Mutable pipeline access, e.g. to retune between triggers.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// The sample source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable sample source access.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The output sink.
    #[must_use]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Take the scheduler apart.
    pub fn into_parts(self) -> (Pipeline, S, K) {
        (self.pipeline, self.source, self.sink)
    }
}
