//! Run summary and CSV trace.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use spll::{LockedOutput, SchedulerDiagnostics};

/// CSV writer for the per-sample trace.
pub struct Trace {
    out: BufWriter<File>,
    decimate: u32,
}

impl Trace {
    pub fn create(path: &Path, decimate: u32) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "time_s,input_hz,sin,cos,phase,frequency_hz,phase_error_rad,locked")?;
        Ok(Self {
            out,
            decimate: decimate.max(1),
        })
    }

    pub fn record(&mut self, index: u32, time_s: f32, input_hz: f32, output: &LockedOutput) -> Result<()> {
        if index.checked_rem(self.decimate) != Some(0) {
            return Ok(());
        }
        writeln!(
            self.out,
            "{time_s:.6},{input_hz},{:.6},{:.6},{:.6},{:.4},{:.5},{}",
            output.sin,
            output.cos,
            output.phase,
            output.frequency_hz,
            output.phase_error_rad,
            u8::from(output.locked),
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().context("flushing CSV trace")
    }
}

/// What the run produced.
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub duration_s: f32,
    pub input_hz: f32,
    pub first_lock_s: Option<f32>,
    pub last_lock_s: Option<f32>,
    pub final_output: LockedOutput,
    pub dropped: u32,
    pub recovered: u32,
    pub diagnostics: SchedulerDiagnostics,
}

impl Summary {
    pub fn log(&self) {
        let d = &self.diagnostics;
        tracing::info!(
            duration_s = self.duration_s,
            input_hz = self.input_hz,
            frequency_hz = self.final_output.frequency_hz,
            phase_error_rad = self.final_output.phase_error_rad,
            locked = self.final_output.locked,
            "run complete"
        );
        match self.first_lock_s {
            Some(t) => tracing::info!(first_lock_s = t, last_lock_s = ?self.last_lock_s, "lock timing"),
            None => tracing::warn!("never locked"),
        }
        tracing::info!(
            triggers = d.triggers,
            overruns = d.overruns,
            dropped = self.dropped,
            recovered = self.recovered,
            samples = d.pipeline.samples,
            notch_faults = d.pipeline.notch_faults,
            pll_faults = d.pipeline.pll_faults,
            lock_acquired = d.pipeline.lock_acquired,
            lock_losses = d.pipeline.lock_losses,
            source_errors = d.source_errors,
            sink_errors = d.sink_errors,
            "counters"
        );
    }
}
