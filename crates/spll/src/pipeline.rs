//! Per-sample pipeline: notch pre-filter, then SPLL.
//!
//! `Pipeline` owns all algorithm state. It is the value the scheduler drives
//! once per trigger; nothing else may touch it. A numeric fault resets only
//! the component that raised it, is counted, and is logged.
//!
//! The SPLL locks onto the pre-filtered signal, which the notch delays by
//! `-arg H(e^jωT)`. Every output is advanced by that lag at the current
//! frequency estimate so the reference lines up with the raw input.

use core::f32::consts::TAU;

use crate::config::SpllConfig;
use crate::error::{ConfigError, NumericFault};
use crate::notch::{NotchCoefficients, NotchFilter};
use crate::phase;
use crate::pll::{LockedOutput, Spll};

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineStats {
    /// Samples consumed, faulted ones included.
    pub samples: u32,
    /// Faults raised by the pre-filter notch.
    pub notch_faults: u32,
    /// Faults raised by the SPLL.
    pub pll_faults: u32,
    /// Transitions into lock.
    pub lock_acquired: u32,
    /// Transitions out of lock, including those caused by a fault reset.
    pub lock_losses: u32,
}

/// Notch pre-filter followed by the SPLL.
pub struct Pipeline {
    config: SpllConfig,
    prefilter: NotchFilter,
    pll: Spll,
    stats: PipelineStats,
    locked: bool,
}

impl Pipeline {
    /// Validate `config` and derive all coefficients and initial state.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for an invalid configuration.
    pub fn new(config: SpllConfig) -> Result<Self, ConfigError> {
        let prefilter = NotchFilter::new(NotchCoefficients::design(
            config.sample_period_s,
            &config.notch,
        )?);
        let pll = Spll::new(&config)?;
        info!(
            "SPLL configured: nominal {} Hz, T {} s, notch {} Hz",
            config.nominal_frequency_hz,
            config.sample_period_s,
            config.notch.center_hz()
        );
        debug!(
            "SPLL loop: kp {}, ki {}, limits {}..{} Hz",
            config.loop_filter.kp,
            config.loop_filter.ki,
            config.frequency_limits.min_hz,
            config.frequency_limits.max_hz
        );
        Ok(Self {
            config,
            prefilter,
            pll,
            stats: PipelineStats::default(),
            locked: false,
        })
    }

    /// Process one raw sample.
    ///
    /// # Errors
    ///
    /// [`NumericFault`] from the notch or the SPLL. The faulted component
    /// has been reset; [`Pipeline::output`] reflects the post-reset state.
    pub fn process(&mut self, raw: f32) -> Result<LockedOutput, NumericFault> {
        self.stats.samples = self.stats.samples.saturating_add(1);

        let filtered = match self.prefilter.update(raw) {
            Ok(filtered) => filtered,
            Err(fault) => {
                self.stats.notch_faults = self.stats.notch_faults.saturating_add(1);
                warn!("notch fault ({}), filter reset", fault);
                return Err(fault);
            }
        };

        match self.pll.update(filtered) {
            Ok(output) => {
                self.track_lock(output.locked, output.frequency_hz);
                Ok(self.align(output))
            }
            Err(fault) => {
                self.stats.pll_faults = self.stats.pll_faults.saturating_add(1);
                warn!("SPLL fault ({}), loop reset", fault);
                self.track_lock(false, self.pll.state().frequency_hz);
                Err(fault)
            }
        }
    }

    /// Advance the SPLL reference by the pre-filter's lag at its frequency.
    fn align(&self, output: LockedOutput) -> LockedOutput {
        let lag_rad = self
            .prefilter
            .coefficients()
            .phase_at(output.frequency_hz, self.config.sample_period_s);
        let phase = phase::wrap(output.phase - lag_rad / TAU);
        let (sin, cos) = phase::sin_cos(phase);
        LockedOutput {
            sin,
            cos,
            phase,
            ..output
        }
    }

    fn track_lock(&mut self, locked: bool, frequency_hz: f32) {
        if locked == self.locked {
            return;
        }
        self.locked = locked;
        if locked {
            self.stats.lock_acquired = self.stats.lock_acquired.saturating_add(1);
            info!("lock acquired at {} Hz", frequency_hz);
        } else {
            self.stats.lock_losses = self.stats.lock_losses.saturating_add(1);
            warn!("lock lost at {} Hz", frequency_hz);
        }
    }

    /// Apply a new configuration.
    ///
    /// The pre-filter restarts with the new coefficients; the SPLL keeps its
    /// phase (see [`Spll::retune`]).
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if invalid; the pipeline is unchanged then.
    pub fn retune(&mut self, config: SpllConfig) -> Result<(), ConfigError> {
        let coefficients = NotchCoefficients::design(config.sample_period_s, &config.notch)?;
        self.pll.retune(&config)?;
        self.prefilter.retune(coefficients);
        self.config = config;
        self.track_lock(false, self.pll.state().frequency_hz);
        info!(
            "SPLL retuned: nominal {} Hz, notch {} Hz",
            config.nominal_frequency_hz,
            config.notch.center_hz()
        );
        Ok(())
    }

    /// Reset both components to their initial state. Counters are kept.
    pub fn reset(&mut self) {
        self.prefilter.reset();
        self.pll.reset();
        self.track_lock(false, self.pll.state().frequency_hz);
    }

    /// Output as of the last update (or the reset state), aligned with the
    /// raw input.
    #[must_use]
    pub fn output(&self) -> LockedOutput {
        self.align(self.pll.output())
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SpllConfig {
        &self.config
    }

    /// The SPLL stage.
    #[must_use]
    pub fn pll(&self) -> &Spll {
        &self.pll
    }

    /// The pre-filter stage.
    #[must_use]
    pub fn prefilter(&self) -> &NotchFilter {
        &self.prefilter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::generator::SineGenerator;

    #[test]
    fn counts_samples_and_faults() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        pipeline.process(0.1).unwrap();
        assert_eq!(
            pipeline.process(f32::NAN),
            Err(NumericFault::NonFiniteInput(Stage::Notch))
        );
        pipeline.process(0.2).unwrap();
        let stats = pipeline.stats();
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.notch_faults, 1);
        assert_eq!(stats.pll_faults, 0);
    }

    #[test]
    fn notch_fault_leaves_pll_untouched() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        for x in SineGenerator::new(50.0, 2.0e-5).take(777) {
            pipeline.process(x).unwrap();
        }
        let before = *pipeline.pll().state();
        assert!(pipeline.process(f32::INFINITY).is_err());
        assert_eq!(*pipeline.pll().state(), before);
    }

    #[test]
    fn acquires_lock_on_clean_sine() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        for x in SineGenerator::new(50.0, 2.0e-5).take(50_000) {
            pipeline.process(x).unwrap();
        }
        assert!(pipeline.output().locked);
        assert_eq!(pipeline.stats().lock_acquired, 1);
        assert_eq!(pipeline.stats().lock_losses, 0);
    }

    #[test]
    fn reset_counts_lock_loss() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        for x in SineGenerator::new(50.0, 2.0e-5).take(50_000) {
            pipeline.process(x).unwrap();
        }
        pipeline.reset();
        assert!(!pipeline.output().locked);
        assert_eq!(pipeline.stats().lock_losses, 1);
    }

    #[test]
    fn output_leads_spll_by_prefilter_lag() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        for x in SineGenerator::new(50.0, 2.0e-5).take(50_000) {
            pipeline.process(x).unwrap();
        }
        let output = pipeline.output();
        let raw = pipeline.pll().output();
        let lead = phase::wrap_radians(TAU * (output.phase - raw.phase));
        let lag = pipeline.prefilter().coefficients().phase_at(raw.frequency_hz, 2.0e-5);
        assert!((lead + lag).abs() < 1e-4, "lead {lead}, lag {lag}");
        assert!((lead - 0.1326).abs() < 5e-3, "lead {lead}");
        assert_eq!(output.frequency_hz, raw.frequency_hz);
        assert_eq!(output.locked, raw.locked);
    }

    #[test]
    fn invalid_retune_keeps_config() {
        let mut pipeline = Pipeline::new(SpllConfig::grid_50hz()).unwrap();
        let mut bad = SpllConfig::grid_60hz();
        bad.loop_filter.kp = f32::NAN;
        assert_eq!(pipeline.retune(bad), Err(ConfigError::LoopGains));
        assert_eq!(*pipeline.config(), SpllConfig::grid_50hz());
    }
}
