//! Desktop loopback bench for the SPLL.
//!
//! Generates a grid signal, pushes it through the 12-bit converter scaling
//! and the scheduler exactly as the sampling interrupt would, and reports
//! lock timing and counters.
//!
//! ```text
//! RUST_LOG=info cargo run -p simulator -- --frequency 51 --harmonic 0.1 --csv trace.csv
//! ```

// Desktop tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cli;
mod report;
mod scenario;

use anyhow::{bail, Context, Result};
use clap::Parser;
use platform::mocks::MockDac;
use platform::{AdcScaling, DacScaling, SampleRateHz, ScaledAdc, ScaledDac};
use spll::{Pipeline, SampleScheduler, SpllConfig, TickOutcome, TriggerGate};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Grid};
use crate::report::{Summary, Trace};
use crate::scenario::{FaultInjector, LoopbackAdc, Scenario};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    tracing::info!(
        "{} ({} v{})",
        platform::config::dev_banner(),
        platform::config::APP_TYPE,
        platform::config::APP_VERSION
    );
    let config = load_config(&cli)?;

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let summary = run(&cli, config)?;
    summary.log();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SpllConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<SpllConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => match cli.grid {
            Grid::Hz50 => SpllConfig::grid_50hz(),
            Grid::Hz60 => SpllConfig::grid_60hz(),
        },
    };
    if let Some(rate) = cli.sample_rate {
        let rate = SampleRateHz::new(rate)
            .map_err(|e| anyhow::anyhow!("sample rate {} Hz outside {}..={} Hz", e.value, e.min, e.max))?;
        config.sample_period_s = rate.period_s();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid SPLL configuration: {e}"))?;
    Ok(config)
}

fn run(cli: &Cli, config: SpllConfig) -> Result<Summary> {
    if !(cli.duration.is_finite() && cli.duration > 0.0) {
        bail!("duration must be positive");
    }
    let period = config.sample_period_s;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = (cli.duration / period).round().min(u32::MAX as f32) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let step = match (cli.step_at, cli.step_to) {
        (Some(at), Some(to)) => Some(((at / period).round().max(0.0) as u32, to)),
        _ => None,
    };
    let scenario = Scenario {
        frequency_hz: cli.frequency.unwrap_or(config.nominal_frequency_hz),
        amplitude: cli.amplitude,
        phase_rad: cli.phase,
        harmonic: cli.harmonic,
        step,
    };
    tracing::info!(?scenario, samples = total, "starting loopback run");

    let adc = LoopbackAdc::new(scenario, period, DacScaling::new(platform::config::DAC_BITS));
    let source = FaultInjector::new(ScaledAdc::new(adc, AdcScaling::new(platform::config::ADC_BITS)), cli.nan_at);
    let sink = ScaledDac::new(MockDac::new(), DacScaling::new(platform::config::DAC_BITS));
    let gate = TriggerGate::new();
    let pipeline = Pipeline::new(config).map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut scheduler = SampleScheduler::new(&gate, pipeline, source, sink);

    let mut trace = cli
        .csv
        .as_deref()
        .map(|path| Trace::create(path, cli.decimate))
        .transpose()?;

    let mut first_lock_s = None;
    let mut last_lock_s = None;
    let mut was_locked = false;
    let mut dropped = 0u32;
    let mut recovered = 0u32;

    for index in 0..total {
        #[allow(clippy::cast_precision_loss)]
        let time_s = index as f32 * period;
        // Every Nth trigger lands while the previous update still holds the gate.
        let busy = cli
            .overrun_every
            .is_some_and(|every| index > 0 && index.checked_rem(every) == Some(0));
        let in_flight = if busy { gate.try_enter() } else { None };
        let input_hz = scheduler.source().inner().inner().frequency_hz();
        let outcome = match scheduler.on_trigger() {
            Ok(outcome) => outcome,
            Err(err) => bail!("trigger {index} failed: {err}"),
        };
        drop(in_flight);

        match outcome {
            TickOutcome::Dropped => dropped = dropped.saturating_add(1),
            TickOutcome::Recovered(fault) => {
                recovered = recovered.saturating_add(1);
                tracing::warn!(index, %fault, "recovered from numeric fault");
            }
            TickOutcome::Processed(_) => {}
        }

        let output = scheduler.pipeline().output();
        if output.locked && !was_locked {
            first_lock_s.get_or_insert(time_s);
            last_lock_s = Some(time_s);
        }
        was_locked = output.locked;

        if let Some(trace) = trace.as_mut() {
            trace.record(index, time_s, input_hz, &output)?;
        }
    }
    if let Some(trace) = trace {
        trace.finish()?;
    }

    let diagnostics = scheduler.diagnostics();
    let (pipeline, source, sink) = scheduler.into_parts();
    tracing::debug!(dac_writes = sink.into_inner().writes(), "DAC loopback done");
    Ok(Summary {
        duration_s: cli.duration,
        input_hz: source.inner().inner().frequency_hz(),
        first_lock_s,
        last_lock_s,
        final_output: pipeline.output(),
        dropped,
        recovered,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spll-sim").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn config_json_without_lock_section_uses_defaults() {
        let mut value = serde_json::to_value(SpllConfig::grid_60hz()).unwrap();
        value.as_object_mut().unwrap().remove("lock");
        let config: SpllConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config, SpllConfig::grid_60hz());
    }

    #[test]
    fn sample_rate_override_is_validated() {
        assert!(load_config(&cli(&["--sample-rate", "10"])).is_err());
        let config = load_config(&cli(&["--sample-rate", "20000", "--grid", "60"])).unwrap();
        assert!((config.sample_period_s - 5.0e-5).abs() < 1e-9);
        assert_eq!(config.nominal_frequency_hz, 60.0);
    }

    #[test]
    fn clean_run_locks() {
        let args = cli(&["--duration", "1"]);
        let summary = run(&args, load_config(&args).unwrap()).unwrap();
        assert!(summary.final_output.locked);
        assert!(summary.first_lock_s.is_some_and(|t| t < 0.5));
        assert_eq!(summary.diagnostics.pipeline.samples, 50_000);
    }

    #[test]
    fn injected_faults_are_reported() {
        let args = cli(&["--duration", "1", "--nan-at", "1001", "--overrun-every", "500"]);
        let summary = run(&args, load_config(&args).unwrap()).unwrap();
        assert_eq!(summary.recovered, 1);
        assert_eq!(summary.diagnostics.pipeline.notch_faults, 1);
        assert_eq!(summary.dropped, 99);
        assert_eq!(summary.diagnostics.overruns, 99);
        assert!(summary.final_output.locked);
    }
}
