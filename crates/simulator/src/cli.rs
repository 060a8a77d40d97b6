//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Grid preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Grid {
    /// 50 Hz nominal.
    #[value(name = "50")]
    Hz50,
    /// 60 Hz nominal.
    #[value(name = "60")]
    Hz60,
}

#[derive(Debug, Parser)]
#[command(name = "spll-sim")]
#[command(about = "Loopback bench for the single-phase software PLL", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Grid preset used when no --config file is given
    #[arg(long, value_enum, default_value = "50")]
    pub grid: Grid,

    /// JSON configuration file (overrides --grid)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Trigger rate in Hz (overrides the preset sample period)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Input frequency in Hz (defaults to the nominal frequency)
    #[arg(long)]
    pub frequency: Option<f32>,

    /// Input peak amplitude, normalized
    #[arg(long, default_value_t = 0.9)]
    pub amplitude: f32,

    /// Initial input phase in radians
    #[arg(long, default_value_t = 0.0)]
    pub phase: f32,

    /// Second-harmonic amplitude relative to the fundamental
    #[arg(long, default_value_t = 0.0)]
    pub harmonic: f32,

    /// Frequency to step to, in Hz
    #[arg(long, requires = "step_at")]
    pub step_to: Option<f32>,

    /// Time of the frequency step, in seconds
    #[arg(long, requires = "step_to")]
    pub step_at: Option<f32>,

    /// Replace the sample with this index by NaN
    #[arg(long)]
    pub nan_at: Option<u32>,

    /// Hold the trigger gate on every Nth trigger to provoke an overrun
    #[arg(long)]
    pub overrun_every: Option<u32>,

    /// Simulated duration in seconds
    #[arg(long, default_value_t = 2.0)]
    pub duration: f32,

    /// Write a CSV trace to this file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write every Nth sample to the CSV trace
    #[arg(long, default_value_t = 10)]
    pub decimate: u32,
}
