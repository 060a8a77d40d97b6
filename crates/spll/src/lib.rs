//! Single-phase software PLL.
//!
//! Tracks the phase and frequency of a sampled AC signal and synthesizes a
//! phase-aligned sine. Per trigger:
//!
//! ```text
//! SampleSource ─► NotchFilter (2·f_nom) ─► Spll ─► OutputSink
//!                                            │
//!                                            └─ sin, cos, phase, frequency, lock
//! ```
//!
//! - [`config`]: tunables, presets, validation
//! - [`notch`]: pre-warped second-order notch on `biquad`
//! - [`pll`]: phase detector, PI loop filter, phase accumulator
//! - [`lock`]: amplitude and phase error tracking, lock flag
//! - [`pipeline`]: notch + SPLL with fault reset and counters
//! - [`scheduler`]: trigger gate, overrun policy, source/sink plumbing
//! - [`generator`]: reference sine for loopback testing
//!
//! The crate is `no_std`, allocation-free and panic-free in the update path.
//! Logging goes to `defmt` or `tracing` depending on the enabled feature.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod error;
pub mod generator;
pub mod lock;
pub mod notch;
pub mod phase;
pub mod pipeline;
pub mod pll;
pub mod scheduler;

pub use config::{FrequencyLimits, LockConfig, LoopFilterConfig, NotchConfig, SpllConfig};
pub use error::{ConfigError, NumericFault, Stage};
pub use generator::SineGenerator;
pub use lock::{LockDetector, LockEstimate};
pub use notch::{NotchCoefficients, NotchFilter};
pub use pipeline::{Pipeline, PipelineStats};
pub use pll::{LockedOutput, PllState, Spll};
pub use scheduler::{
    SampleScheduler, SamplingGuard, SchedulerDiagnostics, SchedulerState, TickError, TickOutcome,
    TriggerGate,
};
