//! Hardware Abstraction Layer (HAL) for the Grid Sync SPLL
//!
//! This crate provides trait-based abstractions for the analog front end,
//! enabling development and testing of the PLL core without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (sampling interrupt / simulator)
//!         ↓
//! Feature Layer (spll: notch, PLL, scheduler)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (ADC result / DAC value registers)
//! ```
//!
//! # Abstraction Levels
//!
//! ## Normalized signals
//! - [`SampleSource`] - one input sample in `[-1, 1]` per trigger
//! - [`OutputSink`] - one output value in `[-1, 1]` per trigger
//!
//! ## Raw converters
//! - [`RawAdc`] / [`RawDac`] - result and value codes
//! - [`ScaledAdc`] / [`ScaledDac`] - resolution-aware adapters
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```
//! use platform::{AdcScaling, ConverterBits};
//!
//! let adc = AdcScaling::new(ConverterBits::TWELVE);
//! assert_eq!(adc.to_normalized(2048), 0.0);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register and board names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod analog;
pub mod analog_types;
pub mod config;
pub mod mocks;
pub mod scaled;

// Re-export main traits
pub use analog::{OutputSink, RawAdc, RawDac, SampleSource};

// Re-export converter types
pub use analog_types::{AdcScaling, ConverterBits, DacScaling, OutOfRangeError, SampleRateHz};
pub use scaled::{ScaledAdc, ScaledDac};
