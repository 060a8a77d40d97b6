//! Application configuration and constants
//!
//! Central identification values shared by the firmware and the desktop
//! simulator. Board-level constants live here rather than as literals at the
//! call sites.

use crate::analog_types::ConverterBits;

/// The application name
pub const APP_NAME: &str = "Grid Sync";

/// The application type/category
pub const APP_TYPE: &str = "SPLL"; // Single-phase software PLL

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolution of the sampling ADC on the reference board (F2837x ADC-B).
pub const ADC_BITS: ConverterBits = ConverterBits::TWELVE;

/// Resolution of the output DACs on the reference board (DAC-A, DAC-C).
pub const DAC_BITS: ConverterBits = ConverterBits::TWELVE;

/// ADC trigger rate of the reference board (ePWM4 SOCA at 50 kHz).
pub const REFERENCE_SAMPLE_RATE_HZ: u32 = 50_000;

/// Mode shown in the development banner
pub const DEV_MODE: &str = "Simulation Mode";

/// Development mode banner, rendered as `"<APP_NAME> - <DEV_MODE>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevBanner;

impl core::fmt::Display for DevBanner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{APP_NAME} - {DEV_MODE}")
    }
}

/// Development mode banner
pub const fn dev_banner() -> DevBanner {
    DevBanner
}
