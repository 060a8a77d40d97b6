//! Converter domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions replace the hard-coded 12-bit scaling
//! constants of the original bench firmware:
//! - `ConverterBits`: validates a converter resolution of 1–16 bits
//! - `AdcScaling`: result code → normalized `[-1, 1]`, mid-scale is zero
//! - `DacScaling`: normalized `[-1, 1]` → output code, clamped to full scale
//! - `SampleRateHz`: validates the trigger rate range

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── ConverterBits ────────────────────────────────────────────────────────────

/// Converter resolution in bits, 1–16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ConverterBits(u8);

impl ConverterBits {
    /// Smallest supported resolution.
    pub const MIN: u8 = 1;

    /// Largest supported resolution (codes must fit a `u16`).
    pub const MAX: u8 = 16;

    /// 12-bit converter, the resolution of the F2837x ADC and DAC.
    pub const TWELVE: Self = Self(12);

    /// Create a resolution, returning an error outside 1–16 bits.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `bits == 0` or `bits > 16`.
    pub fn new(bits: u8) -> Result<Self, OutOfRangeError> {
        if (Self::MIN..=Self::MAX).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(OutOfRangeError {
                value: u32::from(bits),
                min: u32::from(Self::MIN),
                max: u32::from(Self::MAX),
            })
        }
    }

    /// Return the resolution in bits.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Largest code the converter can produce (`2^bits - 1`).
    #[must_use]
    pub fn max_code(self) -> u16 {
        // bits <= 16, so the shift fits a u32 and the result fits a u16.
        #[allow(clippy::cast_possible_truncation)]
        let max = ((1u32 << self.0).saturating_sub(1)) as u16;
        max
    }

    /// Mid-scale code (`2^(bits-1)`), the zero point of a bipolar signal.
    #[must_use]
    pub fn mid_code(self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let mid = (1u32 << self.0.saturating_sub(1)) as u16;
        mid
    }
}

impl Default for ConverterBits {
    fn default() -> Self {
        Self::TWELVE
    }
}

// ── AdcScaling ───────────────────────────────────────────────────────────────

/// ADC result code to normalized sample.
///
/// Formula: `sample = (code - mid) / mid`. For 12 bits this is
/// `(code - 2048) / 2048`, so code 0 maps to -1.0 and code 4095 to just
/// below +1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcScaling {
    bits: ConverterBits,
}

impl AdcScaling {
    /// Scaling for a converter of the given resolution.
    #[must_use]
    pub const fn new(bits: ConverterBits) -> Self {
        Self { bits }
    }

    /// Converter resolution.
    #[must_use]
    pub fn bits(self) -> ConverterBits {
        self.bits
    }

    /// Convert a raw result code to a normalized sample.
    ///
    /// Codes above full scale (noise in the upper bits) are clamped first.
    #[must_use]
    pub fn to_normalized(self, code: u16) -> f32 {
        let code = code.min(self.bits.max_code());
        let mid = f32::from(self.bits.mid_code());
        (f32::from(code) - mid) / mid
    }
}

// ── DacScaling ───────────────────────────────────────────────────────────────

/// Normalized value to DAC code.
///
/// Formula: `code = round((value + 1) * max / 2)`, with `value` clamped to
/// `[-1, 1]`. For 12 bits, -1.0 → 0, 0.0 → 2048 (rounded from 2047.5), 1.0 → 4095.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacScaling {
    bits: ConverterBits,
}

impl DacScaling {
    /// Scaling for a converter of the given resolution.
    #[must_use]
    pub const fn new(bits: ConverterBits) -> Self {
        Self { bits }
    }

    /// Converter resolution.
    #[must_use]
    pub fn bits(self) -> ConverterBits {
        self.bits
    }

    /// Convert a normalized value to an output code.
    ///
    /// NaN maps to mid-scale so a faulted value never drives the output rail.
    #[must_use]
    pub fn from_normalized(self, value: f32) -> u16 {
        let max = f32::from(self.bits.max_code());
        if value.is_nan() {
            return self.bits.mid_code();
        }
        let scaled = libm::roundf((value.clamp(-1.0, 1.0) + 1.0) * max / 2.0);
        // scaled is within [0, max] and max <= u16::MAX.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let code = scaled.clamp(0.0, max) as u16;
        code
    }
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample trigger rate in Hz.
///
/// Valid range: 100 Hz – 1 MHz. Below 100 Hz a 50/60 Hz fundamental and its
/// second harmonic are not representable; above 1 MHz no sampling interrupt
/// can finish a full PLL update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported trigger rate.
    pub const MIN_HZ: u32 = 100;

    /// Maximum supported trigger rate.
    pub const MAX_HZ: u32 = 1_000_000;

    /// Create a `SampleRateHz`, returning an error if out of 100 Hz – 1 MHz.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 100` or `hz > 1_000_000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if hz < Self::MIN_HZ || hz > Self::MAX_HZ {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        } else {
            Ok(Self(hz))
        }
    }

    /// Return the trigger rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Seconds between two triggers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // rates up to 1 MHz are exact in f32
    pub fn period_s(self) -> f32 {
        1.0 / self.0 as f32
    }
}
