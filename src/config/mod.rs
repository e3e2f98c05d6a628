//! Module: config
//!
//! Purpose: Compile-time tunables for the beacon.
//!
//! Architecture:
//! - `MAX_SLOTS`: instruction-buffer capacity, used as the const generic default
//! - `CONFIG`: periods per burst, sample rate, waveform and ADC channel
//! - `bands`: the carrier table the calibration is allowed to land on
//!
//! Safety: Safe. Plain `Copy` data, nothing mutable at runtime.

pub mod bands;

pub use bands::{FrequencyTable, MW_CARRIERS};

use crate::waveform::WaveformMode;

/// Instruction-buffer capacity (number of delay-line slots).
pub const MAX_SLOTS: usize = 80;

/// Beacon configuration used by the firmware.
pub const CONFIG: BroadcastConfig = BroadcastConfig::new();

/// Broadcast configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BroadcastConfig {
    /// Periods timed per return position while MEASURING.
    pub measure_periods: u32,

    /// Periods timed once at the chosen position while TESTING.
    pub confirm_periods: u32,

    /// Rate at which the modulating input is reproduced, in Hz.
    pub sample_rate: u32,

    /// Carrier reported before calibration has picked one, in Hz.
    pub desired_hz: f32,

    /// Shape of one emitted period.
    pub waveform: WaveformMode,

    /// ADC1 channel sampled for the modulating signal.
    pub adc_channel: u8,
}

impl BroadcastConfig {
    /// Default configuration (558 kHz target, 22.05 kHz audio, square wave).
    pub const fn new() -> Self {
        Self {
            measure_periods: 100_000,
            confirm_periods: 250_000,
            sample_rate: 22_050,
            desired_hz: 558_000.0,
            waveform: WaveformMode::Square,
            adc_channel: 0,
        }
    }

    /// Same configuration with different burst lengths.
    pub const fn with_periods(self, measure_periods: u32, confirm_periods: u32) -> Self {
        Self {
            measure_periods,
            confirm_periods,
            ..self
        }
    }

    /// Same configuration with a different sample rate.
    pub const fn with_sample_rate(self, sample_rate: u32) -> Self {
        Self { sample_rate, ..self }
    }

    /// Same configuration with a different waveform.
    pub const fn with_waveform(self, waveform: WaveformMode) -> Self {
        Self { waveform, ..self }
    }

    /// Half the sample rate, the shift applied to every carrier target.
    #[inline]
    pub fn half_sample_rate(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Check the values the controller divides by.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measure_periods == 0 || self.confirm_periods == 0 {
            return Err(ConfigError::ZeroPeriods);
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(())
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// C01: A burst length is zero
    ZeroPeriods,
    /// C02: Sample rate is zero
    ZeroSampleRate,
    /// C03: Carrier table is empty
    EmptyBandTable,
}

impl ConfigError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroPeriods => "C01",
            Self::ZeroSampleRate => "C02",
            Self::EmptyBandTable => "C03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::ZeroPeriods => "periods per burst must be non-zero",
            Self::ZeroSampleRate => "sample rate must be non-zero",
            Self::EmptyBandTable => "carrier table is empty",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
