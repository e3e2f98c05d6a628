//! # RustMwBeacon
//!
//! Medium-wave AM beacon that radiates straight from a DAC pin.
//!
//! ## Architecture
//!
//! The platform has no sub-microsecond timer, so the carrier period is set
//! by a calibrated delay line instead:
//! - [`InstructionBuffer`] is a run of no-ops ended by one movable return
//! - [`WaveformEmitter`] writes DAC levels separated by delay-line runs
//! - [`BroadcastController`] times every return position, picks the one that
//!   lands nearest a broadcast carrier, confirms it, then transmits forever
//! - [`AnalogSampler`] polls the ADC one step per tick and never blocks
//!
//! Everything here is pure logic over the traits in [`hal`], so the whole
//! pipeline runs on the host under test.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "xtensa", feature(asm_experimental_arch))]

pub mod config;
pub mod delay;
pub mod waveform;
pub mod sampler;
pub mod calibration;
pub mod broadcast;
pub mod station;
pub mod hal;
pub mod logging;
pub mod log_globals;
pub mod uart_logger;
pub mod fault;

pub use config::{BroadcastConfig, ConfigError, CONFIG, MAX_SLOTS};
pub use delay::{DelayLine, InstructionBuffer};
pub use waveform::{WaveformEmitter, WaveformMode};
pub use sampler::{AnalogSampler, SamplerState};
pub use calibration::{BestMatch, CalibrationEngine, CalibrationError, MeasurementRecord};
pub use broadcast::{BroadcastController, BroadcastReport, BroadcastState};
pub use station::Station;
pub use fault::{FaultState, FaultCode};
pub use log_globals::RT_LOG_STREAM;
