//! Broadcast controller.
//!
//! Top-level state machine, one unit of work per tick:
//!
//! ```text
//! MEASURING ──sweep done, match found──▶ TESTING ──one burst──▶ BROADCASTING ─┐
//!     │                                     │                       ▲          │
//!     └──no match──▶ HALTED ◀──clock stuck──┘                       └──────────┘
//! ```
//!
//! - MEASURING: time one burst at the current return position, record it,
//!   move the return on. After the last position, match against the carrier
//!   table and park the return on the winner.
//! - TESTING: time one longer burst at the winner and derive the repeat
//!   count, the number of identical periods sent per audio sample.
//! - BROADCASTING: send `repeat_count` periods of the current sample.
//! - HALTED: send nothing. A beacon on the wrong frequency is worse than
//!   silence.
//!
//! No transition goes backwards; MEASURING and TESTING run once.

use crate::calibration::{achieved_frequency, find_best_match, BestMatch, CalibrationEngine};
use crate::config::{BroadcastConfig, ConfigError, FrequencyTable};
use crate::delay::{DelayLine, InstructionBuffer};
use crate::fault::{FaultCode, FaultState};
use crate::hal::{AnalogOut, MonotonicClock};
use crate::logging::LogStream;
use crate::waveform::WaveformEmitter;

/// Controller phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastState {
    /// Sweeping delay-line positions.
    Measuring,
    /// Re-timing the chosen position.
    Testing,
    /// On air.
    Broadcasting,
    /// Calibration failed; output stopped.
    Halted,
}

/// Calibration outcome, logged once when TESTING completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BroadcastReport {
    /// Frequency measured during TESTING, in Hz.
    pub measured_hz: f32,
    /// Station frequency the match landed on, in Hz.
    pub carrier_hz: f32,
    /// `carrier_hz` shifted by half the sample rate, in Hz.
    pub target_hz: f32,
    /// `measured_hz - target_hz`, in Hz.
    pub error_hz: f32,
    /// Periods sent per audio sample.
    pub repeat_count: u32,
}

impl core::fmt::Display for BroadcastReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Broadcast: measured={:.1}, desired={:.1} ({:.1}), error={:.1}, final periods={}",
            self.measured_hz, self.carrier_hz, self.target_hz, self.error_hz, self.repeat_count
        )
    }
}

/// Periods per sample for a carrier at `achieved_hz`.
///
/// Each logical output bit is a high and a low half, hence the 0.5.
/// Rounded to nearest; not clamped.
#[inline]
pub fn repeat_count_for(achieved_hz: f32, sample_rate: u32) -> u32 {
    // `as` saturates: NaN -> 0, +inf -> u32::MAX.
    (0.5 * achieved_hz / sample_rate as f32 + 0.5) as u32
}

/// Calibrates the delay line and then keeps the carrier on air.
///
/// Owns the DAC, the clock, the instruction buffer and the measurement
/// record; nothing else touches them.
pub struct BroadcastController<'a, O, C, const N: usize = { crate::config::MAX_SLOTS }>
where
    O: AnalogOut,
    C: MonotonicClock,
{
    dac: O,
    clock: C,
    line: InstructionBuffer<N>,
    emitter: WaveformEmitter,
    engine: CalibrationEngine<N>,
    bands: FrequencyTable<'a>,
    config: BroadcastConfig,
    log: &'a LogStream,
    fault: &'a FaultState,

    state: BroadcastState,
    periods: u32,
    repeat_count: u32,
    desired_hz: f32,
    best: Option<BestMatch>,
    report: Option<BroadcastReport>,
}

impl<'a, O, C, const N: usize> BroadcastController<'a, O, C, N>
where
    O: AnalogOut,
    C: MonotonicClock,
{
    /// Create a controller in MEASURING with the return on the first
    /// candidate.
    ///
    /// `carriers` are station frequencies; the half-sample-rate shift is
    /// applied here.
    pub fn new(
        dac: O,
        mut clock: C,
        config: BroadcastConfig,
        carriers: &'a [f32],
        log: &'a LogStream,
        fault: &'a FaultState,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if carriers.is_empty() {
            return Err(ConfigError::EmptyBandTable);
        }

        let mut line = InstructionBuffer::new();
        let mut engine = CalibrationEngine::new();
        engine.begin(&mut line);

        crate::rt_info!(
            log,
            clock.now_us(),
            "Calibrating: {} positions x {} periods, {} carriers",
            CalibrationEngine::<N>::limit() - 1,
            config.measure_periods,
            carriers.len()
        );

        Ok(Self {
            dac,
            clock,
            line,
            emitter: WaveformEmitter::new(config.waveform),
            engine,
            bands: FrequencyTable::new(carriers, config.sample_rate),
            config,
            log,
            fault,
            state: BroadcastState::Measuring,
            periods: config.measure_periods,
            repeat_count: 0,
            desired_hz: config.desired_hz,
            best: None,
            report: None,
        })
    }

    /// Run one unit of work for the current phase with amplitude `sample`.
    /// Returns the phase after the step.
    pub fn tick(&mut self, sample: u16) -> BroadcastState {
        match self.state {
            BroadcastState::Measuring => self.tick_measuring(sample),
            BroadcastState::Testing => self.tick_testing(sample),
            BroadcastState::Broadcasting => self.tick_broadcasting(sample),
            BroadcastState::Halted => {}
        }
        self.state
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Current phase.
    #[inline]
    pub fn state(&self) -> BroadcastState {
        self.state
    }

    /// Periods per sample while BROADCASTING (0 before TESTING).
    #[inline]
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    /// Periods in the next timed burst.
    #[inline]
    pub fn periods(&self) -> u32 {
        self.periods
    }

    /// Station frequency aimed at: the configured one until matching, then
    /// the matched carrier.
    #[inline]
    pub fn desired_hz(&self) -> f32 {
        self.desired_hz
    }

    /// Matching result, once MEASURING is over.
    #[inline]
    pub fn best_match(&self) -> Option<&BestMatch> {
        self.best.as_ref()
    }

    /// TESTING outcome, once available.
    #[inline]
    pub fn report(&self) -> Option<&BroadcastReport> {
        self.report.as_ref()
    }

    /// Delay-line state.
    #[inline]
    pub fn delay_line(&self) -> &InstructionBuffer<N> {
        &self.line
    }

    /// Recorded sweep.
    #[inline]
    pub fn calibration(&self) -> &CalibrationEngine<N> {
        &self.engine
    }

    /// Output device.
    #[inline]
    pub fn dac(&self) -> &O {
        &self.dac
    }

    /// Clock.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // --- Private methods ---

    #[inline]
    fn send(&mut self, sample: u16, periods: u32) {
        for _ in 0..periods {
            self.emitter.transmit(&mut self.dac, &self.line, sample);
        }
    }

    /// Time `self.periods` periods back to back.
    fn timed_burst(&mut self, sample: u16) -> u32 {
        let start = self.clock.now_us();
        self.send(sample, self.periods);
        let end = self.clock.now_us();
        end.wrapping_sub(start)
    }

    fn tick_measuring(&mut self, sample: u16) {
        let position = self.engine.position();
        let elapsed_us = self.timed_burst(sample);
        crate::rt_trace!(
            self.log,
            self.clock.now_us(),
            "pos {}: {} us / {} periods",
            position,
            elapsed_us,
            self.periods
        );

        if self.engine.record_and_advance(&mut self.line, elapsed_us) {
            self.finish_measuring();
        }
    }

    fn finish_measuring(&mut self) {
        let now = self.clock.now_us();
        match find_best_match(self.engine.record(), &self.bands, self.periods) {
            Ok(best) => {
                self.line.set_return_position(best.position);
                // Table index comes from iterating this table, always present.
                self.desired_hz = self.bands.carrier(best.target_index).unwrap_or(self.desired_hz);
                self.best = Some(best);
                self.periods = self.config.confirm_periods;
                self.state = BroadcastState::Testing;
                crate::rt_info!(
                    self.log,
                    now,
                    "Matched pos {} -> {:.0} Hz (achieved {:.1}, error {:.1})",
                    best.position,
                    self.desired_hz,
                    best.achieved_hz,
                    best.error_hz
                );
            }
            Err(e) => {
                self.fault
                    .set(FaultCode::CalibrationDiverged, self.engine.record().len() as u32);
                self.state = BroadcastState::Halted;
                crate::rt_error!(self.log, now, "{}: {}", self.fault.snapshot(), e);
            }
        }
    }

    fn tick_testing(&mut self, sample: u16) {
        let elapsed_us = self.timed_burst(sample);
        let now = self.clock.now_us();

        if elapsed_us == 0 {
            self.fault.set(FaultCode::ClockStalled, self.periods);
            self.state = BroadcastState::Halted;
            crate::rt_error!(self.log, now, "{}: no clock tick in TESTING", self.fault.snapshot());
            return;
        }

        let measured_hz = achieved_frequency(self.periods, elapsed_us);
        let target_hz = self.desired_hz - self.config.half_sample_rate();
        self.repeat_count = repeat_count_for(measured_hz, self.config.sample_rate);
        self.periods = self.repeat_count;

        let report = BroadcastReport {
            measured_hz,
            carrier_hz: self.desired_hz,
            target_hz,
            error_hz: measured_hz - target_hz,
            repeat_count: self.repeat_count,
        };
        crate::rt_info!(self.log, now, "{}", report);
        if self.repeat_count == 0 {
            crate::rt_warn!(self.log, now, "Repeat count is 0, carrier will stay silent");
        }

        self.report = Some(report);
        self.state = BroadcastState::Broadcasting;
    }

    #[inline]
    fn tick_broadcasting(&mut self, sample: u16) {
        self.send(sample, self.repeat_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_count_rounds_to_nearest() {
        // 0.5 * 558000 / 22050 = 12.65
        assert_eq!(repeat_count_for(558_000.0, 22_050), 13);
        // 0.5 * 551250 / 22050 = 12.5
        assert_eq!(repeat_count_for(551_250.0, 22_050), 13);
        // 0.5 * 540000 / 22050 = 12.24
        assert_eq!(repeat_count_for(540_000.0, 22_050), 12);
        assert_eq!(repeat_count_for(10_000.0, 22_050), 0);
    }

    #[test]
    fn test_repeat_count_saturates() {
        assert_eq!(repeat_count_for(f32::INFINITY, 22_050), u32::MAX);
        assert_eq!(repeat_count_for(f32::NAN, 22_050), 0);
    }

    #[test]
    fn test_report_line() {
        let report = BroadcastReport {
            measured_hz: 547_000.0,
            carrier_hz: 558_000.0,
            target_hz: 546_975.0,
            error_hz: 25.0,
            repeat_count: 12,
        };
        let mut buf = [0u8; 120];
        let len = crate::logging::format_to_buffer(&mut buf, format_args!("{}", report));
        assert_eq!(
            core::str::from_utf8(&buf[..len]).unwrap(),
            "Broadcast: measured=547000.0, desired=558000.0 (546975.0), error=25.0, final periods=12"
        );
    }
}
