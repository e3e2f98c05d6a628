//! Waveform emitter.
//!
//! One call to [`WaveformEmitter::transmit`] is one carrier period: DAC
//! writes with a delay-line run after each. The spacing between writes comes
//! from the delay line, not from a timer, so the period is whatever the
//! calibrated return position makes it.

use crate::delay::DelayLine;
use crate::hal::AnalogOut;

/// Shape of one period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WaveformMode {
    /// `value`, `0`: two writes, two delays.
    #[default]
    Square,
    /// `0`, `value/2`, `value`, `value/2`: a four-point sampled sine,
    /// four writes, four delays.
    Sine,
}

impl WaveformMode {
    /// DAC writes (and delay-line runs) per period.
    #[inline]
    pub const fn writes_per_period(self) -> usize {
        match self {
            WaveformMode::Square => 2,
            WaveformMode::Sine => 4,
        }
    }
}

/// Emits carrier periods amplitude-scaled by the current sample.
#[derive(Clone, Copy, Debug)]
pub struct WaveformEmitter {
    mode: WaveformMode,
}

impl WaveformEmitter {
    /// Create emitter for the given waveform.
    pub const fn new(mode: WaveformMode) -> Self {
        Self { mode }
    }

    /// Configured waveform.
    #[inline]
    pub fn mode(&self) -> WaveformMode {
        self.mode
    }

    /// Emit one period at amplitude `value`.
    ///
    /// Hot path: no branches beyond the mode match, no error handling. The
    /// DAC write is fire-and-forget.
    #[inline(always)]
    pub fn transmit<O, D>(&self, dac: &mut O, line: &D, value: u16)
    where
        O: AnalogOut + ?Sized,
        D: DelayLine + ?Sized,
    {
        match self.mode {
            WaveformMode::Square => {
                dac.write_sample(value);
                line.invoke();
                dac.write_sample(0);
                line.invoke();
            }
            WaveformMode::Sine => {
                let half = value >> 1;
                dac.write_sample(0);
                line.invoke();
                dac.write_sample(half);
                line.invoke();
                dac.write_sample(value);
                line.invoke();
                dac.write_sample(half);
                line.invoke();
            }
        }
    }
}

impl Default for WaveformEmitter {
    fn default() -> Self {
        Self::new(WaveformMode::default())
    }
}
