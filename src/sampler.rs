//! Non-blocking ADC sampler.
//!
//! A blocking analog read would stall the one loop that also has to keep the
//! carrier going, so the conversion is walked through one state per tick:
//!
//! ```text
//! Idle ──start──▶ Started ──!active──▶ Waiting ──complete──▶ Done ──latch──▶ Idle
//!                   ▲   │                ▲   │
//!                   └───┘ active         └───┘ !complete
//! ```
//!
//! The latched value is read, never consumed, by the emitter. It may be
//! several ticks old; transmission never waits for a fresh sample.
//!
//! There is no timeout. A converter whose flags never change holds the
//! sampler in `Started` or `Waiting` forever and the emitter keeps sending the
//! last latched value.

use crate::hal::AnalogIn;

/// Sampler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerState {
    /// Next tick starts a conversion.
    Idle,
    /// Conversion requested, converter still busy.
    Started,
    /// Converter idle, result not yet flagged complete.
    Waiting,
    /// Result ready, next tick latches it.
    Done,
}

/// ADC polling state machine.
pub struct AnalogSampler {
    state: SamplerState,
    channel: u8,
    value: u16,
    latched: u32,
}

impl AnalogSampler {
    /// Create sampler for `channel`, idle, latched value 0.
    pub const fn new(channel: u8) -> Self {
        Self {
            state: SamplerState::Idle,
            channel,
            value: 0,
            latched: 0,
        }
    }

    /// Advance at most one state. Returns the state after the step.
    ///
    /// Never blocks: each arm does one register poll or write.
    #[inline]
    pub fn tick<A: AnalogIn + ?Sized>(&mut self, adc: &mut A) -> SamplerState {
        self.state = match self.state {
            SamplerState::Idle => {
                adc.start_conversion(self.channel);
                SamplerState::Started
            }
            SamplerState::Started => {
                if adc.is_conversion_active() {
                    SamplerState::Started
                } else {
                    SamplerState::Waiting
                }
            }
            SamplerState::Waiting => {
                if adc.is_conversion_complete() {
                    SamplerState::Done
                } else {
                    SamplerState::Waiting
                }
            }
            SamplerState::Done => {
                self.value = adc.read_result();
                self.latched = self.latched.wrapping_add(1);
                SamplerState::Idle
            }
        };
        self.state
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Last latched sample.
    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Number of samples latched since creation (wraps).
    #[inline]
    pub fn latched_count(&self) -> u32 {
        self.latched
    }

    /// Configured ADC channel.
    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }
}
