//! Outer control loop.
//!
//! One thread, no interrupts, no preemption. Each [`Station::tick`]:
//!
//! 1. advances the ADC sampler by at most one state
//! 2. runs one controller unit of work with the latched sample
//! 3. updates the status LED if the phase changed
//!
//! The sampler never waits for the controller and the controller never waits
//! for a fresh sample.

use crate::broadcast::{BroadcastController, BroadcastState};
use crate::hal::{AnalogIn, AnalogOut, MonotonicClock, StatusIndicator};
use crate::sampler::AnalogSampler;

/// Everything the main loop drives.
pub struct Station<'a, I, O, C, S, const N: usize = { crate::config::MAX_SLOTS }>
where
    I: AnalogIn,
    O: AnalogOut,
    C: MonotonicClock,
    S: StatusIndicator,
{
    adc: I,
    sampler: AnalogSampler,
    controller: BroadcastController<'a, O, C, N>,
    status: S,
    shown: Option<BroadcastState>,
}

impl<'a, I, O, C, S, const N: usize> Station<'a, I, O, C, S, N>
where
    I: AnalogIn,
    O: AnalogOut,
    C: MonotonicClock,
    S: StatusIndicator,
{
    /// Wire up a station and show the initial phase.
    ///
    /// The sampler reads the ADC channel named in the controller's config.
    pub fn new(adc: I, controller: BroadcastController<'a, O, C, N>, mut status: S) -> Self {
        let state = controller.state();
        status.show(state);
        Self {
            adc,
            sampler: AnalogSampler::new(controller.config().adc_channel),
            controller,
            status,
            shown: Some(state),
        }
    }

    /// One loop iteration. Returns the controller phase afterwards.
    #[inline]
    pub fn tick(&mut self) -> BroadcastState {
        self.sampler.tick(&mut self.adc);
        let state = self.controller.tick(self.sampler.value());

        if self.shown != Some(state) {
            self.status.show(state);
            self.shown = Some(state);
        }
        state
    }

    /// Run until the controller reaches `target` or `max_ticks` elapse.
    /// Returns the number of ticks taken, or `None` on timeout.
    pub fn run_until(&mut self, target: BroadcastState, max_ticks: u32) -> Option<u32> {
        for n in 1..=max_ticks {
            if self.tick() == target {
                return Some(n);
            }
        }
        None
    }

    /// The sampler.
    #[inline]
    pub fn sampler(&self) -> &AnalogSampler {
        &self.sampler
    }

    /// The controller.
    #[inline]
    pub fn controller(&self) -> &BroadcastController<'a, O, C, N> {
        &self.controller
    }

    /// The status indicator.
    #[inline]
    pub fn status(&self) -> &S {
        &self.status
    }

    /// The ADC.
    #[inline]
    pub fn adc(&self) -> &I {
        &self.adc
    }
}
