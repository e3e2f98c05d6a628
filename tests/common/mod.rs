//! Test doubles for the HAL traits.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use rust_mw_beacon::broadcast::BroadcastState;
use rust_mw_beacon::delay::DelayLine;
use rust_mw_beacon::hal::{AnalogIn, AnalogOut, MonotonicClock, StatusIndicator};

/// DAC that records every level written.
pub struct RecordingDac {
    pub writes: Vec<u16>,
    counter: Rc<Cell<usize>>,
}

impl RecordingDac {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            counter: Rc::new(Cell::new(0)),
        }
    }
}

impl AnalogOut for RecordingDac {
    fn write_sample(&mut self, level: u16) {
        self.writes.push(level);
        self.counter.set(self.counter.get() + 1);
    }
}

/// Clock that only moves across a burst.
///
/// Each read that sees new DAC writes since the previous read advances time
/// by the next scripted elapsed value (0 once the script runs out). Reads
/// with no writes in between (burst start, log timestamps) return the same
/// time, so the script lines up with bursts, not with clock reads.
pub struct BurstClock {
    now: u32,
    seen: usize,
    counter: Rc<Cell<usize>>,
    script: VecDeque<u32>,
    pub reads: u32,
}

impl MonotonicClock for BurstClock {
    fn now_us(&mut self) -> u32 {
        self.reads += 1;
        let writes = self.counter.get();
        if writes != self.seen {
            self.seen = writes;
            let step = self.script.pop_front().unwrap_or(0);
            self.now = self.now.wrapping_add(step);
        }
        self.now
    }
}

/// DAC and clock sharing a write counter; `elapsed` is consumed one value
/// per timed burst.
pub fn burst_rig(elapsed: &[u32]) -> (RecordingDac, BurstClock) {
    burst_rig_at(0, elapsed)
}

/// Same as [`burst_rig`] with the clock starting at `start_us`.
pub fn burst_rig_at(start_us: u32, elapsed: &[u32]) -> (RecordingDac, BurstClock) {
    let dac = RecordingDac::new();
    let clock = BurstClock {
        now: start_us,
        seen: 0,
        counter: Rc::clone(&dac.counter),
        script: elapsed.iter().copied().collect(),
        reads: 0,
    };
    (dac, clock)
}

/// Delay line that counts invocations instead of burning time.
pub struct CountingDelay {
    pub position: usize,
    pub capacity: usize,
    pub invocations: Cell<usize>,
}

impl CountingDelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            position: 0,
            capacity,
            invocations: Cell::new(0),
        }
    }
}

impl DelayLine for CountingDelay {
    fn capacity(&self) -> usize {
        self.capacity
    }
    fn return_position(&self) -> usize {
        self.position
    }
    fn set_return_position(&mut self, position: usize) {
        assert!(position < self.capacity);
        self.position = position;
    }
    fn invoke(&self) -> usize {
        self.invocations.set(self.invocations.get() + 1);
        self.position
    }
}

/// Register-level call made on the ADC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcCall {
    Start(u8),
    Active,
    Complete,
    Read,
}

/// ADC whose busy and complete flags follow a script.
///
/// After each start, `is_conversion_active` reports busy for `busy_polls`
/// polls and `is_conversion_complete` reports not-done for `pending_polls`
/// polls. Results are handed out in order, the last one repeating.
pub struct ScriptedAdc {
    pub calls: Vec<AdcCall>,
    busy_polls: u32,
    pending_polls: u32,
    busy_left: u32,
    pending_left: u32,
    results: VecDeque<u16>,
    last: u16,
}

impl ScriptedAdc {
    pub fn new(busy_polls: u32, pending_polls: u32, results: &[u16]) -> Self {
        Self {
            calls: Vec::new(),
            busy_polls,
            pending_polls,
            busy_left: 0,
            pending_left: 0,
            results: results.iter().copied().collect(),
            last: 0,
        }
    }

    /// Never busy, always complete.
    pub fn instant(results: &[u16]) -> Self {
        Self::new(0, 0, results)
    }

    /// Busy flag that never clears.
    pub fn stuck_busy() -> Self {
        Self::new(u32::MAX, 0, &[])
    }

    /// Complete flag that never sets.
    pub fn stuck_pending() -> Self {
        Self::new(0, u32::MAX, &[])
    }
}

impl AnalogIn for ScriptedAdc {
    fn start_conversion(&mut self, channel: u8) {
        self.calls.push(AdcCall::Start(channel));
        self.busy_left = self.busy_polls;
        self.pending_left = self.pending_polls;
    }

    fn is_conversion_active(&mut self) -> bool {
        self.calls.push(AdcCall::Active);
        if self.busy_left > 0 {
            self.busy_left -= 1;
            true
        } else {
            false
        }
    }

    fn is_conversion_complete(&mut self) -> bool {
        self.calls.push(AdcCall::Complete);
        if self.pending_left > 0 {
            self.pending_left -= 1;
            false
        } else {
            true
        }
    }

    fn read_result(&mut self) -> u16 {
        self.calls.push(AdcCall::Read);
        if let Some(v) = self.results.pop_front() {
            self.last = v;
        }
        self.last
    }
}

/// Status indicator that records every phase shown.
#[derive(Default)]
pub struct RecordingStatus {
    pub shown: Vec<BroadcastState>,
}

impl StatusIndicator for RecordingStatus {
    fn show(&mut self, state: BroadcastState) {
        self.shown.push(state);
    }
}
