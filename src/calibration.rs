//! Delay-line calibration and carrier matching.
//!
//! # MEASURING
//!
//! [`CalibrationEngine`] walks the return through positions
//! `1..=N-2`, one position per controller tick. At each position the
//! controller times a burst of periods and hands the elapsed microseconds
//! back; the engine records it and moves the return one slot further.
//! Every position is measured exactly once, in increasing order.
//!
//! # Matching
//!
//! [`find_best_match`] turns each recording into an achieved frequency and
//! compares it to every target in the table. The pair with the smallest
//! absolute error wins; only a strict improvement replaces the current best,
//! so on a tie the earlier position (then the earlier target) is kept. The
//! search starts with the first target's magnitude as the error to beat.

use crate::config::FrequencyTable;
use crate::delay::DelayLine;

/// First position measured. Slot 0 holds the return at power-up.
pub const FIRST_CANDIDATE: usize = 1;

/// Periods per second for `periods` periods timed at `elapsed_us`.
///
/// `elapsed_us == 0` yields infinity, which never wins a comparison.
#[inline]
pub fn achieved_frequency(periods: u32, elapsed_us: u32) -> f32 {
    periods as f32 * 1_000_000.0 / elapsed_us as f32
}

#[inline]
fn abs(x: f32) -> f32 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}

/// Elapsed time per delay-line position.
#[derive(Clone, Debug)]
pub struct MeasurementRecord<const N: usize = { crate::config::MAX_SLOTS }> {
    elapsed_us: [Option<u32>; N],
}

impl<const N: usize> MeasurementRecord<N> {
    /// Empty record.
    pub const fn new() -> Self {
        Self {
            elapsed_us: [None; N],
        }
    }

    /// Store the time for `position`.
    ///
    /// # Panics
    ///
    /// If `position >= N`.
    #[inline]
    pub fn insert(&mut self, position: usize, elapsed_us: u32) {
        self.elapsed_us[position] = Some(elapsed_us);
    }

    /// Time recorded for `position`, if any.
    #[inline]
    pub fn get(&self, position: usize) -> Option<u32> {
        self.elapsed_us.get(position).copied().flatten()
    }

    /// Recorded `(position, elapsed_us)` pairs in increasing position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.elapsed_us
            .iter()
            .enumerate()
            .filter_map(|(p, e)| e.map(|e| (p, e)))
    }

    /// Number of recorded positions.
    pub fn len(&self) -> usize {
        self.elapsed_us.iter().filter(|e| e.is_some()).count()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for MeasurementRecord<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Winning delay-line position and carrier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestMatch {
    /// Return position that produced the match.
    pub position: usize,
    /// Index into the frequency table.
    pub target_index: usize,
    /// Frequency measured at `position`, in Hz.
    pub achieved_hz: f32,
    /// `|achieved_hz - target|`, in Hz.
    pub error_hz: f32,
}

/// Matching failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationError {
    /// No position was measured, or the table is empty.
    NoMeasurements,
    /// Every candidate missed every target by at least `bound_hz`.
    NoCandidateWithinBound { bound_hz: f32 },
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoMeasurements => write!(f, "no measurements to match"),
            Self::NoCandidateWithinBound { bound_hz } => {
                write!(f, "no position within {:.0} Hz of any carrier", bound_hz)
            }
        }
    }
}

/// Pick the (position, target) pair with the smallest frequency error.
///
/// Scan order is position-major, target-minor; first strict improvement wins.
pub fn find_best_match<const N: usize>(
    record: &MeasurementRecord<N>,
    table: &FrequencyTable<'_>,
    periods: u32,
) -> Result<BestMatch, CalibrationError> {
    let bound_hz = match table.target(0) {
        Some(first) if !record.is_empty() => abs(first),
        _ => return Err(CalibrationError::NoMeasurements),
    };

    let mut best_error = bound_hz;
    let mut best: Option<BestMatch> = None;

    for (position, elapsed_us) in record.iter() {
        let achieved_hz = achieved_frequency(periods, elapsed_us);
        for (target_index, target) in table.targets().enumerate() {
            let error_hz = abs(achieved_hz - target);
            if error_hz < best_error {
                best_error = error_hz;
                best = Some(BestMatch {
                    position,
                    target_index,
                    achieved_hz,
                    error_hz,
                });
            }
        }
    }

    best.ok_or(CalibrationError::NoCandidateWithinBound { bound_hz })
}

/// Position sweep state for the MEASURING phase.
pub struct CalibrationEngine<const N: usize = { crate::config::MAX_SLOTS }> {
    position: usize,
    record: MeasurementRecord<N>,
}

impl<const N: usize> CalibrationEngine<N> {
    /// Create engine at the first candidate position.
    pub const fn new() -> Self {
        Self {
            position: FIRST_CANDIDATE,
            record: MeasurementRecord::new(),
        }
    }

    /// Position the return stops at; never measured.
    #[inline]
    pub const fn limit() -> usize {
        N - 1
    }

    /// Put the return on the first candidate.
    pub fn begin<D: DelayLine + ?Sized>(&mut self, line: &mut D) {
        self.position = FIRST_CANDIDATE;
        line.set_return_position(self.position);
    }

    /// Position the next measurement is for.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// True once every candidate has been measured.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.position >= Self::limit()
    }

    /// Record the burst timed at the current position and move the return
    /// one slot on. Returns `true` when the sweep has reached the limit.
    pub fn record_and_advance<D: DelayLine + ?Sized>(&mut self, line: &mut D, elapsed_us: u32) -> bool {
        if self.is_complete() {
            return true;
        }
        self.record.insert(self.position, elapsed_us);
        self.position += 1;
        line.set_return_position(self.position);
        self.is_complete()
    }

    /// Everything measured so far.
    #[inline]
    pub fn record(&self) -> &MeasurementRecord<N> {
        &self.record
    }
}

impl<const N: usize> Default for CalibrationEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::InstructionBuffer;

    #[test]
    fn test_achieved_frequency() {
        assert_eq!(achieved_frequency(1000, 1_000_000), 1000.0);
        assert_eq!(achieved_frequency(100_000, 200_000), 500_000.0);
        assert!(achieved_frequency(10, 0).is_infinite());
    }

    #[test]
    fn test_sweep_visits_each_candidate_once() {
        let mut line = InstructionBuffer::<6>::new();
        let mut engine = CalibrationEngine::<6>::new();
        engine.begin(&mut line);
        assert_eq!(line.return_position(), 1);

        let mut visited = Vec::new();
        loop {
            visited.push(engine.position());
            let done = engine.record_and_advance(&mut line, 100 * engine.position() as u32);
            if done {
                break;
            }
        }

        assert_eq!(visited, vec![1, 2, 3, 4]);
        assert_eq!(line.return_position(), 5);
        assert_eq!(engine.record().len(), 4);
        assert_eq!(engine.record().get(0), None);
        assert_eq!(engine.record().get(4), Some(400));
        assert_eq!(engine.record().get(5), None);
    }

    #[test]
    fn test_record_after_completion_is_ignored() {
        let mut line = InstructionBuffer::<3>::new();
        let mut engine = CalibrationEngine::<3>::new();
        engine.begin(&mut line);
        assert!(engine.record_and_advance(&mut line, 7));
        assert!(engine.record_and_advance(&mut line, 9));
        assert_eq!(engine.record().len(), 1);
        assert_eq!(line.return_position(), 2);
    }

    #[test]
    fn test_empty_record_is_an_error() {
        let record = MeasurementRecord::<4>::new();
        let table = FrequencyTable::with_shift(&[1000.0], 0.0);
        assert_eq!(
            find_best_match(&record, &table, 1000),
            Err(CalibrationError::NoMeasurements)
        );
    }
}
