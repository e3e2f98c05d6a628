//! Latched fault for RustMwBeacon.
//!
//! # Philosophy
//!
//! > A beacon on the wrong frequency is worse than silence.
//!
//! Calibration runs once per boot. When its outcome cannot be trusted the
//! controller latches a fault here and stops transmitting. Nothing clears
//! the latch; a power cycle recalibrates.
//!
//! The first fault wins. Later reports only bump [`FaultState::reports`], so
//! the log can tell a single trip from a controller that kept tripping.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Why the beacon stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// Transmitting normally.
    None = 0,

    /// No delay-line position came within the bound of any carrier.
    /// Data: number of positions measured.
    CalibrationDiverged = 1,

    /// The microsecond clock did not move across a confirmation burst.
    /// Data: periods in the burst.
    ClockStalled = 2,
}

impl FaultCode {
    /// Decode a stored code; unknown values read as `None`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::CalibrationDiverged,
            2 => FaultCode::ClockStalled,
            _ => FaultCode::None,
        }
    }

    /// Short name for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::CalibrationDiverged => "calibration diverged",
            FaultCode::ClockStalled => "clock stalled",
        }
    }
}

impl core::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault latch written by the controller, read by the main loop.
///
/// Atomics so it can live in a `static`. One writer.
pub struct FaultState {
    code: AtomicU8,
    data: AtomicU32,
    reports: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            code: AtomicU8::new(FaultCode::None as u8),
            data: AtomicU32::new(0),
            reports: AtomicU32::new(0),
        }
    }

    /// Report a fault. Returns `true` if this report was latched, `false`
    /// if an earlier fault already holds the latch.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) -> bool {
        self.reports.fetch_add(1, Ordering::Relaxed);
        if self.is_active() || code == FaultCode::None {
            return false;
        }
        // Data first: a reader that sees the code sees its data.
        self.data.store(data, Ordering::Relaxed);
        self.code.store(code as u8, Ordering::Release);
        true
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.code() != FaultCode::None
    }

    /// Latched code, `None` while healthy.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Data that came with the latched code.
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Relaxed)
    }

    /// Faults reported since boot, latched or not.
    #[inline]
    pub fn reports(&self) -> u32 {
        self.reports.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            code: self.code(),
            data: self.data(),
            reports: self.reports(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of the latch for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub code: FaultCode,
    pub data: u32,
    pub reports: u32,
}

impl core::fmt::Display for FaultSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.code {
            FaultCode::None => f.write_str("no fault"),
            code => write!(f, "FAULT {} (data {}, {} reports)", code, self.data, self.reports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_at_boot() {
        let fault = FaultState::new();
        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.reports(), 0);
    }

    #[test]
    fn test_first_fault_wins() {
        let fault = FaultState::new();

        assert!(fault.set(FaultCode::CalibrationDiverged, 78));
        assert!(!fault.set(FaultCode::ClockStalled, 250_000));

        let snap = fault.snapshot();
        assert_eq!(snap.code, FaultCode::CalibrationDiverged);
        assert_eq!(snap.data, 78);
        assert_eq!(snap.reports, 2);
    }

    #[test]
    fn test_none_does_not_latch() {
        let fault = FaultState::new();
        assert!(!fault.set(FaultCode::None, 1));
        assert!(!fault.is_active());
    }

    #[test]
    fn test_code_roundtrip_through_u8() {
        for code in [FaultCode::None, FaultCode::CalibrationDiverged, FaultCode::ClockStalled] {
            assert_eq!(FaultCode::from_u8(code as u8), code);
        }
        assert_eq!(FaultCode::from_u8(200), FaultCode::None);
    }

    #[test]
    fn test_snapshot_display() {
        let fault = FaultState::new();
        fault.set(FaultCode::ClockStalled, 250_000);

        let mut buf = [0u8; 64];
        let len = crate::logging::format_to_buffer(&mut buf, format_args!("{}", fault.snapshot()));
        assert_eq!(&buf[..len], b"FAULT clock stalled (data 250000, 1 reports)");
    }
}
