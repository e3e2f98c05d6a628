//! Non-blocking log ring for RustMwBeacon.
//!
//! ```text
//! control loop                 LogStream                 between ticks
//! ────────────                 ─────────                 ─────────────
//! rt_info!(..) ─format─▶ [e0][e1][e2]..[eN-1] ─drain─▶ uart_logger (UART0)
//!  stack buffer            fixed, no alloc              may block
//! ```
//!
//! A timed burst must not be disturbed by I/O, so the loop only formats into
//! a stack buffer and copies the bytes into the ring. The UART side drains
//! between ticks. A full ring drops the new entry and counts it.
//!
//! Levels above [`MAX_LEVEL`] are filtered inside the macros before anything
//! is formatted or timestamped.

use core::cell::UnsafeCell;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicU32, Ordering};

/// Bytes kept per message; longer messages are cut.
pub const MAX_MSG_LEN: usize = 120;

/// Entries in the default ring.
pub const LOG_BUFFER_SIZE: usize = 256;

/// Most verbose level that is recorded. Per-position sweep lines are trace,
/// kept in debug builds only.
pub const MAX_LEVEL: LogLevel = if cfg!(debug_assertions) {
    LogLevel::Trace
} else {
    LogLevel::Info
};

/// Severity, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Tag printed in front of the message.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// True if this level passes [`MAX_LEVEL`].
    #[inline(always)]
    pub const fn enabled(self) -> bool {
        self as u8 <= MAX_LEVEL as u8
    }
}

/// One message in the ring.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Clock reading in microseconds (wrapping, same clock as calibration).
    pub timestamp_us: u32,
    pub level: LogLevel,
    /// Bytes used in `msg`.
    pub len: u8,
    /// Message bytes, not NUL-terminated.
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, or `<invalid utf8>` if the cut split a character.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Single-producer single-consumer ring of [`LogEntry`].
///
/// `head` counts entries ever pushed, `tail` entries ever drained; both
/// wrap, and `head - tail` is the fill level. Slot index is the counter
/// masked by `N - 1`, so `N` must be a power of two.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: UnsafeCell<[LogEntry; N]>,
    head: AtomicU32,
    tail: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: one producer, one consumer. The producer only writes slots in
// [head, tail + N), the consumer only reads slots in [tail, head), and each
// side publishes its counter after touching the slot.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            slots: UnsafeCell::new([LogEntry::EMPTY; N]),
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    #[inline(always)]
    const fn slot(counter: u32) -> usize {
        counter as usize & (N - 1)
    }

    /// Queue a message, cut to [`MAX_MSG_LEN`]. Returns `false` and counts a
    /// drop if the ring is full.
    #[inline]
    pub fn push(&self, timestamp_us: u32, level: LogLevel, msg: &[u8]) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        if head.wrapping_sub(self.tail.load(Ordering::Acquire)) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let len = msg.len().min(MAX_MSG_LEN);
        // SAFETY: slot is outside [tail, head), the consumer cannot see it
        // until `head` moves.
        let entry = unsafe { &mut (*self.slots.get())[Self::slot(head)] };
        entry.timestamp_us = timestamp_us;
        entry.level = level;
        entry.len = len as u8;
        entry.msg[..len].copy_from_slice(&msg[..len]);

        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry, if any.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: slot is inside [tail, head), published by the producer.
        let entry = unsafe { (*self.slots.get())[Self::slot(tail)] };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Messages dropped since the last [`reset_dropped`](Self::reset_dropped).
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }

    /// Entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Relaxed))
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` over a byte slice that silently stops at the end.
struct Truncating<'a> {
    out: &'a mut [u8],
    used: usize,
}

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = &mut self.out[self.used..];
        let n = s.len().min(room.len());
        room[..n].copy_from_slice(&s.as_bytes()[..n]);
        self.used += n;
        Ok(())
    }
}

/// Format `args` into `buf`, cutting at the end of `buf`. Returns the number
/// of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    let mut w = Truncating { out: buf, used: 0 };
    // Truncating never fails; a Display impl error just ends the line early.
    let _ = w.write_fmt(args);
    w.used
}

/// Log at `level` to `stream`, stamped `timestamp`.
///
/// Neither the message nor the timestamp is evaluated when `level` is
/// filtered out.
///
/// ```ignore
/// rt_log!(LogLevel::Info, RT_LOG_STREAM, clock.now_us(), "pos {} -> {} us", pos, elapsed);
/// ```
#[macro_export]
macro_rules! rt_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)+) => {{
        let level: $crate::logging::LogLevel = $level;
        if level.enabled() {
            let mut line = [0u8; $crate::logging::MAX_MSG_LEN];
            let n = $crate::logging::format_to_buffer(&mut line, format_args!($($arg)+));
            $stream.push($timestamp, level, &line[..n]);
        }
    }};
}

/// [`rt_log!`] at `Error`.
#[macro_export]
macro_rules! rt_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)+) => {
        $crate::rt_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)+)
    };
}

/// [`rt_log!`] at `Warn`.
#[macro_export]
macro_rules! rt_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)+) => {
        $crate::rt_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)+)
    };
}

/// [`rt_log!`] at `Info`.
#[macro_export]
macro_rules! rt_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)+) => {
        $crate::rt_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)+)
    };
}

/// [`rt_log!`] at `Debug`.
#[macro_export]
macro_rules! rt_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)+) => {
        $crate::rt_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)+)
    };
}

/// [`rt_log!`] at `Trace`.
#[macro_export]
macro_rules! rt_trace {
    ($stream:expr, $timestamp:expr, $($arg:tt)+) => {
        $crate::rt_log!($crate::logging::LogLevel::Trace, $stream, $timestamp, $($arg)+)
    };
}
