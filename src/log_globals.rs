//! Global log stream instance.
//!
//! The beacon runs one cooperative loop, so one stream suffices: the loop
//! produces, the UART drain between ticks consumes.

use crate::logging::LogStream;

/// Log stream for the control loop.
pub static RT_LOG_STREAM: LogStream = LogStream::new();
