//! Hardware Abstraction Layer for RustMwBeacon.
//!
//! The core only sees the traits below. ESP32 implementations are thin
//! register-level wrappers, compiled for the `espidf` target only.
//! Business logic stays in core modules, HAL is just I/O.

pub mod gpio;

#[cfg(all(target_os = "espidf", feature = "esp32"))]
pub mod esp32;

#[cfg(all(target_os = "espidf", feature = "esp32"))]
pub use esp32::{Esp32Adc, Esp32Dac, EspTimerClock};

pub use gpio::{StatusColor, StatusLedConfig};

use crate::broadcast::BroadcastState;

/// Analog output (DAC).
pub trait AnalogOut {
    /// Set the output level. Fire-and-forget, constant latency.
    fn write_sample(&mut self, level: u16);
}

/// Analog input (ADC) at register level. Every call is a poll.
pub trait AnalogIn {
    /// Begin one conversion on `channel`.
    fn start_conversion(&mut self, channel: u8);

    /// True while the converter is still busy with the started conversion.
    fn is_conversion_active(&mut self) -> bool;

    /// True once the result register holds the finished conversion.
    fn is_conversion_complete(&mut self) -> bool;

    /// Result of the last finished conversion, full scale = `u16::MAX`.
    fn read_result(&mut self) -> u16;
}

/// Free-running microsecond clock.
pub trait MonotonicClock {
    /// Current time in microseconds. Wraps; callers use `wrapping_sub`.
    fn now_us(&mut self) -> u32;
}

/// Phase indicator (RGB LED on the board).
pub trait StatusIndicator {
    /// Show the controller phase.
    fn show(&mut self, state: BroadcastState);
}

impl<T: AnalogOut + ?Sized> AnalogOut for &mut T {
    #[inline(always)]
    fn write_sample(&mut self, level: u16) {
        (**self).write_sample(level)
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &mut T {
    #[inline]
    fn now_us(&mut self) -> u32 {
        (**self).now_us()
    }
}
