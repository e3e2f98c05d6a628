//! UART log output.
//!
//! Drains the log stream to UART0, which the devkit's USB bridge carries to
//! the host serial monitor at 115200 baud.
//!
//! ```text
//! ESP32 GPIO1 (U0TXD) ──────▶ CP2102 / CH340 on the devkit
//!                              └─▶ PC Serial Monitor
//! ```
//!
//! The drain is called from the main loop between ticks. It writes nothing
//! while the stream is empty, so in steady state it costs one atomic load.

use crate::logging::{LogEntry, LogStream};

/// UART configuration for logging.
pub struct UartLoggerConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
}

impl Default for UartLoggerConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            tx_pin: 1, // GPIO1 - U0TXD, wired to the USB bridge
        }
    }
}

/// Interval between dropped-message reports, in microseconds.
pub const DROPPED_REPORT_INTERVAL_US: u32 = 10_000_000;

/// Format log entry to string.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    crate::logging::format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            entry.message()
        ),
    )
}

/// Decides when the dropped counter is reported.
pub struct DroppedReporter {
    last_report_us: u32,
}

impl DroppedReporter {
    pub const fn new() -> Self {
        Self { last_report_us: 0 }
    }

    /// If the interval has passed and `stream` dropped messages, format a
    /// warning into `buf`, reset the counter and return its length.
    pub fn poll<const N: usize>(&mut self, stream: &LogStream<N>, now_us: u32, buf: &mut [u8]) -> Option<usize> {
        if now_us.wrapping_sub(self.last_report_us) < DROPPED_REPORT_INTERVAL_US {
            return None;
        }
        self.last_report_us = now_us;

        let dropped = stream.dropped();
        if dropped == 0 {
            return None;
        }
        stream.reset_dropped();
        Some(crate::logging::format_to_buffer(
            buf,
            format_args!("[WARN] Dropped: {}\n", dropped),
        ))
    }
}

impl Default for DroppedReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
pub use self::esp::UartLogger;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::gpio;
    use esp_idf_svc::hal::peripheral::Peripheral;
    use esp_idf_svc::hal::uart::{self, UartTxDriver};
    use esp_idf_svc::sys::EspError;

    use super::{format_log_entry, DroppedReporter, UartLoggerConfig};
    use crate::logging::LogStream;

    /// TX-only UART draining a log stream.
    pub struct UartLogger<'d> {
        uart: UartTxDriver<'d>,
        dropped: DroppedReporter,
        buf: [u8; 256],
    }

    impl<'d> UartLogger<'d> {
        /// Initialize UART0 TX-only for logging output.
        pub fn new(
            uart: impl Peripheral<P = uart::UART0> + 'd,
            tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
            config: &UartLoggerConfig,
        ) -> Result<Self, EspError> {
            let uart_config = uart::config::Config::default()
                .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

            let uart = UartTxDriver::new(
                uart,
                tx_pin,
                Option::<gpio::AnyIOPin>::None, // CTS
                Option::<gpio::AnyIOPin>::None, // RTS
                &uart_config,
            )?;

            Ok(Self {
                uart,
                dropped: DroppedReporter::new(),
                buf: [0; 256],
            })
        }

        /// Write every pending entry, then the dropped count if due.
        pub fn drain<const N: usize>(&mut self, stream: &LogStream<N>, now_us: u32) {
            while let Some(entry) = stream.drain() {
                let len = format_log_entry(&entry, &mut self.buf);
                let _ = self.uart.write(&self.buf[..len]);
            }

            if let Some(len) = self.dropped.poll(stream, now_us, &mut self.buf) {
                let _ = self.uart.write(&self.buf[..len]);
            }
        }
    }
}
