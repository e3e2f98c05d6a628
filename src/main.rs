//! RustMwBeacon - Main entry point
//!
//! 1. Bring up UART log, DAC1, ADC1 and the status LED
//! 2. Build the controller (calibration starts on the first tick)
//! 3. Loop forever: station tick, then drain the log to UART
//!
//! The loop never yields. Calibration and the carrier both depend on the
//! core running nothing else, so sdkconfig.defaults takes the idle task off
//! the task watchdog.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;

    use rust_mw_beacon::{
        config::{CONFIG, MAX_SLOTS, MW_CARRIERS},
        hal::{gpio::StatusLeds, Esp32Adc, Esp32Dac, EspTimerClock, MonotonicClock, StatusLedConfig},
        uart_logger::{UartLogger, UartLoggerConfig},
        BroadcastController, FaultState, Station, RT_LOG_STREAM,
    };

    static FAULT_STATE: FaultState = FaultState::new();

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let peripherals = Peripherals::take().expect("peripherals already taken");
        let mut logger = UartLogger::new(
            peripherals.uart0,
            peripherals.pins.gpio1,
            &UartLoggerConfig::default(),
        )
        .expect("UART0 log init failed");

        let mut clock = EspTimerClock;
        rust_mw_beacon::rt_info!(RT_LOG_STREAM, clock.now_us(), "{}", env!("VERSION_STRING"));

        let controller = match BroadcastController::<_, _, MAX_SLOTS>::new(
            Esp32Dac::new(),
            EspTimerClock,
            CONFIG,
            &MW_CARRIERS,
            &RT_LOG_STREAM,
            &FAULT_STATE,
        ) {
            Ok(controller) => controller,
            Err(e) => {
                rust_mw_beacon::rt_error!(RT_LOG_STREAM, clock.now_us(), "Config rejected: {}", e);
                logger.drain(&RT_LOG_STREAM, clock.now_us());
                loop {
                    unsafe {
                        esp_idf_sys::vTaskDelay(1000);
                    }
                }
            }
        };

        // SAFETY: the LED pins are not handed to any other driver.
        let leds = unsafe { StatusLeds::from_config(&StatusLedConfig::default()) }
            .expect("status LED init failed");

        let mut station = Station::new(Esp32Adc::new(CONFIG.adc_channel), controller, leds);

        loop {
            station.tick();
            logger.drain(&RT_LOG_STREAM, clock.now_us());
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "beacon is ESP32 firmware; build it with `cargo build --release --target xtensa-esp32-espidf`"
    );
    std::process::exit(1);
}
