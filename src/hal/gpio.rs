//! GPIO HAL for the RGB status LED.

use crate::broadcast::BroadcastState;

/// RGB status LED pin configuration.
pub struct StatusLedConfig {
    pub red_pin: i32,
    pub green_pin: i32,
    pub blue_pin: i32,
    pub active_low: bool,
}

impl Default for StatusLedConfig {
    fn default() -> Self {
        Self {
            red_pin: 16,
            green_pin: 17,
            blue_pin: 18,
            active_low: true,
        }
    }
}

/// LED channels lit for a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusColor {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl StatusColor {
    /// Red: measuring. Cyan: testing. Green: on air. Magenta: halted.
    pub const fn for_state(state: BroadcastState) -> Self {
        match state {
            BroadcastState::Measuring => Self { red: true, green: false, blue: false },
            BroadcastState::Testing => Self { red: false, green: true, blue: true },
            BroadcastState::Broadcasting => Self { red: false, green: true, blue: false },
            BroadcastState::Halted => Self { red: true, green: false, blue: true },
        }
    }
}

#[cfg(target_os = "espidf")]
pub use self::esp::StatusLeds;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::hal::gpio::{AnyOutputPin, Level, Output, PinDriver};
    use esp_idf_svc::sys::EspError;

    use super::{StatusColor, StatusLedConfig};
    use crate::broadcast::BroadcastState;
    use crate::hal::StatusIndicator;

    /// RGB LED on three GPIOs.
    pub struct StatusLeds<'d> {
        red: PinDriver<'d, AnyOutputPin, Output>,
        green: PinDriver<'d, AnyOutputPin, Output>,
        blue: PinDriver<'d, AnyOutputPin, Output>,
        active_low: bool,
    }

    impl<'d> StatusLeds<'d> {
        /// Take the three pins as outputs, all LEDs off.
        pub fn new(
            red: AnyOutputPin,
            green: AnyOutputPin,
            blue: AnyOutputPin,
            active_low: bool,
        ) -> Result<Self, EspError> {
            let mut leds = Self {
                red: PinDriver::output(red)?,
                green: PinDriver::output(green)?,
                blue: PinDriver::output(blue)?,
                active_low,
            };
            leds.set(StatusColor { red: false, green: false, blue: false });
            Ok(leds)
        }

        /// Take the pins named in `config`.
        ///
        /// # Safety
        ///
        /// The pins must not be owned by any other driver.
        pub unsafe fn from_config(config: &StatusLedConfig) -> Result<Self, EspError> {
            Self::new(
                AnyOutputPin::new(config.red_pin),
                AnyOutputPin::new(config.green_pin),
                AnyOutputPin::new(config.blue_pin),
                config.active_low,
            )
        }

        fn level(&self, on: bool) -> Level {
            if on != self.active_low {
                Level::High
            } else {
                Level::Low
            }
        }

        fn set(&mut self, color: StatusColor) {
            let (r, g, b) = (self.level(color.red), self.level(color.green), self.level(color.blue));
            // A failed LED write is not worth stopping the carrier for.
            let _ = self.red.set_level(r);
            let _ = self.green.set_level(g);
            let _ = self.blue.set_level(b);
        }
    }

    impl StatusIndicator for StatusLeds<'_> {
        fn show(&mut self, state: BroadcastState) {
            self.set(StatusColor::for_state(state));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_colors_are_distinct() {
        let colors = [
            StatusColor::for_state(BroadcastState::Measuring),
            StatusColor::for_state(BroadcastState::Testing),
            StatusColor::for_state(BroadcastState::Broadcasting),
            StatusColor::for_state(BroadcastState::Halted),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
