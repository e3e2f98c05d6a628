//! ESP32 analog and timer glue.
//!
//! DAC1 (GPIO25) and SAR ADC1 are driven through their RTC registers
//! directly: the ESP-IDF drivers block on every ADC read and wrap every DAC
//! write in a lock, and neither is acceptable between two delay-line runs.
//! The SENS and RTC_IO blocks are not exposed by esp-idf-sys, so the
//! addresses are hardcoded from the ESP32 technical reference manual
//! (chapters "On-Chip Sensors and Analog Signal Processing" and "RTC IO").

use core::ptr::{read_volatile, write_volatile};

use super::{AnalogIn, AnalogOut, MonotonicClock};

const DR_REG_RTCIO_BASE: usize = 0x3FF4_8400;
const DR_REG_SENS_BASE: usize = 0x3FF4_8800;

const RTC_IO_PAD_DAC1_REG: usize = DR_REG_RTCIO_BASE + 0x84;
const RTC_IO_PDAC1_DAC_SHIFT: u32 = 19;
const RTC_IO_PDAC1_DAC_MASK: u32 = 0xFF << RTC_IO_PDAC1_DAC_SHIFT;
const RTC_IO_PDAC1_XPD_DAC: u32 = 1 << 18;
const RTC_IO_PDAC1_MUX_SEL: u32 = 1 << 17;
const RTC_IO_PDAC1_DAC_XPD_FORCE: u32 = 1 << 10;

const SENS_SAR_READ_CTRL_REG: usize = DR_REG_SENS_BASE;
const SENS_SAR1_DIG_FORCE: u32 = 1 << 27;
const SENS_SAR1_SAMPLE_BIT_SHIFT: u32 = 16;

const SENS_SAR_START_FORCE_REG: usize = DR_REG_SENS_BASE + 0x2C;
const SENS_SAR1_BIT_WIDTH_MASK: u32 = 0b11;

const SENS_SAR_ATTEN1_REG: usize = DR_REG_SENS_BASE + 0x34;

const SENS_SAR_MEAS_WAIT2_REG: usize = DR_REG_SENS_BASE + 0x44;
const SENS_FORCE_XPD_SAR_SHIFT: u32 = 18;

const SENS_SAR_MEAS_START1_REG: usize = DR_REG_SENS_BASE + 0x54;
const SENS_SAR1_EN_PAD_FORCE: u32 = 1 << 31;
const SENS_SAR1_EN_PAD_SHIFT: u32 = 19;
const SENS_SAR1_EN_PAD_MASK: u32 = 0xFFF << SENS_SAR1_EN_PAD_SHIFT;
const SENS_MEAS1_START_FORCE: u32 = 1 << 18;
const SENS_MEAS1_START_SAR: u32 = 1 << 17;
const SENS_MEAS1_DONE_SAR: u32 = 1 << 16;
const SENS_MEAS1_DATA_SAR: u32 = 0xFFFF;

const SENS_SAR_DAC_CTRL2_REG: usize = DR_REG_SENS_BASE + 0x9C;
const SENS_DAC_CW_EN1: u32 = 1 << 24;

/// 12-bit resolution code for bit width and sample bit fields.
const RESOLUTION_12BIT: u32 = 0b11;

/// 11 dB attenuation (full range ~3.3 V).
const ATTEN_11DB: u32 = 0b11;

#[inline(always)]
fn reg_read(addr: usize) -> u32 {
    // SAFETY: `addr` is one of the peripheral registers above.
    unsafe { read_volatile(addr as *const u32) }
}

#[inline(always)]
fn reg_write(addr: usize, value: u32) {
    // SAFETY: `addr` is one of the peripheral registers above.
    unsafe { write_volatile(addr as *mut u32, value) }
}

#[inline(always)]
fn reg_modify(addr: usize, clear: u32, set: u32) {
    reg_write(addr, (reg_read(addr) & !clear) | set);
}

/// DAC channel 1 on GPIO25, 8-bit.
pub struct Esp32Dac {
    _private: (),
}

impl Esp32Dac {
    /// Power DAC1 and route the pad to it.
    ///
    /// Only one instance may exist; the firmware creates it once in `main`.
    pub fn new() -> Self {
        reg_modify(SENS_SAR_DAC_CTRL2_REG, SENS_DAC_CW_EN1, 0);
        reg_modify(
            RTC_IO_PAD_DAC1_REG,
            RTC_IO_PDAC1_DAC_MASK,
            RTC_IO_PDAC1_MUX_SEL | RTC_IO_PDAC1_DAC_XPD_FORCE | RTC_IO_PDAC1_XPD_DAC,
        );
        Self { _private: () }
    }
}

impl AnalogOut for Esp32Dac {
    /// Top 8 bits of `level` go to the DAC.
    #[inline(always)]
    fn write_sample(&mut self, level: u16) {
        let code = (level >> 8) as u32;
        reg_modify(
            RTC_IO_PAD_DAC1_REG,
            RTC_IO_PDAC1_DAC_MASK,
            code << RTC_IO_PDAC1_DAC_SHIFT,
        );
    }
}

/// SAR ADC1 under RTC control, 12-bit, 11 dB.
pub struct Esp32Adc {
    _private: (),
}

impl Esp32Adc {
    /// Power SAR ADC1 and set resolution and attenuation for `channel`.
    ///
    /// Only one instance may exist; the firmware creates it once in `main`.
    pub fn new(channel: u8) -> Self {
        let channel = (channel & 0x07) as u32;

        reg_modify(SENS_SAR_READ_CTRL_REG, SENS_SAR1_DIG_FORCE, 0);
        reg_modify(
            SENS_SAR_READ_CTRL_REG,
            0b11 << SENS_SAR1_SAMPLE_BIT_SHIFT,
            RESOLUTION_12BIT << SENS_SAR1_SAMPLE_BIT_SHIFT,
        );
        reg_modify(SENS_SAR_START_FORCE_REG, SENS_SAR1_BIT_WIDTH_MASK, RESOLUTION_12BIT);
        reg_modify(
            SENS_SAR_ATTEN1_REG,
            0b11 << (channel * 2),
            ATTEN_11DB << (channel * 2),
        );
        reg_modify(
            SENS_SAR_MEAS_WAIT2_REG,
            0b11 << SENS_FORCE_XPD_SAR_SHIFT,
            0b11 << SENS_FORCE_XPD_SAR_SHIFT,
        );
        reg_modify(
            SENS_SAR_MEAS_START1_REG,
            0,
            SENS_SAR1_EN_PAD_FORCE | SENS_MEAS1_START_FORCE,
        );

        Self { _private: () }
    }
}

impl AnalogIn for Esp32Adc {
    fn start_conversion(&mut self, channel: u8) {
        let pad = (1u32 << (channel & 0x07)) << SENS_SAR1_EN_PAD_SHIFT;
        reg_modify(
            SENS_SAR_MEAS_START1_REG,
            SENS_SAR1_EN_PAD_MASK | SENS_MEAS1_START_SAR,
            pad,
        );
        reg_modify(SENS_SAR_MEAS_START1_REG, 0, SENS_MEAS1_START_SAR);
    }

    /// ADC1 has no busy flag; busy means started and not yet done.
    fn is_conversion_active(&mut self) -> bool {
        let r = reg_read(SENS_SAR_MEAS_START1_REG);
        r & SENS_MEAS1_START_SAR != 0 && r & SENS_MEAS1_DONE_SAR == 0
    }

    fn is_conversion_complete(&mut self) -> bool {
        reg_read(SENS_SAR_MEAS_START1_REG) & SENS_MEAS1_DONE_SAR != 0
    }

    /// 12-bit result scaled to full `u16` range.
    fn read_result(&mut self) -> u16 {
        let raw = reg_read(SENS_SAR_MEAS_START1_REG) & SENS_MEAS1_DATA_SAR & 0x0FFF;
        (raw << 4) as u16
    }
}

/// `esp_timer` microsecond clock.
pub struct EspTimerClock;

impl MonotonicClock for EspTimerClock {
    #[inline]
    fn now_us(&mut self) -> u32 {
        // SAFETY: esp_timer_get_time is always safe to call after boot.
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as u32 }
    }
}
