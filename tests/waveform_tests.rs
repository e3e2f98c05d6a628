//! Waveform emitter tests

mod common;

use common::{CountingDelay, RecordingDac};
use rust_mw_beacon::delay::{DelayLine, InstructionBuffer};
use rust_mw_beacon::waveform::{WaveformEmitter, WaveformMode};

#[test]
fn test_square_period() {
    let emitter = WaveformEmitter::new(WaveformMode::Square);
    let mut dac = RecordingDac::new();
    let line = CountingDelay::new(80);

    emitter.transmit(&mut dac, &line, 40_000);

    assert_eq!(dac.writes, vec![40_000, 0]);
    assert_eq!(line.invocations.get(), 2);
}

#[test]
fn test_sine_period() {
    let emitter = WaveformEmitter::new(WaveformMode::Sine);
    let mut dac = RecordingDac::new();
    let line = CountingDelay::new(80);

    emitter.transmit(&mut dac, &line, 40_000);

    assert_eq!(dac.writes, vec![0, 20_000, 40_000, 20_000]);
    assert_eq!(line.invocations.get(), 4);
}

#[test]
fn test_one_delay_per_write() {
    for mode in [WaveformMode::Square, WaveformMode::Sine] {
        let emitter = WaveformEmitter::new(mode);
        let mut dac = RecordingDac::new();
        let line = CountingDelay::new(80);

        for _ in 0..25 {
            emitter.transmit(&mut dac, &line, 1234);
        }

        assert_eq!(dac.writes.len(), 25 * mode.writes_per_period());
        assert_eq!(line.invocations.get(), dac.writes.len());
    }
}

#[test]
fn test_zero_sample_is_flat() {
    let emitter = WaveformEmitter::new(WaveformMode::Sine);
    let mut dac = RecordingDac::new();
    let line = CountingDelay::new(80);

    emitter.transmit(&mut dac, &line, 0);

    assert!(dac.writes.iter().all(|&w| w == 0));
}

#[test]
fn test_emitter_uses_current_return_position() {
    let emitter = WaveformEmitter::new(WaveformMode::Square);
    let mut dac = RecordingDac::new();
    let mut line: InstructionBuffer<32> = InstructionBuffer::new();
    line.set_return_position(20);

    emitter.transmit(&mut dac, &line, 0xFFFF);

    assert_eq!(dac.writes, vec![0xFFFF, 0]);
    assert_eq!(line.return_position(), 20);
}

#[test]
fn test_default_mode_is_square() {
    assert_eq!(WaveformMode::default(), WaveformMode::Square);
}
