//! Main loop tests

mod common;

use common::{burst_rig, AdcCall, BurstClock, RecordingDac, RecordingStatus, ScriptedAdc};
use rust_mw_beacon::broadcast::{BroadcastController, BroadcastState};
use rust_mw_beacon::config::{BroadcastConfig, MW_CARRIERS};
use rust_mw_beacon::fault::FaultState;
use rust_mw_beacon::logging::LogStream;
use rust_mw_beacon::sampler::SamplerState;
use rust_mw_beacon::station::Station;

type TestStation<'a> = Station<'a, ScriptedAdc, RecordingDac, BurstClock, RecordingStatus, 6>;

/// Same timings as the controller tests: position 2 matches 558 kHz and
/// the repeat count comes out at 12.
const SCRIPT: [u32; 5] = [1500, 1828, 2000, 2500, 3656];

fn config() -> BroadcastConfig {
    BroadcastConfig::new().with_periods(1000, 2000)
}

fn station<'a>(
    adc: ScriptedAdc,
    config: BroadcastConfig,
    carriers: &'a [f32],
    log: &'a LogStream,
    fault: &'a FaultState,
) -> TestStation<'a> {
    let (dac, clock) = burst_rig(&SCRIPT);
    let controller = BroadcastController::new(dac, clock, config, carriers, log, fault).unwrap();
    Station::new(adc, controller, RecordingStatus::default())
}

#[test]
fn test_reaches_broadcasting() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut s = station(ScriptedAdc::instant(&[1000]), config(), &MW_CARRIERS, &log, &fault);

    assert_eq!(s.status().shown, vec![BroadcastState::Measuring]);
    assert_eq!(s.run_until(BroadcastState::Broadcasting, 100), Some(5));
    assert_eq!(
        s.status().shown,
        vec![BroadcastState::Measuring, BroadcastState::Testing, BroadcastState::Broadcasting]
    );

    // Staying on air does not repaint the LED.
    for _ in 0..5 {
        s.tick();
    }
    assert_eq!(s.status().shown.len(), 3);
}

#[test]
fn test_sampler_steps_once_per_tick() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut s = station(ScriptedAdc::instant(&[1000]), config(), &MW_CARRIERS, &log, &fault);

    let expected = [
        SamplerState::Started,
        SamplerState::Waiting,
        SamplerState::Done,
        SamplerState::Idle,
        SamplerState::Started,
    ];
    for (n, state) in expected.into_iter().enumerate() {
        s.tick();
        assert_eq!(s.sampler().state(), state);
        assert_eq!(s.adc().calls.len(), n + 1);
    }
}

#[test]
fn test_sample_latched_before_controller_runs() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut s = station(ScriptedAdc::instant(&[1000]), config(), &MW_CARRIERS, &log, &fault);

    for _ in 0..4 {
        s.tick();
    }

    // The fourth tick latches 1000 first, then times position 4 with it.
    let writes = &s.controller().dac().writes;
    assert!(writes[..6000].iter().all(|&w| w == 0));
    assert!(writes[6000..8000].chunks(2).all(|p| p == [1000, 0]));
}

#[test]
fn test_broadcast_uses_last_latched_value() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut s = station(ScriptedAdc::instant(&[1000, 2000]), config(), &MW_CARRIERS, &log, &fault);

    s.run_until(BroadcastState::Broadcasting, 100);
    let before = s.controller().dac().writes.len();
    s.tick();

    let sent = &s.controller().dac().writes[before..];
    assert_eq!(sent.len(), 24);
    assert_ne!(s.sampler().value(), 0);
    assert!(sent.chunks(2).all(|p| p == [s.sampler().value(), 0]));
}

#[test]
fn test_sampler_uses_configured_channel() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut cfg = config();
    cfg.adc_channel = 3;
    let mut s = station(ScriptedAdc::instant(&[1]), cfg, &MW_CARRIERS, &log, &fault);

    s.tick();
    assert_eq!(s.sampler().channel(), 3);
    assert_eq!(s.adc().calls[0], AdcCall::Start(3));
}

#[test]
fn test_stuck_adc_does_not_stop_carrier() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let mut s = station(ScriptedAdc::stuck_busy(), config(), &MW_CARRIERS, &log, &fault);

    assert_eq!(s.run_until(BroadcastState::Broadcasting, 100), Some(5));
    let before = s.controller().dac().writes.len();
    for _ in 0..10 {
        s.tick();
    }
    assert_eq!(s.controller().dac().writes.len(), before + 10 * 24);
    assert_eq!(s.sampler().state(), SamplerState::Started);
    assert_eq!(s.sampler().value(), 0);
}

#[test]
fn test_halt_shown_and_held() {
    let log = LogStream::new();
    let fault = FaultState::new();
    let carriers = [11_026.0, 558_000.0];
    let mut s = station(ScriptedAdc::instant(&[1000]), config(), &carriers, &log, &fault);

    assert_eq!(s.run_until(BroadcastState::Broadcasting, 50), None);
    assert_eq!(s.controller().state(), BroadcastState::Halted);
    assert_eq!(s.status().shown, vec![BroadcastState::Measuring, BroadcastState::Halted]);
    assert!(fault.is_active());
}
