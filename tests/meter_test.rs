//! Integration tests for the keystroke path and counter persistence

use proptest::prelude::*;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use wpm_meter::core::{create_shared_counter, read_record, Autosaver, CounterError};
use wpm_meter::{Key, KeystrokeEvent, Meter, RateEstimator};

fn at(start: Instant, secs: u64) -> Instant {
    start + Duration::from_secs(secs)
}

#[test]
fn test_end_to_end_typing_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("WpmMeter").join("keystrokes.bin");

    // empty record on first run
    let counter = create_shared_counter();
    assert_eq!(counter.load(&path).unwrap(), 0);

    let mut meter = Meter::new(counter.clone());
    let start = Instant::now();

    let mut reading = None;
    for t in 0..=11 {
        reading = meter.handle_event(&KeystrokeEvent::at(Key::Other(0x41), at(start, t)));
    }
    let reading = reading.unwrap();
    assert!((reading.wpm - 13.0909).abs() < 1e-3);
    assert_eq!(reading.rounded_wpm, 13);
    assert_eq!(reading.total_keystrokes, 12);

    let reading = meter
        .handle_event(&KeystrokeEvent::at(Key::Other(0x41), at(start, 13)))
        .unwrap();
    assert!((reading.wpm - 12.0).abs() < 1e-9);
    assert_eq!(reading.rounded_wpm, 12);
    assert!(reading.changed);
    assert_eq!(reading.total_text, "13");

    counter.persist(&path).unwrap();
    assert_eq!(read_record(&path).unwrap(), 13);
}

#[test]
fn test_count_survives_restart_without_double_counting() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keystrokes.bin");
    let start = Instant::now();

    // first run
    {
        let counter = create_shared_counter();
        counter.load(&path).unwrap();
        let mut autosaver = Autosaver::start(counter.clone(), path.clone(), Duration::from_secs(3600));
        let mut meter = Meter::new(counter.clone());
        for t in 0..5 {
            meter.record_keystroke(at(start, t));
        }
        autosaver.stop().unwrap();
    }

    // second run picks up where the first left off
    let counter = create_shared_counter();
    assert_eq!(counter.load(&path).unwrap(), 5);
    let mut autosaver = Autosaver::start(counter.clone(), path.clone(), Duration::from_secs(3600));
    let mut meter = Meter::new(counter.clone());
    let reading = meter.record_keystroke(at(start, 100));
    assert_eq!(reading.total_keystrokes, 6);
    // the window starts fresh after a restart
    assert_eq!(reading.rounded_wpm, 0);
    autosaver.stop().unwrap();

    assert_eq!(read_record(&path).unwrap(), 6);
}

#[test]
fn test_corrupt_record_is_not_silently_zeroed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keystrokes.bin");
    std::fs::write(&path, [0xFFu8; 4]).unwrap();

    let counter = create_shared_counter();
    match counter.load(&path) {
        Err(CounterError::Corrupt { len, .. }) => assert_eq!(len, 4),
        other => panic!("expected corrupt record error, got {other:?}"),
    }
}

#[test]
fn test_filtered_keys_never_reach_the_count() {
    let counter = create_shared_counter();
    let mut meter = Meter::new(counter.clone());
    let start = Instant::now();

    let keys = [
        Key::Other(0x48),
        Key::LeftShift,
        Key::Other(0x49),
        Key::Backspace,
        Key::CapsLock,
        Key::LeftMeta,
        Key::Other(0x20),
    ];
    for (i, key) in keys.into_iter().enumerate() {
        meter.handle_event(&KeystrokeEvent::at(key, at(start, i as u64)));
    }

    assert_eq!(counter.snapshot(), 3);
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
#[test]
fn test_injected_events_flow_through_collector() {
    use wpm_meter::{Collector, CollectorConfig};

    let mut collector = Collector::new(CollectorConfig::default());
    collector.start().unwrap();
    let injector = collector.injector();
    let start = Instant::now();

    injector
        .send(KeystrokeEvent::at(Key::Other(0x41), start))
        .unwrap();
    injector
        .send(KeystrokeEvent::at(Key::RightShift, at(start, 1)))
        .unwrap();
    injector
        .send(KeystrokeEvent::at(Key::Other(0x42), at(start, 1)))
        .unwrap();

    let counter = create_shared_counter();
    let mut meter = Meter::new(counter.clone());
    let mut last = None;
    while let Some(event) = collector.try_recv() {
        if let Some(reading) = meter.handle_event(&event) {
            last = Some(reading);
        }
    }
    collector.stop();

    let last = last.unwrap();
    assert_eq!(last.rounded_wpm, 24);
    assert_eq!(counter.snapshot(), 2);
}

proptest! {
    #[test]
    fn prop_window_never_holds_stale_entries(gaps_ms in prop::collection::vec(0u64..5_000, 1..200)) {
        let mut estimator = RateEstimator::new();
        let window = estimator.window();
        let mut now = Instant::now();

        for gap in gaps_ms {
            now += Duration::from_millis(gap);
            let sample = estimator.ingest(now);

            let oldest = estimator.oldest().unwrap();
            prop_assert!(now.duration_since(oldest) <= window);
            prop_assert_eq!(sample.window_len, estimator.len());
            prop_assert!(sample.wpm >= 0.0 && sample.wpm.is_finite());
            if sample.window_len < 2 {
                prop_assert_eq!(sample.wpm, 0.0);
            }
        }
    }
}
